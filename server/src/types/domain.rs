//! Domain enumerations referenced by filter leaves.
//!
//! Each enum serializes as `SCREAMING_SNAKE_CASE`, the same spelling that is
//! stored in the catalogue tables, so `as_str` doubles as the column value.

use serde::{Deserialize, Serialize};

use crate::search::Literal;

/// Reading state of a book (or of a whole series) for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReadStatus {
    /// No progress recorded.
    Unread,
    /// Fully read.
    Read,
    /// Progress recorded but not completed.
    InProgress,
}

/// Analysis state of a book file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaStatus {
    Unknown,
    Error,
    Ready,
    Unsupported,
    Outdated,
}

impl MediaStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Error => "ERROR",
            Self::Ready => "READY",
            Self::Unsupported => "UNSUPPORTED",
            Self::Outdated => "OUTDATED",
        }
    }
}

impl From<MediaStatus> for Literal {
    fn from(status: MediaStatus) -> Self {
        Self::Text(status.as_str().to_owned())
    }
}

/// Reading profile of a book, derived from its media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaProfile {
    /// Image based archives (comics, manga).
    Divina,
    Pdf,
    Epub,
}

impl MediaProfile {
    /// The media types stored in the `MEDIA` table that belong to this profile.
    #[must_use]
    pub const fn media_types(self) -> &'static [&'static str] {
        match self {
            Self::Divina => &[
                "application/zip",
                "application/x-rar-compressed",
                "application/x-rar-compressed; version=4",
                "application/x-rar-compressed; version=5",
                "application/x-7z-compressed",
                "application/x-tar",
            ],
            Self::Pdf => &["application/pdf"],
            Self::Epub => &["application/epub+zip"],
        }
    }
}

/// Publication status of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeriesStatus {
    Ended,
    Ongoing,
    Abandoned,
    Hiatus,
}

impl SeriesStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ended => "ENDED",
            Self::Ongoing => "ONGOING",
            Self::Abandoned => "ABANDONED",
            Self::Hiatus => "HIATUS",
        }
    }
}

impl From<SeriesStatus> for Literal {
    fn from(status: SeriesStatus) -> Self {
        Self::Text(status.as_str().to_owned())
    }
}

/// Origin of a book thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PosterType {
    Generated,
    Sidecar,
    UserUploaded,
}

impl PosterType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Generated => "GENERATED",
            Self::Sidecar => "SIDECAR",
            Self::UserUploaded => "USER_UPLOADED",
        }
    }
}

impl From<PosterType> for Literal {
    fn from(kind: PosterType) -> Self {
        Self::Text(kind.as_str().to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_spelling_matches_column_values() {
        for status in [
            MediaStatus::Unknown,
            MediaStatus::Error,
            MediaStatus::Ready,
            MediaStatus::Unsupported,
            MediaStatus::Outdated,
        ] {
            let json = serde_json::to_string(&status).expect("serializable");
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        assert_eq!(
            serde_json::to_string(&PosterType::UserUploaded).expect("serializable"),
            "\"USER_UPLOADED\""
        );
        assert_eq!(
            serde_json::to_string(&ReadStatus::InProgress).expect("serializable"),
            "\"IN_PROGRESS\""
        );
    }

    #[test]
    fn test_media_profiles_are_disjoint() {
        let divina = MediaProfile::Divina.media_types();
        let others = [MediaProfile::Pdf, MediaProfile::Epub];
        for media_type in others.iter().flat_map(|profile| profile.media_types()) {
            assert!(!divina.contains(media_type));
        }
    }
}
