//! The filter AST: one closed family of conditions per entity.
//!
//! A condition is either a combinator (`allOf`/`anyOf`) over conditions of the
//! same family or a leaf tying one attribute to one operator family. Leaves are
//! externally tagged by attribute name:
//!
//! ```json
//! {"allOf": [
//!     {"tag": {"operator": "is", "value": "fiction"}},
//!     {"readStatus": {"operator": "isNot", "value": "READ"}}
//! ]}
//! ```
//!
//! Compilers match these enums without a catch-all arm, so a new leaf cannot
//! be added without every compiler handling it.

use serde::{Deserialize, Serialize};

use super::operator::{BooleanOp, DateOp, Equality, Numeric, NumericNullable, StringOp};
use crate::types::{
    CollectionId, LibraryId, MediaProfile, MediaStatus, PosterType, ReadListId, ReadStatus,
    SeriesId, SeriesStatus,
};

/// Match against the credited authors of a book or series.
///
/// Both criteria are optional. When both are absent the match is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorMatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl AuthorMatch {
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            role: None,
        }
    }

    #[must_use]
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            role: Some(role.into()),
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.role.is_none()
    }
}

/// Match against the thumbnails of a book.
///
/// Both criteria are optional. When both are absent the match is a no-op.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosterMatch {
    #[serde(default, rename = "type")]
    pub kind: Option<PosterType>,
    #[serde(default)]
    pub selected: Option<bool>,
}

impl PosterMatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.kind.is_none() && self.selected.is_none()
    }
}

/// Filter over books.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BookCondition {
    AllOf(Vec<Self>),
    AnyOf(Vec<Self>),
    LibraryId(Equality<LibraryId>),
    SeriesId(Equality<SeriesId>),
    ReadListId(Equality<ReadListId>),
    Title(StringOp),
    Deleted(BooleanOp),
    ReleaseDate(DateOp),
    NumberSort(Numeric<f32>),
    Tag(Equality<String>),
    ReadStatus(Equality<ReadStatus>),
    MediaStatus(Equality<MediaStatus>),
    MediaProfile(Equality<MediaProfile>),
    Author(Equality<AuthorMatch>),
    OneShot(BooleanOp),
    Poster(Equality<PosterMatch>),
}

/// Filter over series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SeriesCondition {
    AllOf(Vec<Self>),
    AnyOf(Vec<Self>),
    LibraryId(Equality<LibraryId>),
    CollectionId(Equality<CollectionId>),
    Deleted(BooleanOp),
    Complete(BooleanOp),
    OneShot(BooleanOp),
    Title(StringOp),
    TitleSort(StringOp),
    ReleaseDate(DateOp),
    ReadStatus(Equality<ReadStatus>),
    SeriesStatus(Equality<SeriesStatus>),
    AgeRating(NumericNullable<i32>),
    Language(Equality<String>),
    Publisher(Equality<String>),
    Genre(Equality<String>),
    Tag(Equality<String>),
    SharingLabel(Equality<String>),
    Author(Equality<AuthorMatch>),
}

/// Tree shape shared by both condition families.
pub trait ConditionTree: Sized {
    /// The children of a combinator, `None` for a leaf.
    fn children(&self) -> Option<&[Self]>;
}

impl ConditionTree for BookCondition {
    fn children(&self) -> Option<&[Self]> {
        match self {
            Self::AllOf(children) | Self::AnyOf(children) => Some(children),
            _ => None,
        }
    }
}

impl ConditionTree for SeriesCondition {
    fn children(&self) -> Option<&[Self]> {
        match self {
            Self::AllOf(children) | Self::AnyOf(children) => Some(children),
            _ => None,
        }
    }
}
