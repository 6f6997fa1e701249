//! Physical catalogue schema: tables, aliases and the columns filters touch.
//!
//! Column constants are grouped per table. Aliased membership tables
//! (`READLIST_BOOK` joined for one specific read list, `COLLECTION_SERIES`
//! joined for one specific collection) are not constants; they are built
//! from the id they are parameterised by.

use super::predicate::Column;
use crate::types::{CollectionId, ReadListId};

/// A catalogue table, or an aliased instance of one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Book,
    BookMetadata,
    BookMetadataTag,
    BookMetadataAuthor,
    Media,
    ThumbnailBook,
    ReadProgress,
    ReadProgressSeries,
    ReadListBook,
    Series,
    SeriesMetadata,
    SeriesMetadataTag,
    SeriesMetadataGenre,
    SeriesMetadataSharing,
    BookMetadataAggregation,
    BookMetadataAggregationAuthor,
    BookMetadataAggregationTag,
    CollectionSeries,
    /// `READLIST_BOOK` joined for one read list.
    ReadListBookFor(ReadListId),
    /// `COLLECTION_SERIES` joined for one collection.
    CollectionSeriesFor(CollectionId),
}

impl Table {
    /// The table name in the database.
    #[must_use]
    pub const fn sql_name(&self) -> &'static str {
        match self {
            Self::Book => "BOOK",
            Self::BookMetadata => "BOOK_METADATA",
            Self::BookMetadataTag => "BOOK_METADATA_TAG",
            Self::BookMetadataAuthor => "BOOK_METADATA_AUTHOR",
            Self::Media => "MEDIA",
            Self::ThumbnailBook => "THUMBNAIL_BOOK",
            Self::ReadProgress => "READ_PROGRESS",
            Self::ReadProgressSeries => "READ_PROGRESS_SERIES",
            Self::ReadListBook | Self::ReadListBookFor(_) => "READLIST_BOOK",
            Self::Series => "SERIES",
            Self::SeriesMetadata => "SERIES_METADATA",
            Self::SeriesMetadataTag => "SERIES_METADATA_TAG",
            Self::SeriesMetadataGenre => "SERIES_METADATA_GENRE",
            Self::SeriesMetadataSharing => "SERIES_METADATA_SHARING",
            Self::BookMetadataAggregation => "BOOK_METADATA_AGGREGATION",
            Self::BookMetadataAggregationAuthor => "BOOK_METADATA_AGGREGATION_AUTHOR",
            Self::BookMetadataAggregationTag => "BOOK_METADATA_AGGREGATION_TAG",
            Self::CollectionSeries | Self::CollectionSeriesFor(_) => "COLLECTION_SERIES",
        }
    }

    /// The alias this table is referenced by in a statement.
    ///
    /// Parameterised aliases hex-encode the id so that arbitrary ids can never
    /// leak into SQL text and two distinct ids never share an alias.
    #[must_use]
    pub fn alias(&self) -> String {
        match self {
            Self::Book => "b".to_owned(),
            Self::BookMetadata => "d".to_owned(),
            Self::BookMetadataTag => "bmt".to_owned(),
            Self::BookMetadataAuthor => "bmau".to_owned(),
            Self::Media => "m".to_owned(),
            Self::ThumbnailBook => "tb".to_owned(),
            Self::ReadProgress => "r".to_owned(),
            Self::ReadProgressSeries => "rs".to_owned(),
            Self::ReadListBook => "rlb".to_owned(),
            Self::Series => "s".to_owned(),
            Self::SeriesMetadata => "sd".to_owned(),
            Self::SeriesMetadataTag => "smt".to_owned(),
            Self::SeriesMetadataGenre => "smg".to_owned(),
            Self::SeriesMetadataSharing => "sms".to_owned(),
            Self::BookMetadataAggregation => "bma".to_owned(),
            Self::BookMetadataAggregationAuthor => "bmaa".to_owned(),
            Self::BookMetadataAggregationTag => "bmat".to_owned(),
            Self::CollectionSeries => "cs".to_owned(),
            Self::ReadListBookFor(id) => hex_alias("rlb", id.as_str()),
            Self::CollectionSeriesFor(id) => hex_alias("cs", id.as_str()),
        }
    }

    /// The table actually holding the rows (aliases resolve to their base table).
    #[must_use]
    pub fn physical(&self) -> Self {
        match self {
            Self::ReadListBookFor(_) => Self::ReadListBook,
            Self::CollectionSeriesFor(_) => Self::CollectionSeries,
            table => table.clone(),
        }
    }
}

/// Longest identifier PostgreSQL keeps without truncating.
const MAX_IDENTIFIER_LEN: usize = 63;
/// Id bytes kept readable in an alias that had to be shortened.
const SHORTENED_ID_BYTES: usize = 12;

/// `<prefix>_<hex id>`, or `<prefix>_<hex id prefix>_<hash>` when the full
/// form would exceed [`MAX_IDENTIFIER_LEN`].
fn hex_alias(prefix: &str, id: &str) -> String {
    let id = id.as_bytes();
    if prefix.len() + 1 + 2 * id.len() <= MAX_IDENTIFIER_LEN {
        return format!("{prefix}_{}", hex(id));
    }
    format!(
        "{prefix}_{}_{:016x}",
        hex(&id[..SHORTENED_ID_BYTES]),
        fnv1a(id)
    )
}

fn hex(bytes: &[u8]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(char::from(DIGITS[usize::from(b >> 4)]));
        out.push(char::from(DIGITS[usize::from(b & 0x0f)]));
    }
    out
}

/// 64-bit FNV-1a; stable across builds and platforms.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(PRIME))
}

pub mod book {
    use super::{Column, Table};

    pub const ID: Column = Column::new(Table::Book, "ID");
    pub const LIBRARY_ID: Column = Column::new(Table::Book, "LIBRARY_ID");
    pub const SERIES_ID: Column = Column::new(Table::Book, "SERIES_ID");
    pub const DELETED_DATE: Column = Column::new(Table::Book, "DELETED_DATE");
    pub const ONESHOT: Column = Column::new(Table::Book, "ONESHOT");
}

pub mod book_metadata {
    use super::{Column, Table};

    pub const BOOK_ID: Column = Column::new(Table::BookMetadata, "BOOK_ID");
    pub const TITLE: Column = Column::new(Table::BookMetadata, "TITLE");
    pub const RELEASE_DATE: Column = Column::new(Table::BookMetadata, "RELEASE_DATE");
    pub const NUMBER_SORT: Column = Column::new(Table::BookMetadata, "NUMBER_SORT");
}

pub mod book_metadata_tag {
    use super::{Column, Table};

    pub const BOOK_ID: Column = Column::new(Table::BookMetadataTag, "BOOK_ID");
    pub const TAG: Column = Column::new(Table::BookMetadataTag, "TAG");
}

pub mod book_metadata_author {
    use super::{Column, Table};

    pub const BOOK_ID: Column = Column::new(Table::BookMetadataAuthor, "BOOK_ID");
    pub const NAME: Column = Column::new(Table::BookMetadataAuthor, "NAME");
    pub const ROLE: Column = Column::new(Table::BookMetadataAuthor, "ROLE");
}

pub mod media {
    use super::{Column, Table};

    pub const BOOK_ID: Column = Column::new(Table::Media, "BOOK_ID");
    pub const STATUS: Column = Column::new(Table::Media, "STATUS");
    pub const MEDIA_TYPE: Column = Column::new(Table::Media, "MEDIA_TYPE");
}

pub mod thumbnail_book {
    use super::{Column, Table};

    pub const BOOK_ID: Column = Column::new(Table::ThumbnailBook, "BOOK_ID");
    pub const TYPE: Column = Column::new(Table::ThumbnailBook, "TYPE");
    pub const SELECTED: Column = Column::new(Table::ThumbnailBook, "SELECTED");
}

pub mod read_progress {
    use super::{Column, Table};

    pub const BOOK_ID: Column = Column::new(Table::ReadProgress, "BOOK_ID");
    pub const USER_ID: Column = Column::new(Table::ReadProgress, "USER_ID");
    pub const COMPLETED: Column = Column::new(Table::ReadProgress, "COMPLETED");
}

pub mod read_progress_series {
    use super::{Column, Table};

    pub const SERIES_ID: Column = Column::new(Table::ReadProgressSeries, "SERIES_ID");
    pub const USER_ID: Column = Column::new(Table::ReadProgressSeries, "USER_ID");
    pub const READ_COUNT: Column = Column::new(Table::ReadProgressSeries, "READ_COUNT");
}

pub mod read_list_book {
    use super::{Column, ReadListId, Table};

    pub const BOOK_ID: Column = Column::new(Table::ReadListBook, "BOOK_ID");
    pub const READLIST_ID: Column = Column::new(Table::ReadListBook, "READLIST_ID");

    /// `BOOK_ID` of the membership table joined for `id`.
    #[must_use]
    pub fn book_id_for(id: &ReadListId) -> Column {
        Column::new(Table::ReadListBookFor(id.clone()), "BOOK_ID")
    }

    /// `READLIST_ID` of the membership table joined for `id`.
    #[must_use]
    pub fn read_list_id_for(id: &ReadListId) -> Column {
        Column::new(Table::ReadListBookFor(id.clone()), "READLIST_ID")
    }
}

pub mod series {
    use super::{Column, Table};

    pub const ID: Column = Column::new(Table::Series, "ID");
    pub const LIBRARY_ID: Column = Column::new(Table::Series, "LIBRARY_ID");
    pub const DELETED_DATE: Column = Column::new(Table::Series, "DELETED_DATE");
    pub const ONESHOT: Column = Column::new(Table::Series, "ONESHOT");
    pub const BOOK_COUNT: Column = Column::new(Table::Series, "BOOK_COUNT");
}

pub mod series_metadata {
    use super::{Column, Table};

    pub const SERIES_ID: Column = Column::new(Table::SeriesMetadata, "SERIES_ID");
    pub const TITLE: Column = Column::new(Table::SeriesMetadata, "TITLE");
    pub const TITLE_SORT: Column = Column::new(Table::SeriesMetadata, "TITLE_SORT");
    pub const STATUS: Column = Column::new(Table::SeriesMetadata, "STATUS");
    pub const AGE_RATING: Column = Column::new(Table::SeriesMetadata, "AGE_RATING");
    pub const LANGUAGE: Column = Column::new(Table::SeriesMetadata, "LANGUAGE");
    pub const PUBLISHER: Column = Column::new(Table::SeriesMetadata, "PUBLISHER");
    pub const TOTAL_BOOK_COUNT: Column = Column::new(Table::SeriesMetadata, "TOTAL_BOOK_COUNT");
}

pub mod series_metadata_tag {
    use super::{Column, Table};

    pub const SERIES_ID: Column = Column::new(Table::SeriesMetadataTag, "SERIES_ID");
    pub const TAG: Column = Column::new(Table::SeriesMetadataTag, "TAG");
}

pub mod series_metadata_genre {
    use super::{Column, Table};

    pub const SERIES_ID: Column = Column::new(Table::SeriesMetadataGenre, "SERIES_ID");
    pub const GENRE: Column = Column::new(Table::SeriesMetadataGenre, "GENRE");
}

pub mod series_metadata_sharing {
    use super::{Column, Table};

    pub const SERIES_ID: Column = Column::new(Table::SeriesMetadataSharing, "SERIES_ID");
    pub const LABEL: Column = Column::new(Table::SeriesMetadataSharing, "LABEL");
}

pub mod book_metadata_aggregation {
    use super::{Column, Table};

    pub const SERIES_ID: Column = Column::new(Table::BookMetadataAggregation, "SERIES_ID");
    pub const RELEASE_DATE: Column = Column::new(Table::BookMetadataAggregation, "RELEASE_DATE");
}

pub mod book_metadata_aggregation_author {
    use super::{Column, Table};

    pub const SERIES_ID: Column = Column::new(Table::BookMetadataAggregationAuthor, "SERIES_ID");
    pub const NAME: Column = Column::new(Table::BookMetadataAggregationAuthor, "NAME");
    pub const ROLE: Column = Column::new(Table::BookMetadataAggregationAuthor, "ROLE");
}

pub mod book_metadata_aggregation_tag {
    use super::{Column, Table};

    pub const SERIES_ID: Column = Column::new(Table::BookMetadataAggregationTag, "SERIES_ID");
    pub const TAG: Column = Column::new(Table::BookMetadataAggregationTag, "TAG");
}

pub mod collection_series {
    use super::{CollectionId, Column, Table};

    pub const SERIES_ID: Column = Column::new(Table::CollectionSeries, "SERIES_ID");
    pub const COLLECTION_ID: Column = Column::new(Table::CollectionSeries, "COLLECTION_ID");

    /// `SERIES_ID` of the membership table joined for `id`.
    #[must_use]
    pub fn series_id_for(id: &CollectionId) -> Column {
        Column::new(Table::CollectionSeriesFor(id.clone()), "SERIES_ID")
    }

    /// `COLLECTION_ID` of the membership table joined for `id`.
    #[must_use]
    pub fn collection_id_for(id: &CollectionId) -> Column {
        Column::new(Table::CollectionSeriesFor(id.clone()), "COLLECTION_ID")
    }
}
