//! Required joins: the extra relations a compiled predicate depends on.
//!
//! A `RequiredJoin` is a marker, not a join clause. Compilers return the set of
//! markers their predicate references; the query assembler turns each distinct
//! marker into exactly one concrete join through [`RequiredJoin::plan`].
//!
//! # Invariants
//!
//! - Equality is by (variant, parameters): `ReadList(a)` and `ReadList(b)` are
//!   different set members and produce different aliases.
//! - Multi-valued relations (tags, genres, authors, labels) never appear here;
//!   they are filtered through sub-queries so the root row is never duplicated.

use std::collections::BTreeSet;

use serde::Serialize;

use super::predicate::{Column, Literal};
use super::schema::{
    Table, book, book_metadata, book_metadata_aggregation, collection_series, media,
    read_list_book, read_progress, read_progress_series, series, series_metadata,
};
use crate::types::{CollectionId, ReadListId, UserId};

/// The root entity a filter selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Entity {
    Book,
    Series,
}

impl Entity {
    #[must_use]
    pub const fn root_table(self) -> Table {
        match self {
            Self::Book => Table::Book,
            Self::Series => Table::Series,
        }
    }

    #[must_use]
    pub const fn id_column(self) -> Column {
        match self {
            Self::Book => book::ID,
            Self::Series => series::ID,
        }
    }

    #[must_use]
    pub const fn library_column(self) -> Column {
        match self {
            Self::Book => book::LIBRARY_ID,
            Self::Series => series::LIBRARY_ID,
        }
    }

    /// The column holding the series id of a root row.
    #[must_use]
    pub const fn series_column(self) -> Column {
        match self {
            Self::Book => book::SERIES_ID,
            Self::Series => series::ID,
        }
    }
}

/// A relation that must be brought into scope for a predicate or a sort.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "join", content = "id", rename_all = "camelCase")]
pub enum RequiredJoin {
    BookMetadata,
    Media,
    SeriesMetadata,
    BookMetadataAggregation,
    /// Read progress of one user.
    ReadProgress(UserId),
    /// Membership in one read list, aliased by its id.
    ReadList(ReadListId),
    /// Membership in one collection, aliased by its id.
    Collection(CollectionId),
}

/// A set of join markers. Ordered so compiled output is reproducible.
pub type JoinSet = BTreeSet<RequiredJoin>;

/// One condition of a join's `ON` clause.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOn {
    /// `parent = child`
    Columns { parent: Column, child: Column },
    /// `child = value`
    Value { child: Column, value: Literal },
}

/// A concrete join: which table instance to bring in and how to match it.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinPlan {
    pub table: Table,
    pub on: Vec<JoinOn>,
}

impl RequiredJoin {
    /// Resolve this marker into a concrete join for a root entity.
    ///
    /// Returns `None` when the relation has no meaning for the root
    /// (book metadata or media of a series).
    #[must_use]
    pub fn plan(&self, root: Entity) -> Option<JoinPlan> {
        let by_series = |child: Column| JoinOn::Columns {
            parent: root.series_column(),
            child,
        };

        let plan = match (self, root) {
            (Self::BookMetadata, Entity::Book) => JoinPlan {
                table: Table::BookMetadata,
                on: vec![JoinOn::Columns {
                    parent: book::ID,
                    child: book_metadata::BOOK_ID,
                }],
            },
            (Self::Media, Entity::Book) => JoinPlan {
                table: Table::Media,
                on: vec![JoinOn::Columns {
                    parent: book::ID,
                    child: media::BOOK_ID,
                }],
            },
            (Self::BookMetadata | Self::Media, Entity::Series) => return None,
            (Self::SeriesMetadata, _) => JoinPlan {
                table: Table::SeriesMetadata,
                on: vec![by_series(series_metadata::SERIES_ID)],
            },
            (Self::BookMetadataAggregation, _) => JoinPlan {
                table: Table::BookMetadataAggregation,
                on: vec![by_series(book_metadata_aggregation::SERIES_ID)],
            },
            (Self::ReadProgress(user_id), Entity::Book) => JoinPlan {
                table: Table::ReadProgress,
                on: vec![
                    JoinOn::Columns {
                        parent: book::ID,
                        child: read_progress::BOOK_ID,
                    },
                    JoinOn::Value {
                        child: read_progress::USER_ID,
                        value: user_id.clone().into(),
                    },
                ],
            },
            (Self::ReadProgress(user_id), Entity::Series) => JoinPlan {
                table: Table::ReadProgressSeries,
                on: vec![
                    JoinOn::Columns {
                        parent: series::ID,
                        child: read_progress_series::SERIES_ID,
                    },
                    JoinOn::Value {
                        child: read_progress_series::USER_ID,
                        value: user_id.clone().into(),
                    },
                ],
            },
            (Self::ReadList(id), _) => JoinPlan {
                table: Table::ReadListBookFor(id.clone()),
                on: vec![
                    JoinOn::Columns {
                        parent: root.id_column(),
                        child: read_list_book::book_id_for(id),
                    },
                    JoinOn::Value {
                        child: read_list_book::read_list_id_for(id),
                        value: id.clone().into(),
                    },
                ],
            },
            (Self::Collection(id), _) => JoinPlan {
                table: Table::CollectionSeriesFor(id.clone()),
                on: vec![
                    by_series(collection_series::series_id_for(id)),
                    JoinOn::Value {
                        child: collection_series::collection_id_for(id),
                        value: id.clone().into(),
                    },
                ],
            },
        };
        Some(plan)
    }
}
