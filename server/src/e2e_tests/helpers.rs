//! Common helpers for end-to-end tests.

use crate::auth::SecurityContext;
use crate::backend::MemoryStore;
use crate::search::{CompileError, CompiledFilter, FilterCompiler, Literal, SearchCondition, Table};
use crate::time::FixedTimeSource;
use crate::types::UserId;

/// Library every catalogue row lands in unless stated otherwise.
pub const LIBRARY: &str = "lib-1";

/// A catalogue loaded into the in-memory backend.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    pub store: MemoryStore,
}

impl Catalogue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw row.
    #[must_use]
    pub fn row<I>(mut self, table: &Table, values: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Literal)>,
    {
        self.store = self.store.with_row(table, values);
        self
    }

    /// A book of `series_id` in [`LIBRARY`].
    #[must_use]
    pub fn book(self, id: &str, series_id: &str) -> Self {
        self.book_in(id, series_id, LIBRARY)
    }

    #[must_use]
    pub fn book_in(self, id: &str, series_id: &str, library: &str) -> Self {
        self.row(
            &Table::Book,
            [
                ("ID", Literal::from(id)),
                ("LIBRARY_ID", Literal::from(library)),
                ("SERIES_ID", Literal::from(series_id)),
                ("ONESHOT", Literal::from(false)),
            ],
        )
    }

    /// Metadata row of a book. `BOOK_ID` is filled in.
    #[must_use]
    pub fn book_metadata<I>(self, book_id: &str, values: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Literal)>,
    {
        let row = std::iter::once(("BOOK_ID", Literal::from(book_id))).chain(values);
        self.row(&Table::BookMetadata, row)
    }

    #[must_use]
    pub fn book_tags(self, book_id: &str, tags: &[&str]) -> Self {
        tags.iter().fold(self, |catalogue, tag| {
            catalogue.row(
                &Table::BookMetadataTag,
                [
                    ("BOOK_ID", Literal::from(book_id)),
                    ("TAG", Literal::from(*tag)),
                ],
            )
        })
    }

    /// A series in [`LIBRARY`] with its metadata row. `SERIES_ID` is filled in.
    #[must_use]
    pub fn series<I>(self, id: &str, book_count: i64, metadata: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Literal)>,
    {
        let metadata = std::iter::once(("SERIES_ID", Literal::from(id))).chain(metadata);
        let series = [
            ("ID", Literal::from(id)),
            ("LIBRARY_ID", Literal::from(LIBRARY)),
            ("BOOK_COUNT", Literal::from(book_count)),
            ("ONESHOT", Literal::from(false)),
        ];
        self.row(&Table::Series, series)
            .row(&Table::SeriesMetadata, metadata)
    }

    /// A one-to-many row keyed by series, e.g. a tag or a sharing label.
    #[must_use]
    pub fn series_values(
        self,
        table: &Table,
        column: &'static str,
        series_id: &str,
        values: &[&str],
    ) -> Self {
        values.iter().fold(self, |catalogue, value| {
            catalogue.row(
                table,
                [
                    ("SERIES_ID", Literal::from(series_id)),
                    (column, Literal::from(*value)),
                ],
            )
        })
    }

    /// Ids matching `condition` under `context`.
    #[must_use]
    pub fn search<C: SearchCondition>(
        &self,
        context: &SecurityContext,
        condition: &C,
    ) -> Vec<String> {
        let filter = compile(context, Some(condition));
        self.store.select_ids(C::ENTITY, &filter)
    }

    /// Ids visible under `context` without any user filter.
    #[must_use]
    pub fn visible<C: SearchCondition>(&self, context: &SecurityContext) -> Vec<String> {
        let filter = compile::<C>(context, None);
        self.store.select_ids(C::ENTITY, &filter)
    }
}

/// The clock every scenario is compiled against.
#[must_use]
pub fn clock() -> FixedTimeSource {
    FixedTimeSource::default_start()
}

/// Compile a search for `context`, failing the test on error.
#[must_use]
#[allow(clippy::expect_used)]
pub fn compile<C: SearchCondition>(
    context: &SecurityContext,
    condition: Option<&C>,
) -> CompiledFilter {
    try_compile(context, condition).expect("filter should compile")
}

pub fn try_compile<C: SearchCondition>(
    context: &SecurityContext,
    condition: Option<&C>,
) -> Result<CompiledFilter, CompileError> {
    let clock = clock();
    FilterCompiler::new(&clock).compile_search(context, condition)
}

/// An unrestricted reader with a user id.
#[must_use]
pub fn reader() -> SecurityContext {
    SecurityContext::for_user(UserId::new("reader"))
}

/// Owned ids, for comparing against search results.
#[must_use]
pub fn ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| (*id).to_owned()).collect()
}
