//! Series filter compilation.

use super::{CompileError, CompiledFilter, Scope, SearchCondition, leaf};
use crate::search::condition::{AuthorMatch, SeriesCondition};
use crate::search::join::{Entity, RequiredJoin};
use crate::search::operator::{BooleanOp, Equality};
use crate::search::predicate::{Comparison, Predicate, SubQuery, TextMatch};
use crate::search::schema::{
    book_metadata_aggregation, book_metadata_aggregation_author, book_metadata_aggregation_tag,
    collection_series, read_progress_series, series, series_metadata, series_metadata_genre,
    series_metadata_sharing, series_metadata_tag,
};
use crate::types::{CollectionId, ReadStatus};

impl SearchCondition for SeriesCondition {
    const ENTITY: Entity = Entity::Series;

    fn compile_with(&self, scope: &Scope<'_>) -> Result<CompiledFilter, CompileError> {
        let compiled = match self {
            Self::AllOf(children) => CompiledFilter::all_of(compile_all(children, scope)?),
            Self::AnyOf(children) => CompiledFilter::any_of(compile_all(children, scope)?),
            Self::LibraryId(op) => CompiledFilter::new(leaf::equality(op, series::LIBRARY_ID)),
            Self::CollectionId(op) => collection(op),
            Self::Deleted(op) => CompiledFilter::new(leaf::presence(*op, series::DELETED_DATE)),
            Self::Complete(op) => metadata(complete(*op)),
            Self::OneShot(op) => CompiledFilter::new(leaf::boolean(*op, series::ONESHOT)),
            Self::Title(op) => metadata(leaf::string(op, series_metadata::TITLE)),
            Self::TitleSort(op) => metadata(leaf::string(op, series_metadata::TITLE_SORT)),
            Self::ReleaseDate(op) => CompiledFilter::with_join(
                leaf::date(op, book_metadata_aggregation::RELEASE_DATE, scope.now),
                RequiredJoin::BookMetadataAggregation,
            ),
            Self::ReadStatus(op) => read_status(op, scope)?,
            Self::SeriesStatus(op) => metadata(leaf::equality(op, series_metadata::STATUS)),
            Self::AgeRating(op) => {
                metadata(leaf::numeric_nullable(op, series_metadata::AGE_RATING))
            }
            Self::Language(op) => {
                metadata(leaf::text_equality(op, series_metadata::LANGUAGE, true))
            }
            Self::Publisher(op) => {
                metadata(leaf::text_equality(op, series_metadata::PUBLISHER, true))
            }
            Self::Genre(op) => CompiledFilter::new(leaf::multi_valued(
                op,
                series::ID,
                series_metadata_genre::SERIES_ID,
                series_metadata_genre::GENRE,
            )),
            Self::Tag(op) => CompiledFilter::new(tag(op)),
            Self::SharingLabel(op) => CompiledFilter::new(leaf::multi_valued(
                op,
                series::ID,
                series_metadata_sharing::SERIES_ID,
                series_metadata_sharing::LABEL,
            )),
            Self::Author(op) => CompiledFilter::new(author(op)),
        };
        Ok(compiled)
    }
}

fn compile_all(
    children: &[SeriesCondition],
    scope: &Scope<'_>,
) -> Result<Vec<CompiledFilter>, CompileError> {
    children
        .iter()
        .map(|child| child.compile_with(scope))
        .collect()
}

fn metadata(predicate: Predicate) -> CompiledFilter {
    CompiledFilter::with_join(predicate, RequiredJoin::SeriesMetadata)
}

fn collection(op: &Equality<CollectionId>) -> CompiledFilter {
    match op {
        Equality::Is(id) => CompiledFilter::with_join(
            Predicate::eq(collection_series::collection_id_for(id), id.clone()),
            RequiredJoin::Collection(id.clone()),
        ),
        Equality::IsNot(id) => CompiledFilter::new(Predicate::not_in_subquery(
            series::ID,
            SubQuery::new(
                collection_series::SERIES_ID,
                Predicate::eq(collection_series::COLLECTION_ID, id.clone()),
            ),
        )),
    }
}

/// A series is complete when its expected total is known and reached.
fn complete(op: BooleanOp) -> Predicate {
    let total = series_metadata::TOTAL_BOOK_COUNT;
    let reached = |comparison| Predicate::CompareColumns {
        left: total.clone(),
        op: comparison,
        right: series::BOOK_COUNT,
    };
    match op {
        BooleanOp::IsTrue => Predicate::IsNotNull(total.clone()).and(reached(Comparison::Eq)),
        BooleanOp::IsFalse => Predicate::IsNull(total.clone()).or(reached(Comparison::NotEq)),
    }
}

/// Read count of the acting user compared to the number of books.
fn read_status(
    op: &Equality<ReadStatus>,
    scope: &Scope<'_>,
) -> Result<CompiledFilter, CompileError> {
    let user = scope.user("read status")?;
    let read_count = read_progress_series::READ_COUNT;
    let against_books = |comparison| Predicate::CompareColumns {
        left: read_count.clone(),
        op: comparison,
        right: series::BOOK_COUNT,
    };
    let predicate = match op {
        Equality::Is(ReadStatus::Unread) => Predicate::IsNull(read_count.clone()),
        Equality::Is(ReadStatus::Read) => against_books(Comparison::Eq),
        Equality::Is(ReadStatus::InProgress) => {
            Predicate::IsNotNull(read_count.clone()).and(against_books(Comparison::NotEq))
        }
        Equality::IsNot(ReadStatus::Unread) => Predicate::IsNotNull(read_count.clone()),
        Equality::IsNot(ReadStatus::Read) => {
            Predicate::IsNull(read_count.clone()).or(against_books(Comparison::NotEq))
        }
        Equality::IsNot(ReadStatus::InProgress) => {
            Predicate::IsNull(read_count.clone()).or(against_books(Comparison::Eq))
        }
    };
    tracing::trace!(user = %user, ?op, "compiled series read status");
    let join = RequiredJoin::ReadProgress(user.clone());
    Ok(CompiledFilter::with_join(predicate, join))
}

/// Tags of the series itself or of any of its books.
fn tag(op: &Equality<String>) -> Predicate {
    let own = leaf::multi_valued(
        op,
        series::ID,
        series_metadata_tag::SERIES_ID,
        series_metadata_tag::TAG,
    );
    let from_books = leaf::multi_valued(
        op,
        series::ID,
        book_metadata_aggregation_tag::SERIES_ID,
        book_metadata_aggregation_tag::TAG,
    );
    match op {
        Equality::Is(_) => own.or(from_books),
        Equality::IsNot(_) => own.and(from_books),
    }
}

fn author(op: &Equality<AuthorMatch>) -> Predicate {
    let (criteria, negated) = match op {
        Equality::Is(criteria) => (criteria, false),
        Equality::IsNot(criteria) => (criteria, true),
    };
    if criteria.is_empty() {
        return Predicate::True;
    }
    let mut parts = Vec::new();
    if let Some(name) = criteria.name.as_deref() {
        let column = book_metadata_aggregation_author::NAME;
        parts.push(Predicate::text(column, TextMatch::Equals, name, false));
    }
    if let Some(role) = criteria.role.as_deref() {
        let column = book_metadata_aggregation_author::ROLE;
        parts.push(Predicate::text(column, TextMatch::Equals, role, false));
    }
    let series_id = book_metadata_aggregation_author::SERIES_ID;
    Predicate::InSubquery {
        column: series::ID,
        subquery: SubQuery::new(series_id, Predicate::all(parts)),
        negated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SecurityContext;
    use crate::search::DateOp;
    use crate::search::join::JoinSet;
    use crate::search::operator::NumericNullable;
    use crate::time::{FixedTimeSource, TimeSource};
    use crate::types::UserId;

    fn try_compile(condition: &SeriesCondition) -> Result<CompiledFilter, CompileError> {
        let context = SecurityContext::for_user(UserId::new("reader"));
        let scope = Scope::new(&context, FixedTimeSource::default().now());
        condition.compile_with(&scope)
    }

    fn compile(condition: &SeriesCondition) -> CompiledFilter {
        try_compile(condition).expect("compiles")
    }

    #[test]
    fn test_collection_is_and_is_not() {
        let a = CollectionId::new("a");
        let is = compile(&SeriesCondition::CollectionId(Equality::Is(a.clone())));
        assert_eq!(
            is.required_joins,
            JoinSet::from([RequiredJoin::Collection(a.clone())])
        );
        let is_not = compile(&SeriesCondition::CollectionId(Equality::IsNot(a)));
        assert!(is_not.required_joins.is_empty());
    }

    #[test]
    fn test_complete_and_its_negation() {
        let complete = compile(&SeriesCondition::Complete(BooleanOp::IsTrue));
        let total = series_metadata::TOTAL_BOOK_COUNT;
        let reached = Predicate::CompareColumns {
            left: total.clone(),
            op: Comparison::Eq,
            right: series::BOOK_COUNT,
        };
        let expected = Predicate::And(vec![Predicate::IsNotNull(total), reached]);
        assert_eq!(complete.predicate, expected);
        assert_eq!(
            complete.required_joins,
            JoinSet::from([RequiredJoin::SeriesMetadata])
        );
        let incomplete = compile(&SeriesCondition::Complete(BooleanOp::IsFalse));
        assert!(matches!(incomplete.predicate, Predicate::Or(_)));
    }

    #[test]
    fn test_read_status_measures_read_count_against_books() {
        let read = SeriesCondition::ReadStatus(Equality::Is(ReadStatus::Read));
        let compiled = compile(&read);
        let expected = Predicate::CompareColumns {
            left: read_progress_series::READ_COUNT,
            op: Comparison::Eq,
            right: series::BOOK_COUNT,
        };
        assert_eq!(compiled.predicate, expected);
        assert_eq!(
            compiled.required_joins,
            JoinSet::from([RequiredJoin::ReadProgress(UserId::new("reader"))])
        );
    }

    #[test]
    fn test_read_status_without_user_fails() {
        let context = SecurityContext::unrestricted();
        let scope = Scope::new(&context, FixedTimeSource::default().now());
        let condition = SeriesCondition::ReadStatus(Equality::IsNot(ReadStatus::Unread));
        let result = condition.compile_with(&scope);
        assert!(matches!(result, Err(CompileError::MissingUser { .. })));
    }

    #[test]
    fn test_tag_checks_series_and_book_tags() {
        let fiction = || "fiction".to_owned();
        let is = compile(&SeriesCondition::Tag(Equality::Is(fiction())));
        assert!(matches!(&is.predicate, Predicate::Or(parts) if parts.len() == 2));
        let is_not = compile(&SeriesCondition::Tag(Equality::IsNot(fiction())));
        let Predicate::And(parts) = is_not.predicate else {
            panic!("expected a conjunction");
        };
        assert_eq!(parts.len(), 2);
        for part in &parts {
            assert!(matches!(part, Predicate::InSubquery { negated: true, .. }));
        }
        assert!(is.required_joins.is_empty());
    }

    #[test]
    fn test_age_rating_is_not_includes_unrated() {
        let compiled = compile(&SeriesCondition::AgeRating(NumericNullable::IsNot(12)));
        assert_eq!(
            compiled.predicate,
            Predicate::Or(vec![
                Predicate::ne(series_metadata::AGE_RATING, 12),
                Predicate::IsNull(series_metadata::AGE_RATING),
            ])
        );
    }

    #[test]
    fn test_language_ignores_case() {
        let compiled = compile(&SeriesCondition::Language(Equality::Is("EN".to_owned())));
        let expected = Predicate::text(series_metadata::LANGUAGE, TextMatch::Equals, "EN", false);
        assert_eq!(compiled.predicate, expected);
    }

    #[test]
    fn test_author_and_release_date_use_aggregation() {
        let compiled = compile(&SeriesCondition::AllOf(vec![
            SeriesCondition::Author(Equality::Is(AuthorMatch::name("Herge"))),
            SeriesCondition::ReleaseDate(DateOp::IsNotNull),
        ]));
        assert_eq!(
            compiled.required_joins,
            JoinSet::from([RequiredJoin::BookMetadataAggregation])
        );
    }

    #[test]
    fn test_empty_author_match_is_a_no_op() {
        let any_author = SeriesCondition::Author(Equality::IsNot(AuthorMatch::default()));
        assert_eq!(compile(&any_author), CompiledFilter::always());
    }

    #[test]
    fn test_empty_author_match_absorbs_any_of() {
        let any = SeriesCondition::AnyOf(vec![
            SeriesCondition::Author(Equality::Is(AuthorMatch::default())),
            SeriesCondition::Genre(Equality::Is("horror".to_owned())),
        ]);
        assert_eq!(compile(&any).predicate, Predicate::True);
    }
}
