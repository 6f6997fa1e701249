//! Book filter compilation.

use super::{CompileError, CompiledFilter, Scope, SearchCondition, leaf};
use crate::search::condition::{AuthorMatch, BookCondition, PosterMatch};
use crate::search::join::{Entity, RequiredJoin};
use crate::search::operator::Equality;
use crate::search::predicate::{Literal, Predicate, SubQuery, TextMatch};
use crate::search::schema::{
    book, book_metadata, book_metadata_author, book_metadata_tag, media, read_list_book,
    read_progress, thumbnail_book,
};
use crate::types::{MediaProfile, ReadListId, ReadStatus};

impl SearchCondition for BookCondition {
    const ENTITY: Entity = Entity::Book;

    fn compile_with(&self, scope: &Scope<'_>) -> Result<CompiledFilter, CompileError> {
        let compiled = match self {
            Self::AllOf(children) => CompiledFilter::all_of(compile_all(children, scope)?),
            Self::AnyOf(children) => CompiledFilter::any_of(compile_all(children, scope)?),
            Self::LibraryId(op) => CompiledFilter::new(leaf::equality(op, book::LIBRARY_ID)),
            Self::SeriesId(op) => CompiledFilter::new(leaf::equality(op, book::SERIES_ID)),
            Self::ReadListId(op) => read_list(op),
            Self::Title(op) => CompiledFilter::with_join(
                leaf::string(op, book_metadata::TITLE),
                RequiredJoin::BookMetadata,
            ),
            Self::Deleted(op) => CompiledFilter::new(leaf::presence(*op, book::DELETED_DATE)),
            Self::ReleaseDate(op) => CompiledFilter::with_join(
                leaf::date(op, book_metadata::RELEASE_DATE, scope.now),
                RequiredJoin::BookMetadata,
            ),
            Self::NumberSort(op) => CompiledFilter::with_join(
                leaf::numeric(op, book_metadata::NUMBER_SORT),
                RequiredJoin::BookMetadata,
            ),
            Self::Tag(op) => CompiledFilter::new(leaf::multi_valued(
                op,
                book::ID,
                book_metadata_tag::BOOK_ID,
                book_metadata_tag::TAG,
            )),
            Self::ReadStatus(op) => read_status(op, scope)?,
            Self::MediaStatus(op) => {
                CompiledFilter::with_join(leaf::equality(op, media::STATUS), RequiredJoin::Media)
            }
            Self::MediaProfile(op) => {
                CompiledFilter::with_join(media_profile(op), RequiredJoin::Media)
            }
            Self::Author(op) => CompiledFilter::new(author(op)),
            Self::OneShot(op) => CompiledFilter::new(leaf::boolean(*op, book::ONESHOT)),
            Self::Poster(op) => CompiledFilter::new(poster(op)),
        };
        Ok(compiled)
    }
}

fn compile_all(
    children: &[BookCondition],
    scope: &Scope<'_>,
) -> Result<Vec<CompiledFilter>, CompileError> {
    children
        .iter()
        .map(|child| child.compile_with(scope))
        .collect()
}

/// `Is` joins the membership table aliased for this read list so results can
/// be ordered by position in it; `IsNot` only needs a sub-query.
fn read_list(op: &Equality<ReadListId>) -> CompiledFilter {
    match op {
        Equality::Is(id) => CompiledFilter::with_join(
            Predicate::eq(read_list_book::read_list_id_for(id), id.clone()),
            RequiredJoin::ReadList(id.clone()),
        ),
        Equality::IsNot(id) => CompiledFilter::new(Predicate::not_in_subquery(
            book::ID,
            SubQuery::new(
                read_list_book::BOOK_ID,
                Predicate::eq(read_list_book::READLIST_ID, id.clone()),
            ),
        )),
    }
}

/// Read progress of the acting user: no row is unread, a completed row is
/// read, any other row is in progress. `IsNot` is the exact complement.
fn read_status(
    op: &Equality<ReadStatus>,
    scope: &Scope<'_>,
) -> Result<CompiledFilter, CompileError> {
    let user = scope.user("read status")?;
    let completed = read_progress::COMPLETED;
    let predicate = match op {
        Equality::Is(ReadStatus::Unread) => Predicate::IsNull(completed),
        Equality::Is(ReadStatus::Read) => Predicate::IsTrue(completed),
        Equality::Is(ReadStatus::InProgress) => Predicate::IsFalse(completed),
        Equality::IsNot(ReadStatus::Unread) => Predicate::IsNotNull(completed),
        Equality::IsNot(ReadStatus::Read) => {
            Predicate::IsNull(completed.clone()).or(Predicate::IsFalse(completed))
        }
        Equality::IsNot(ReadStatus::InProgress) => {
            Predicate::IsNull(completed.clone()).or(Predicate::IsTrue(completed))
        }
    };
    tracing::trace!(user = %user, ?op, "compiled read status");
    let join = RequiredJoin::ReadProgress(user.clone());
    Ok(CompiledFilter::with_join(predicate, join))
}

fn media_profile(op: &Equality<MediaProfile>) -> Predicate {
    let (profile, negated) = match op {
        Equality::Is(profile) => (profile, false),
        Equality::IsNot(profile) => (profile, true),
    };
    Predicate::InList {
        column: media::MEDIA_TYPE,
        values: profile
            .media_types()
            .iter()
            .map(|media_type| Literal::from(*media_type))
            .collect(),
        negated,
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
        let column = book_metadata_author::NAME;
        parts.push(Predicate::text(column, TextMatch::Equals, name, false));
    }
    if let Some(role) = criteria.role.as_deref() {
        let column = book_metadata_author::ROLE;
        parts.push(Predicate::text(column, TextMatch::Equals, role, false));
    }
    Predicate::InSubquery {
        column: book::ID,
        subquery: SubQuery::new(book_metadata_author::BOOK_ID, Predicate::all(parts)),
        negated,
    }
}

fn poster(op: &Equality<PosterMatch>) -> Predicate {
    let (criteria, negated) = match op {
        Equality::Is(criteria) => (criteria, false),
        Equality::IsNot(criteria) => (criteria, true),
    };
    if criteria.is_empty() {
        return Predicate::True;
    }
    let mut parts = Vec::new();
    if let Some(kind) = criteria.kind {
        parts.push(Predicate::eq(thumbnail_book::TYPE, kind));
    }
    if let Some(selected) = criteria.selected {
        let column = thumbnail_book::SELECTED;
        let selected = if selected {
            Predicate::IsTrue(column)
        } else {
            Predicate::IsFalse(column)
        };
        parts.push(selected);
    }
    Predicate::InSubquery {
        column: book::ID,
        subquery: SubQuery::new(thumbnail_book::BOOK_ID, Predicate::all(parts)),
        negated,
    }
}
