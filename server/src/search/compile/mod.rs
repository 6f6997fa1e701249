//! Filter compilation.
//!
//! Each condition family compiles itself through [`SearchCondition`]; the
//! [`FilterCompiler`] samples the clock once, drives the walk and merges the
//! result with the security scope of the request.
//!
//! # Invariants
//! - Every compiled node carries the joins its predicate references, and
//!   combinators union their children's joins whether they AND or OR them.
//! - `allOf([])` and `anyOf([])` both compile to `True`.

mod book;
mod leaf;
mod restriction;
mod security;
mod series;

use chrono::{DateTime, Utc};

use super::condition::ConditionTree;
use super::join::{Entity, JoinSet, RequiredJoin};
use super::predicate::Predicate;
use crate::auth::SecurityContext;
use crate::time::TimeSource;
use crate::types::UserId;

/// A compiled predicate together with the joins it depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFilter {
    pub predicate: Predicate,
    pub required_joins: JoinSet,
}

impl CompiledFilter {
    #[must_use]
    pub const fn new(predicate: Predicate) -> Self {
        Self {
            predicate,
            required_joins: JoinSet::new(),
        }
    }

    /// A predicate that needs exactly one join.
    #[must_use]
    pub fn with_join(predicate: Predicate, join: RequiredJoin) -> Self {
        Self {
            predicate,
            required_joins: JoinSet::from([join]),
        }
    }

    /// Matches everything and needs nothing.
    #[must_use]
    pub const fn always() -> Self {
        Self::new(Predicate::True)
    }

    #[must_use]
    pub fn and(mut self, other: Self) -> Self {
        self.required_joins.extend(other.required_joins);
        Self {
            predicate: self.predicate.and(other.predicate),
            required_joins: self.required_joins,
        }
    }

    #[must_use]
    pub fn or(mut self, other: Self) -> Self {
        self.required_joins.extend(other.required_joins);
        Self {
            predicate: self.predicate.or(other.predicate),
            required_joins: self.required_joins,
        }
    }

    /// Conjunction of all filters. An empty input is [`CompiledFilter::always`].
    #[must_use]
    pub fn all_of(filters: impl IntoIterator<Item = Self>) -> Self {
        filters.into_iter().fold(Self::always(), Self::and)
    }

    /// Disjunction of all filters. An empty input is also
    /// [`CompiledFilter::always`], see [`Predicate::any`].
    #[must_use]
    pub fn any_of(filters: impl IntoIterator<Item = Self>) -> Self {
        let mut required_joins = JoinSet::new();
        let predicate = Predicate::any(filters.into_iter().map(|filter| {
            required_joins.extend(filter.required_joins);
            filter.predicate
        }));
        Self {
            predicate,
            required_joins,
        }
    }
}

/// Error returned when a filter cannot be compiled for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// The filter depends on the acting user but the request has none.
    MissingUser { attribute: &'static str },
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingUser { attribute } => {
                write!(f, "{attribute} filter requires an authenticated user")
            }
        }
    }
}

impl std::error::Error for CompileError {}

/// Everything a leaf may read while compiling.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub context: &'a SecurityContext,
    /// The instant relative date operators are measured from.
    pub now: DateTime<Utc>,
}

impl<'a> Scope<'a> {
    #[must_use]
    pub const fn new(context: &'a SecurityContext, now: DateTime<Utc>) -> Self {
        Self { context, now }
    }

    /// The acting user.
    ///
    /// # Errors
    /// Returns `CompileError::MissingUser` when the request is anonymous.
    pub fn user(&self, attribute: &'static str) -> Result<&'a UserId, CompileError> {
        self.context
            .user_id
            .as_ref()
            .ok_or(CompileError::MissingUser { attribute })
    }
}

/// A filter family that compiles against one root entity.
pub trait SearchCondition: ConditionTree {
    const ENTITY: Entity;

    /// Compile this node and everything below it.
    ///
    /// # Errors
    /// Fails when a leaf needs something the scope does not provide.
    fn compile_with(&self, scope: &Scope<'_>) -> Result<CompiledFilter, CompileError>;
}

/// Compiles filter trees and security scopes against an injected clock.
#[derive(Clone, Copy)]
pub struct FilterCompiler<'a> {
    time: &'a dyn TimeSource,
}

impl<'a> FilterCompiler<'a> {
    #[must_use]
    pub const fn new(time: &'a dyn TimeSource) -> Self {
        Self { time }
    }

    /// Compile a user filter on its own.
    ///
    /// # Errors
    /// Returns `CompileError::MissingUser` if the tree contains a read-status
    /// leaf and `context.user_id` is `None`.
    pub fn compile<C: SearchCondition>(
        &self,
        condition: &C,
        context: &SecurityContext,
    ) -> Result<CompiledFilter, CompileError> {
        let scope = Scope::new(context, self.time.now());
        let compiled = condition.compile_with(&scope)?;
        tracing::debug!(
            entity = ?C::ENTITY,
            joins = compiled.required_joins.len(),
            "compiled filter"
        );
        Ok(compiled)
    }

    /// Compile the security scope of a request: library scoping AND content
    /// restrictions.
    #[must_use]
    pub fn compile_security(entity: Entity, context: &SecurityContext) -> CompiledFilter {
        security::compile(entity, context)
    }

    /// Compile the full search predicate of a request: security scope AND the
    /// user filter, if any.
    ///
    /// # Errors
    /// See [`FilterCompiler::compile`].
    pub fn compile_search<C: SearchCondition>(
        &self,
        context: &SecurityContext,
        condition: Option<&C>,
    ) -> Result<CompiledFilter, CompileError> {
        let base = Self::compile_security(C::ENTITY, context);
        match condition {
            Some(condition) => Ok(base.and(self.compile(condition, context)?)),
            None => Ok(base),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::schema::{book, book_metadata};
    use crate::search::{BookCondition, Equality, SeriesCondition, StringOp, TextMatch};
    use crate::time::FixedTimeSource;
    use crate::types::{LibraryId, ReadListId};

    fn title(value: &str) -> BookCondition {
        BookCondition::Title(StringOp::Contains(value.to_owned()))
    }

    #[test]
    fn test_empty_combinators_are_true_for_books() {
        let clock = FixedTimeSource::default();
        let compiler = FilterCompiler::new(&clock);
        let context = SecurityContext::unrestricted();
        for condition in [BookCondition::AllOf(vec![]), BookCondition::AnyOf(vec![])] {
            let compiled = compiler.compile(&condition, &context).expect("compiles");
            assert_eq!(compiled, CompiledFilter::always());
        }
    }

    #[test]
    fn test_empty_combinators_are_true_for_series() {
        let clock = FixedTimeSource::default();
        let compiler = FilterCompiler::new(&clock);
        let context = SecurityContext::unrestricted();
        for condition in [
            SeriesCondition::AllOf(vec![]),
            SeriesCondition::AnyOf(vec![]),
        ] {
            let compiled = compiler.compile(&condition, &context).expect("compiles");
            assert_eq!(compiled, CompiledFilter::always());
        }
    }

    #[test]
    fn test_any_of_unions_joins_even_when_folded() {
        let a = CompiledFilter::with_join(Predicate::True, RequiredJoin::BookMetadata);
        let b = CompiledFilter::with_join(
            Predicate::IsNull(book::ID),
            RequiredJoin::ReadList(ReadListId::new("x")),
        );
        let compiled = CompiledFilter::any_of([a, b]);
        assert_eq!(compiled.predicate, Predicate::True);
        assert_eq!(compiled.required_joins.len(), 2);
    }

    #[test]
    fn test_all_of_unions_joins() {
        let a = CompiledFilter::with_join(Predicate::IsNull(book::ID), RequiredJoin::Media);
        let b = CompiledFilter::with_join(Predicate::False, RequiredJoin::BookMetadata);
        let compiled = CompiledFilter::all_of([a, b]);
        assert_eq!(compiled.predicate, Predicate::False);
        assert_eq!(
            compiled.required_joins,
            JoinSet::from([RequiredJoin::Media, RequiredJoin::BookMetadata])
        );
    }

    #[test]
    fn test_compile_search_ands_security_scope() {
        let clock = FixedTimeSource::default();
        let compiler = FilterCompiler::new(&clock);
        let context = SecurityContext::unrestricted().with_libraries([LibraryId::new("lib")]);
        let compiled = compiler
            .compile_search(&context, Some(&title("moon")))
            .expect("compiles");
        let scope = Predicate::InList {
            column: book::LIBRARY_ID,
            values: vec!["lib".into()],
            negated: false,
        };
        let moon = Predicate::text(book_metadata::TITLE, TextMatch::Contains, "moon", false);
        assert_eq!(compiled.predicate, Predicate::And(vec![scope, moon]));
        assert_eq!(
            compiled.required_joins,
            JoinSet::from([RequiredJoin::BookMetadata])
        );
    }

    #[test]
    fn test_compile_search_without_filter_is_security_only() {
        let clock = FixedTimeSource::default();
        let compiler = FilterCompiler::new(&clock);
        let context = SecurityContext::unrestricted().with_libraries(Vec::new());
        let compiled = compiler
            .compile_search::<BookCondition>(&context, None)
            .expect("compiles");
        assert_eq!(compiled.predicate, Predicate::False);
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let clock = FixedTimeSource::default();
        let compiler = FilterCompiler::new(&clock);
        let context = SecurityContext::unrestricted();
        let condition = BookCondition::AnyOf(vec![
            BookCondition::ReadListId(Equality::Is(ReadListId::new("a"))),
            title("x"),
        ]);
        assert_eq!(
            compiler.compile(&condition, &context),
            compiler.compile(&condition, &context)
        );
    }

    #[test]
    fn test_missing_user_error_display() {
        let error = CompileError::MissingUser {
            attribute: "read status",
        };
        assert_eq!(
            error.to_string(),
            "read status filter requires an authenticated user"
        );
    }
}
