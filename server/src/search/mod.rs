//! Search-expression compiler.
//!
//! Turns a client-submitted filter tree over book or series attributes into a
//! backend-agnostic [`Predicate`] plus the set of [`RequiredJoin`]s that must
//! be in scope to evaluate it, and folds in the caller's security scope.
//!
//! # Pre-conditions
//! - Filter trees from untrusted sources are checked with [`FilterLimits`]
//!   before compilation.
//!
//! # Post-conditions
//! - Compilation is pure: the same tree, context and instant always produce
//!   an equal [`CompiledFilter`].
//!
//! # Invariants
//! - Multi-valued attributes never add a join; they compile to sub-queries.
//! - An empty library scope compiles to `False`, never to an empty `IN`.

pub mod compile;
pub mod condition;
pub mod join;
pub mod limits;
pub mod operator;
pub mod predicate;
pub mod schema;

pub use compile::{CompileError, CompiledFilter, FilterCompiler, SearchCondition};
pub use condition::{AuthorMatch, BookCondition, ConditionTree, PosterMatch, SeriesCondition};
pub use join::{Entity, JoinOn, JoinPlan, JoinSet, RequiredJoin};
pub use limits::{FilterLimitError, FilterLimits};
pub use operator::{BooleanOp, DateOp, Equality, Numeric, NumericNullable, StringOp};
pub use predicate::{Column, Comparison, Literal, Predicate, SubQuery, TextMatch};
pub use schema::Table;
