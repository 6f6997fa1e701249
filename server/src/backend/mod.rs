//! Consumers of compiled filters.
//!
//! - `sql`: renders a compiled filter into a parameterised statement.
//! - `memory`: evaluates a compiled filter against in-memory rows.
//!
//! Both resolve joins through `RequiredJoin::plan`, so they agree on which
//! table instance every column reference points at.

pub mod memory;
pub mod sql;

pub use memory::{MemoryStore, Row};
pub use sql::{SqlFragment, render_predicate, render_predicate_with_offset, render_select};
