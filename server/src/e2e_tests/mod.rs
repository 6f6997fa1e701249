//! End-to-end tests at the filter level.
//!
//! Each test file covers a specific scenario: a small catalogue is loaded
//! into the in-memory backend, a filter is compiled together with a security
//! context, and the matching ids are checked.

#![cfg(test)]

mod helpers;

mod test_content_restrictions;
mod test_dates;
mod test_determinism;
mod test_explain;
mod test_read_lists;
mod test_read_status;
mod test_scalar_leaves;
mod test_security_scope;
mod test_series_filters;
mod test_tags;
