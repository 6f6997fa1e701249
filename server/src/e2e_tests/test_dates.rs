//! Test date leaves against a pinned clock.

use std::time::Duration;

use chrono::TimeDelta;

use crate::e2e_tests::helpers::{Catalogue, clock, ids, reader};
use crate::search::{BookCondition, DateOp, Literal};
use crate::time::TimeSource;

const DAY: u64 = 24 * 60 * 60;

/// Books released 10 days ago, 100 days ago, and without a release date.
fn catalogue() -> Catalogue {
    let now = clock().now();
    let released = |days| {
        let date = now - TimeDelta::days(days);
        [("RELEASE_DATE", Literal::from(date))]
    };
    Catalogue::new()
        .book("recent", "s1")
        .book("old", "s1")
        .book("undated", "s1")
        .book_metadata("recent", released(10))
        .book_metadata("old", released(100))
        .book_metadata("undated", [])
}

fn search(op: DateOp) -> Vec<String> {
    catalogue().search(&reader(), &BookCondition::ReleaseDate(op))
}

#[test]
fn test_relative_windows_skip_missing_dates() {
    let month = Duration::from_secs(30 * DAY);
    assert_eq!(search(DateOp::IsInTheLast(month)), ids(&["recent"]));
    assert_eq!(search(DateOp::IsNotInTheLast(month)), ids(&["old"]));
}

#[test]
fn test_absolute_bounds() {
    let cutoff = clock().now() - TimeDelta::days(50);
    assert_eq!(search(DateOp::After(cutoff)), ids(&["recent"]));
    assert_eq!(search(DateOp::Before(cutoff)), ids(&["old"]));
}

#[test]
fn test_presence() {
    assert_eq!(search(DateOp::IsNull), ids(&["undated"]));
    assert_eq!(search(DateOp::IsNotNull), ids(&["recent", "old"]));
}

#[test]
fn test_huge_window_saturates() {
    assert_eq!(
        search(DateOp::IsInTheLast(Duration::from_secs(u64::MAX))),
        ids(&["recent", "old"])
    );
}
