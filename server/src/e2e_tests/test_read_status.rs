//! Test read-status filters, which depend on the acting user.

use crate::auth::SecurityContext;
use crate::e2e_tests::helpers::{Catalogue, ids, reader, try_compile};
use crate::search::{BookCondition, CompileError, Equality, Literal, SeriesCondition, Table};
use crate::types::{ReadStatus, UserId};

/// Books of one series:
/// - 1: completed by "reader"
/// - 2: started by "reader"
/// - 3: completed by "other" only
fn books() -> Catalogue {
    let progress = |book: &str, user: &str, completed: bool| {
        [
            ("BOOK_ID", Literal::from(book)),
            ("USER_ID", Literal::from(user)),
            ("COMPLETED", Literal::from(completed)),
        ]
    };
    Catalogue::new()
        .book("1", "s1")
        .book("2", "s1")
        .book("3", "s1")
        .row(&Table::ReadProgress, progress("1", "reader", true))
        .row(&Table::ReadProgress, progress("2", "reader", false))
        .row(&Table::ReadProgress, progress("3", "other", true))
}

/// Series for "reader":
/// - s1: 1 of 3 books read
/// - s2: 2 of 2 books read
/// - s3: nothing read
fn series() -> Catalogue {
    let progress = |series: &str, read: i64| {
        [
            ("SERIES_ID", Literal::from(series)),
            ("USER_ID", Literal::from("reader")),
            ("READ_COUNT", Literal::from(read)),
        ]
    };
    Catalogue::new()
        .series("s1", 3, [])
        .series("s2", 2, [])
        .series("s3", 4, [])
        .row(&Table::ReadProgressSeries, progress("s1", 1))
        .row(&Table::ReadProgressSeries, progress("s2", 2))
}

fn book_status(op: Equality<ReadStatus>) -> BookCondition {
    BookCondition::ReadStatus(op)
}

fn series_status(op: Equality<ReadStatus>) -> SeriesCondition {
    SeriesCondition::ReadStatus(op)
}

#[test]
fn test_book_read_status_is() {
    let catalogue = books();
    let context = reader();
    let search = |status| catalogue.search(&context, &book_status(Equality::Is(status)));
    assert_eq!(search(ReadStatus::Read), ids(&["1"]));
    assert_eq!(search(ReadStatus::InProgress), ids(&["2"]));
    assert_eq!(search(ReadStatus::Unread), ids(&["3"]));
}

#[test]
fn test_book_read_status_is_not_is_the_complement() {
    let catalogue = books();
    let context = reader();
    let search = |status| catalogue.search(&context, &book_status(Equality::IsNot(status)));
    assert_eq!(search(ReadStatus::Read), ids(&["2", "3"]));
    assert_eq!(search(ReadStatus::InProgress), ids(&["1", "3"]));
    assert_eq!(search(ReadStatus::Unread), ids(&["1", "2"]));
}

#[test]
fn test_progress_is_per_user() {
    let context = SecurityContext::for_user(UserId::new("other"));
    let catalogue = books();
    assert_eq!(
        catalogue.search(&context, &book_status(Equality::Is(ReadStatus::Read))),
        ids(&["3"])
    );
    assert_eq!(
        catalogue.search(&context, &book_status(Equality::Is(ReadStatus::Unread))),
        ids(&["1", "2"])
    );
}

#[test]
fn test_series_read_status() {
    let catalogue = series();
    let context = reader();
    let is = |status| catalogue.search(&context, &series_status(Equality::Is(status)));
    assert_eq!(is(ReadStatus::Read), ids(&["s2"]));
    assert_eq!(is(ReadStatus::InProgress), ids(&["s1"]));
    assert_eq!(is(ReadStatus::Unread), ids(&["s3"]));
    assert_eq!(
        catalogue.search(&context, &series_status(Equality::IsNot(ReadStatus::Read))),
        ids(&["s1", "s3"])
    );
}

#[test]
fn test_read_status_requires_a_user() {
    let nested = BookCondition::AnyOf(vec![
        BookCondition::AllOf(vec![]),
        book_status(Equality::Is(ReadStatus::Read)),
    ]);
    let expected = CompileError::MissingUser {
        attribute: "read status",
    };
    assert_eq!(
        try_compile(&SecurityContext::unrestricted(), Some(&nested)),
        Err(expected)
    );
}
