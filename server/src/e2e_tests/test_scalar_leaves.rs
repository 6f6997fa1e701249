//! Test scalar leaves: numbers, statuses, flags and text patterns.

use crate::e2e_tests::helpers::{Catalogue, LIBRARY, clock, ids, reader};
use crate::search::{
    BookCondition, BooleanOp, Equality, Literal, Numeric, SeriesCondition, StringOp, Table,
};
use crate::time::TimeSource;
use crate::types::{MediaStatus, SeriesId, SeriesStatus};

/// Books:
/// - 1: "The Moon Over Tokyo", number 1, media ready
/// - 2: "Sea of Stars", number 2, media in error
/// - 3: "Moonlight", number 3.5, a one-shot of series s2 without media
/// - 4: series s2, neither metadata nor media
fn books() -> Catalogue {
    let metadata = |title: &str, number: f32| {
        [
            ("TITLE", Literal::from(title)),
            ("NUMBER_SORT", Literal::from(number)),
        ]
    };
    let media = |book: &str, status: MediaStatus| {
        [
            ("BOOK_ID", Literal::from(book)),
            ("STATUS", Literal::from(status)),
        ]
    };
    let one_shot = [
        ("ID", Literal::from("3")),
        ("LIBRARY_ID", Literal::from(LIBRARY)),
        ("SERIES_ID", Literal::from("s2")),
        ("ONESHOT", Literal::from(true)),
    ];
    Catalogue::new()
        .book("1", "s1")
        .book("2", "s1")
        .row(&Table::Book, one_shot)
        .book("4", "s2")
        .book_metadata("1", metadata("The Moon Over Tokyo", 1.0))
        .book_metadata("2", metadata("Sea of Stars", 2.0))
        .book_metadata("3", metadata("Moonlight", 3.5))
        .row(&Table::Media, media("1", MediaStatus::Ready))
        .row(&Table::Media, media("2", MediaStatus::Error))
}

/// Series:
/// - A: ended, sorted as "Akira", labelled "kids"
/// - B: ongoing, sorted as "Berserk", labelled "adult"
/// - C: a deleted one-shot without status, sort title or label
fn series() -> Catalogue {
    let metadata = |status: SeriesStatus, title_sort: &str| {
        [
            ("STATUS", Literal::from(status)),
            ("TITLE_SORT", Literal::from(title_sort)),
        ]
    };
    let deleted_one_shot = [
        ("ID", Literal::from("C")),
        ("LIBRARY_ID", Literal::from(LIBRARY)),
        ("BOOK_COUNT", Literal::from(1)),
        ("ONESHOT", Literal::from(true)),
        ("DELETED_DATE", Literal::from(clock().now())),
    ];
    let sharing = Table::SeriesMetadataSharing;
    Catalogue::new()
        .series("A", 2, metadata(SeriesStatus::Ended, "Akira"))
        .series("B", 3, metadata(SeriesStatus::Ongoing, "Berserk"))
        .row(&Table::Series, deleted_one_shot)
        .row(&Table::SeriesMetadata, [("SERIES_ID", Literal::from("C"))])
        .series_values(&sharing, "LABEL", "A", &["kids"])
        .series_values(&sharing, "LABEL", "B", &["adult"])
}

fn search_books(condition: BookCondition) -> Vec<String> {
    books().search(&reader(), &condition)
}

fn search_series(condition: SeriesCondition) -> Vec<String> {
    series().search(&reader(), &condition)
}

#[test]
fn test_number_sort() {
    let number = |op| search_books(BookCondition::NumberSort(op));
    assert_eq!(number(Numeric::GreaterThan(1.5)), ids(&["2", "3"]));
    assert_eq!(number(Numeric::LessThan(2.0)), ids(&["1"]));
    assert_eq!(number(Numeric::Is(2.0)), ids(&["2"]));
    // Book 4 has no metadata row, so every comparison is false for it.
    assert_eq!(number(Numeric::IsNot(2.0)), ids(&["1", "3"]));
}

#[test]
fn test_media_status() {
    let status = |op| search_books(BookCondition::MediaStatus(op));
    assert_eq!(status(Equality::Is(MediaStatus::Ready)), ids(&["1"]));
    // Books without a media row match neither side.
    assert_eq!(status(Equality::IsNot(MediaStatus::Ready)), ids(&["2"]));
}

#[test]
fn test_book_one_shot() {
    let one_shot = |op| search_books(BookCondition::OneShot(op));
    assert_eq!(one_shot(BooleanOp::IsTrue), ids(&["3"]));
    assert_eq!(one_shot(BooleanOp::IsFalse), ids(&["1", "2", "4"]));
}

#[test]
fn test_series_id() {
    let in_series = |op| search_books(BookCondition::SeriesId(op));
    let s2 = SeriesId::new("s2");
    assert_eq!(in_series(Equality::Is(s2.clone())), ids(&["3", "4"]));
    assert_eq!(in_series(Equality::IsNot(s2)), ids(&["1", "2"]));
}

#[test]
fn test_book_title_patterns() {
    let title = |op| search_books(BookCondition::Title(op));
    let text = |value: &str| value.to_owned();
    assert_eq!(title(StringOp::Contains(text("MOON"))), ids(&["1", "3"]));
    assert_eq!(title(StringOp::DoesNotContain(text("moon"))), ids(&["2"]));
    assert_eq!(title(StringOp::BeginsWith(text("the "))), ids(&["1"]));
    assert_eq!(title(StringOp::EndsWith(text("stars"))), ids(&["2"]));
    assert_eq!(title(StringOp::Is(text("moonlight"))), ids(&["3"]));
    // Book 4 has no title: a negated match is false for it too.
    assert_eq!(title(StringOp::IsNot(text("moonlight"))), ids(&["1", "2"]));
    let not_tokyo = StringOp::DoesNotEndWith(text("TOKYO"));
    assert_eq!(title(not_tokyo), ids(&["2", "3"]));
}

#[test]
fn test_series_status() {
    let status = |op| search_series(SeriesCondition::SeriesStatus(op));
    assert_eq!(status(Equality::Is(SeriesStatus::Ended)), ids(&["A"]));
    // C has no status, so it is excluded both ways.
    assert_eq!(status(Equality::IsNot(SeriesStatus::Ended)), ids(&["B"]));
}

#[test]
fn test_sharing_label() {
    let label = |op| search_series(SeriesCondition::SharingLabel(op));
    assert_eq!(label(Equality::Is("KIDS".to_owned())), ids(&["A"]));
    // A series without labels is outside the excluded set.
    assert_eq!(label(Equality::IsNot("kids".to_owned())), ids(&["B", "C"]));
}

#[test]
fn test_title_sort() {
    let title_sort = |op| search_series(SeriesCondition::TitleSort(op));
    let starts_ber = StringOp::BeginsWith("ber".to_owned());
    assert_eq!(title_sort(starts_ber), ids(&["B"]));
    let not_akira = StringOp::DoesNotEndWith("KIRA".to_owned());
    assert_eq!(title_sort(not_akira), ids(&["B"]));
}

#[test]
fn test_series_deleted_and_one_shot() {
    let deleted = |op| search_series(SeriesCondition::Deleted(op));
    let one_shot = |op| search_series(SeriesCondition::OneShot(op));
    assert_eq!(deleted(BooleanOp::IsTrue), ids(&["C"]));
    assert_eq!(deleted(BooleanOp::IsFalse), ids(&["A", "B"]));
    assert_eq!(one_shot(BooleanOp::IsTrue), ids(&["C"]));
    assert_eq!(one_shot(BooleanOp::IsFalse), ids(&["A", "B"]));
}
