//! Test series leaves backed by series metadata, aggregations and collections.

use crate::e2e_tests::helpers::{Catalogue, ids, reader};
use crate::search::{
    AuthorMatch, BooleanOp, Equality, Literal, NumericNullable, SeriesCondition, Table,
};
use crate::types::CollectionId;

/// Series:
/// - s1: 3 of 3 books, rated 12, "en", published by "Viz", tagged "action",
///   books tagged "drama", genre "manga", in collection c1
/// - s2: 2 of 5 books, unrated, "fr", books tagged "action"
/// - s3: 1 book of unknown total, rated 16, "EN", in collection c1
fn catalogue() -> Catalogue {
    let member = |series: &str| {
        [
            ("COLLECTION_ID", Literal::from("c1")),
            ("SERIES_ID", Literal::from(series)),
        ]
    };
    let aggregated = Table::BookMetadataAggregationTag;
    Catalogue::new()
        .series(
            "s1",
            3,
            [
                ("TOTAL_BOOK_COUNT", Literal::from(3)),
                ("AGE_RATING", Literal::from(12)),
                ("LANGUAGE", Literal::from("en")),
                ("PUBLISHER", Literal::from("Viz")),
            ],
        )
        .series(
            "s2",
            2,
            [
                ("TOTAL_BOOK_COUNT", Literal::from(5)),
                ("LANGUAGE", Literal::from("fr")),
            ],
        )
        .series(
            "s3",
            1,
            [
                ("AGE_RATING", Literal::from(16)),
                ("LANGUAGE", Literal::from("EN")),
            ],
        )
        .series_values(&Table::SeriesMetadataTag, "TAG", "s1", &["action"])
        .series_values(&aggregated, "TAG", "s1", &["drama"])
        .series_values(&aggregated, "TAG", "s2", &["action"])
        .series_values(&Table::SeriesMetadataGenre, "GENRE", "s1", &["manga"])
        .row(&Table::CollectionSeries, member("s1"))
        .row(&Table::CollectionSeries, member("s3"))
        .row(
            &Table::BookMetadataAggregationAuthor,
            [
                ("SERIES_ID", Literal::from("s2")),
                ("NAME", Literal::from("Ursula")),
                ("ROLE", Literal::from("writer")),
            ],
        )
}

fn search(condition: &SeriesCondition) -> Vec<String> {
    catalogue().search(&reader(), condition)
}

#[test]
fn test_complete() {
    assert_eq!(
        search(&SeriesCondition::Complete(BooleanOp::IsTrue)),
        ids(&["s1"])
    );
    assert_eq!(
        search(&SeriesCondition::Complete(BooleanOp::IsFalse)),
        ids(&["s2", "s3"])
    );
}

#[test]
fn test_language_ignores_case() {
    let is = SeriesCondition::Language(Equality::Is("EN".to_owned()));
    assert_eq!(search(&is), ids(&["s1", "s3"]));
    let is_not = SeriesCondition::Language(Equality::IsNot("en".to_owned()));
    assert_eq!(search(&is_not), ids(&["s2"]));
}

#[test]
fn test_publisher() {
    let condition = SeriesCondition::Publisher(Equality::Is("viz".to_owned()));
    assert_eq!(search(&condition), ids(&["s1"]));
}

#[test]
fn test_tag_matches_series_or_book_tags() {
    let tag = |value: &str| SeriesCondition::Tag(Equality::Is(value.to_owned()));
    assert_eq!(search(&tag("action")), ids(&["s1", "s2"]));
    assert_eq!(search(&tag("drama")), ids(&["s1"]));
    assert_eq!(
        search(&SeriesCondition::Tag(Equality::IsNot("action".to_owned()))),
        ids(&["s3"])
    );
}

#[test]
fn test_genre() {
    let condition = SeriesCondition::Genre(Equality::Is("Manga".to_owned()));
    assert_eq!(search(&condition), ids(&["s1"]));
}

#[test]
fn test_nullable_age_rating() {
    assert_eq!(
        search(&SeriesCondition::AgeRating(NumericNullable::IsNot(12))),
        ids(&["s2", "s3"])
    );
    let older = SeriesCondition::AgeRating(NumericNullable::GreaterThan(10));
    assert_eq!(search(&older), ids(&["s1", "s3"]));
    assert_eq!(
        search(&SeriesCondition::AgeRating(NumericNullable::IsNull)),
        ids(&["s2"])
    );
}

#[test]
fn test_collection_membership() {
    let id = CollectionId::new("c1");
    assert_eq!(
        search(&SeriesCondition::CollectionId(Equality::Is(id.clone()))),
        ids(&["s1", "s3"])
    );
    assert_eq!(
        search(&SeriesCondition::CollectionId(Equality::IsNot(id))),
        ids(&["s2"])
    );
}

#[test]
fn test_author_from_book_aggregation() {
    let by = |author| SeriesCondition::Author(Equality::Is(author));
    assert_eq!(search(&by(AuthorMatch::name("ursula"))), ids(&["s2"]));
    assert_eq!(
        search(&by(AuthorMatch::new("Ursula", "penciller"))),
        Vec::<String>::new()
    );
    assert_eq!(
        search(&by(AuthorMatch::default())),
        ids(&["s1", "s2", "s3"])
    );
}
