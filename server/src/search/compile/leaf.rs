//! Operator mapping: one operator applied to one column.
//!
//! Every function here is pure and total over its operator family.

use chrono::{DateTime, TimeDelta, Utc};

use crate::search::operator::{BooleanOp, DateOp, Equality, Numeric, NumericNullable, StringOp};
use crate::search::predicate::{Column, Comparison, Literal, Predicate, SubQuery, TextMatch};

/// Exact equality.
pub fn equality<T>(op: &Equality<T>, column: Column) -> Predicate
where
    T: Clone + Into<Literal>,
{
    match op {
        Equality::Is(value) => Predicate::eq(column, value.clone()),
        Equality::IsNot(value) => Predicate::ne(column, value.clone()),
    }
}

/// Equality on text, optionally ignoring case.
pub fn text_equality(op: &Equality<String>, column: Column, ignore_case: bool) -> Predicate {
    if !ignore_case {
        return equality(op, column);
    }
    match op {
        Equality::Is(value) => Predicate::text(column, TextMatch::Equals, value.as_str(), false),
        Equality::IsNot(value) => Predicate::text(column, TextMatch::Equals, value.as_str(), true),
    }
}

/// Pattern match. Always case-insensitive.
pub fn string(op: &StringOp, column: Column) -> Predicate {
    let (mode, value, negated) = match op {
        StringOp::Contains(value) => (TextMatch::Contains, value, false),
        StringOp::DoesNotContain(value) => (TextMatch::Contains, value, true),
        StringOp::BeginsWith(value) => (TextMatch::StartsWith, value, false),
        StringOp::DoesNotBeginWith(value) => (TextMatch::StartsWith, value, true),
        StringOp::EndsWith(value) => (TextMatch::EndsWith, value, false),
        StringOp::DoesNotEndWith(value) => (TextMatch::EndsWith, value, true),
        StringOp::Is(value) => (TextMatch::Equals, value, false),
        StringOp::IsNot(value) => (TextMatch::Equals, value, true),
    };
    Predicate::text(column, mode, value.as_str(), negated)
}

pub fn numeric<T>(op: &Numeric<T>, column: Column) -> Predicate
where
    T: Copy + Into<Literal>,
{
    match *op {
        Numeric::Is(value) => Predicate::eq(column, value),
        Numeric::IsNot(value) => Predicate::ne(column, value),
        Numeric::GreaterThan(value) => Predicate::compare(column, Comparison::Gt, value),
        Numeric::LessThan(value) => Predicate::compare(column, Comparison::Lt, value),
    }
}

/// Like [`numeric`], except that `IsNot` also matches a missing value.
pub fn numeric_nullable<T>(op: &NumericNullable<T>, column: Column) -> Predicate
where
    T: Copy + Into<Literal>,
{
    match *op {
        NumericNullable::Is(value) => Predicate::eq(column, value),
        NumericNullable::IsNot(value) => {
            Predicate::ne(column.clone(), value).or(Predicate::IsNull(column))
        }
        NumericNullable::GreaterThan(value) => Predicate::compare(column, Comparison::Gt, value),
        NumericNullable::LessThan(value) => Predicate::compare(column, Comparison::Lt, value),
        NumericNullable::IsNull => Predicate::IsNull(column),
        NumericNullable::IsNotNull => Predicate::IsNotNull(column),
    }
}

/// Date comparison. Relative windows are measured back from `now`.
pub fn date(op: &DateOp, column: Column, now: DateTime<Utc>) -> Predicate {
    match *op {
        DateOp::After(instant) => Predicate::compare(column, Comparison::Gt, instant),
        DateOp::Before(instant) => Predicate::compare(column, Comparison::Lt, instant),
        DateOp::IsInTheLast(period) => {
            Predicate::compare(column, Comparison::Gt, window_start(now, period))
        }
        DateOp::IsNotInTheLast(period) => {
            Predicate::compare(column, Comparison::Lt, window_start(now, period))
        }
        DateOp::IsNull => Predicate::IsNull(column),
        DateOp::IsNotNull => Predicate::IsNotNull(column),
    }
}

/// `now - period`, saturating at the earliest representable instant.
fn window_start(now: DateTime<Utc>, period: std::time::Duration) -> DateTime<Utc> {
    let period = TimeDelta::from_std(period).unwrap_or(TimeDelta::MAX);
    now.checked_sub_signed(period)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub const fn boolean(op: BooleanOp, column: Column) -> Predicate {
    match op {
        BooleanOp::IsTrue => Predicate::IsTrue(column),
        BooleanOp::IsFalse => Predicate::IsFalse(column),
    }
}

/// Boolean over a nullable column: true when a value is present.
pub const fn presence(op: BooleanOp, column: Column) -> Predicate {
    match op {
        BooleanOp::IsTrue => Predicate::IsNotNull(column),
        BooleanOp::IsFalse => Predicate::IsNull(column),
    }
}

/// Membership of the root row in a one-to-many child table, matched on one
/// text value ignoring case.
///
/// `parent IN (SELECT select FROM child WHERE LOWER(value) = LOWER(?))`, or
/// `NOT IN` for `IsNot`.
pub fn multi_valued(
    op: &Equality<String>,
    parent: Column,
    select: Column,
    value_column: Column,
) -> Predicate {
    let (value, negated) = match op {
        Equality::Is(value) => (value, false),
        Equality::IsNot(value) => (value, true),
    };
    let filter = Predicate::text(value_column, TextMatch::Equals, value.as_str(), false);
    Predicate::InSubquery {
        column: parent,
        subquery: SubQuery::new(select, filter),
        negated,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::search::schema::{book, book_metadata, book_metadata_tag, series_metadata};
    use crate::time::{FixedTimeSource, TimeSource};

    #[test]
    fn test_string_operators_are_case_insensitive_text_matches() {
        let op = StringOp::DoesNotBeginWith("The".to_owned());
        assert_eq!(
            string(&op, book_metadata::TITLE),
            Predicate::text(book_metadata::TITLE, TextMatch::StartsWith, "The", true)
        );
        assert_eq!(
            string(&StringOp::Is("Dune".to_owned()), book_metadata::TITLE),
            Predicate::text(book_metadata::TITLE, TextMatch::Equals, "Dune", false)
        );
    }

    #[test]
    fn test_text_equality_respects_ignore_case() {
        let op = Equality::IsNot("en".to_owned());
        assert_eq!(
            text_equality(&op, series_metadata::LANGUAGE, false),
            Predicate::ne(series_metadata::LANGUAGE, "en")
        );
        assert_eq!(
            text_equality(&op, series_metadata::LANGUAGE, true),
            Predicate::text(series_metadata::LANGUAGE, TextMatch::Equals, "en", true)
        );
    }

    #[test]
    fn test_nullable_is_not_matches_null() {
        assert_eq!(
            numeric_nullable(&NumericNullable::IsNot(16), series_metadata::AGE_RATING),
            Predicate::Or(vec![
                Predicate::ne(series_metadata::AGE_RATING, 16),
                Predicate::IsNull(series_metadata::AGE_RATING),
            ])
        );
        assert_eq!(
            numeric_nullable(&NumericNullable::Is(16), series_metadata::AGE_RATING),
            Predicate::eq(series_metadata::AGE_RATING, 16)
        );
    }

    #[test]
    fn test_relative_date_windows() {
        let now = FixedTimeSource::default_start().now();
        let week = Duration::from_secs(7 * 24 * 3600);
        let start = now - TimeDelta::days(7);
        let column = book_metadata::RELEASE_DATE;
        assert_eq!(
            date(&DateOp::IsInTheLast(week), column.clone(), now),
            Predicate::compare(book_metadata::RELEASE_DATE, Comparison::Gt, start)
        );
        assert_eq!(
            date(&DateOp::IsNotInTheLast(week), column, now),
            Predicate::compare(book_metadata::RELEASE_DATE, Comparison::Lt, start)
        );
    }

    #[test]
    fn test_huge_window_saturates() {
        let now = FixedTimeSource::default_start().now();
        let predicate = date(
            &DateOp::IsInTheLast(Duration::MAX),
            book_metadata::RELEASE_DATE,
            now,
        );
        assert_eq!(
            predicate,
            Predicate::compare(
                book_metadata::RELEASE_DATE,
                Comparison::Gt,
                DateTime::<Utc>::MIN_UTC
            )
        );
    }

    #[test]
    fn test_presence_maps_to_null_checks() {
        assert_eq!(
            presence(BooleanOp::IsTrue, book::DELETED_DATE),
            Predicate::IsNotNull(book::DELETED_DATE)
        );
        assert_eq!(
            presence(BooleanOp::IsFalse, book::DELETED_DATE),
            Predicate::IsNull(book::DELETED_DATE)
        );
    }

    #[test]
    fn test_multi_valued_negation_is_not_in() {
        let predicate = multi_valued(
            &Equality::IsNot("horror".to_owned()),
            book::ID,
            book_metadata_tag::BOOK_ID,
            book_metadata_tag::TAG,
        );
        assert_eq!(
            predicate,
            Predicate::not_in_subquery(
                book::ID,
                SubQuery::new(
                    book_metadata_tag::BOOK_ID,
                    Predicate::text(book_metadata_tag::TAG, TextMatch::Equals, "horror", false)
                )
            )
        );
    }
}
