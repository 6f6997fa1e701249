//! Test age-rating and sharing-label restrictions on series and books.

use crate::auth::{AgeRestriction, ContentRestrictions, SecurityContext};
use crate::e2e_tests::helpers::{Catalogue, ids, reader};
use crate::search::{BookCondition, Literal, SeriesCondition, Table};

/// Series, one book each:
/// - A: rated 12, labelled "kids"
/// - B: rated 8, labelled "adult"
/// - C: unrated, unlabelled
fn catalogue() -> Catalogue {
    Catalogue::new()
        .series("A", 1, [("AGE_RATING", Literal::from(12))])
        .series("B", 1, [("AGE_RATING", Literal::from(8))])
        .series("C", 1, [])
        .series_values(&Table::SeriesMetadataSharing, "LABEL", "A", &["kids"])
        .series_values(&Table::SeriesMetadataSharing, "LABEL", "B", &["adult"])
        .book("a1", "A")
        .book("b1", "B")
        .book("c1", "C")
}

fn restricted(restrictions: ContentRestrictions) -> SecurityContext {
    reader().with_restrictions(restrictions)
}

fn age(restriction: AgeRestriction) -> SecurityContext {
    restricted(ContentRestrictions::new(
        Some(restriction),
        Vec::<&str>::new(),
        Vec::<&str>::new(),
    ))
}

#[test]
fn test_allow_only_excludes_unrated_and_older() {
    let context = age(AgeRestriction::allow_only(10));
    let catalogue = catalogue();
    assert_eq!(catalogue.visible::<SeriesCondition>(&context), ids(&["B"]));
    assert_eq!(catalogue.visible::<BookCondition>(&context), ids(&["b1"]));
}

#[test]
fn test_exclude_keeps_unrated() {
    let context = age(AgeRestriction::exclude(10));
    assert_eq!(
        catalogue().visible::<SeriesCondition>(&context),
        ids(&["B", "C"])
    );
}

#[test]
fn test_allowed_label_or_allowed_age() {
    let context = restricted(ContentRestrictions::new(
        Some(AgeRestriction::allow_only(10)),
        [" Kids "],
        Vec::<&str>::new(),
    ));
    assert_eq!(
        catalogue().visible::<SeriesCondition>(&context),
        ids(&["A", "B"])
    );
}

#[test]
fn test_excluded_label_wins_over_allowed() {
    let context = restricted(ContentRestrictions::new(
        Some(AgeRestriction::allow_only(10)),
        ["kids"],
        ["ADULT"],
    ));
    let catalogue = catalogue();
    assert_eq!(catalogue.visible::<SeriesCondition>(&context), ids(&["A"]));
    assert_eq!(catalogue.visible::<BookCondition>(&context), ids(&["a1"]));
}

#[test]
fn test_excluded_label_alone() {
    let restrictions = ContentRestrictions::new(None, Vec::<&str>::new(), ["adult"]);
    let context = restricted(restrictions);
    assert_eq!(
        catalogue().visible::<SeriesCondition>(&context),
        ids(&["A", "C"])
    );
}

#[test]
fn test_restrictions_apply_under_user_filters() {
    let context = age(AgeRestriction::allow_only(10));
    let everything = SeriesCondition::AnyOf(vec![]);
    assert_eq!(catalogue().search(&context, &everything), ids(&["B"]));
}

/// A series carrying both an allowed and an excluded label is hidden.
#[test]
fn test_exclusion_dominates_allowance() {
    let sharing = Table::SeriesMetadataSharing;
    let catalogue = Catalogue::new()
        .series("both", 1, [])
        .series("allowed", 1, [])
        .series_values(&sharing, "LABEL", "both", &["allow", "exclude"])
        .series_values(&sharing, "LABEL", "allowed", &["allow"]);
    let context = restricted(ContentRestrictions::new(None, ["allow"], ["exclude"]));
    assert_eq!(
        catalogue.visible::<SeriesCondition>(&context),
        ids(&["allowed"])
    );
}
