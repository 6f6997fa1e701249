//! Test tag filters and their combinators over books.

use crate::e2e_tests::helpers::{Catalogue, ids, reader};
use crate::search::{AuthorMatch, BookCondition, Equality, PosterMatch};

/// Books:
/// - 1: fiction, horror
/// - 2: fiction
/// - 3: fantasy
/// - 4: no tags
fn catalogue() -> Catalogue {
    Catalogue::new()
        .book("1", "s1")
        .book("2", "s1")
        .book("3", "s1")
        .book("4", "s1")
        .book_tags("1", &["fiction", "horror"])
        .book_tags("2", &["fiction"])
        .book_tags("3", &["fantasy"])
}

fn tag_is(tag: &str) -> BookCondition {
    BookCondition::Tag(Equality::Is(tag.to_owned()))
}

fn tag_is_not(tag: &str) -> BookCondition {
    BookCondition::Tag(Equality::IsNot(tag.to_owned()))
}

#[test]
fn test_any_of_tags() {
    let condition = BookCondition::AnyOf(vec![tag_is("horror"), tag_is("fantasy")]);
    assert_eq!(catalogue().search(&reader(), &condition), ids(&["1", "3"]));
}

#[test]
fn test_all_of_with_exclusion() {
    let condition = BookCondition::AllOf(vec![tag_is("fiction"), tag_is_not("horror")]);
    assert_eq!(catalogue().search(&reader(), &condition), ids(&["2"]));
}

#[test]
fn test_is_not_matches_untagged_books() {
    assert_eq!(
        catalogue().search(&reader(), &tag_is_not("fiction")),
        ids(&["3", "4"])
    );
}

#[test]
fn test_tag_match_ignores_case() {
    assert_eq!(
        catalogue().search(&reader(), &tag_is("HoRRoR")),
        ids(&["1"])
    );
}

/// Both empty combinators match every book, the same as no filter at all.
#[test]
fn test_empty_combinators_match_everything() {
    let catalogue = catalogue();
    let everything = ids(&["1", "2", "3", "4"]);
    assert_eq!(catalogue.visible::<BookCondition>(&reader()), everything);
    assert_eq!(
        catalogue.search(&reader(), &BookCondition::AllOf(vec![])),
        everything
    );
    assert_eq!(
        catalogue.search(&reader(), &BookCondition::AnyOf(vec![])),
        everything
    );
}

#[test]
fn test_nested_combinators() {
    // fiction AND (horror OR NOT fiction) -> only book 1
    let condition = BookCondition::AllOf(vec![
        tag_is("fiction"),
        BookCondition::AnyOf(vec![tag_is("horror"), tag_is_not("fiction")]),
    ]);
    assert_eq!(catalogue().search(&reader(), &condition), ids(&["1"]));
}

#[test]
fn test_empty_author_match_absorbs_any_of() {
    let empty_author = BookCondition::Author(Equality::Is(AuthorMatch::default()));
    let condition = BookCondition::AnyOf(vec![tag_is("horror"), empty_author]);
    assert_eq!(
        catalogue().search(&reader(), &condition),
        ids(&["1", "2", "3", "4"])
    );
}

#[test]
fn test_empty_poster_match_absorbs_any_of() {
    let empty_poster = BookCondition::Poster(Equality::Is(PosterMatch::default()));
    let condition = BookCondition::AnyOf(vec![tag_is("horror"), empty_poster]);
    assert_eq!(
        catalogue().search(&reader(), &condition),
        ids(&["1", "2", "3", "4"])
    );
}
