//! Test library scoping of searches.

use crate::e2e_tests::helpers::{Catalogue, ids, reader};
use crate::search::{BookCondition, Equality, StringOp};
use crate::types::LibraryId;

fn catalogue() -> Catalogue {
    Catalogue::new()
        .book_in("a1", "s1", "lib-a")
        .book_in("a2", "s1", "lib-a")
        .book_in("b1", "s2", "lib-b")
        .book_in("c1", "s3", "lib-c")
}

#[test]
fn test_unscoped_reader_sees_everything() {
    assert_eq!(
        catalogue().visible::<BookCondition>(&reader()),
        ids(&["a1", "a2", "b1", "c1"])
    );
}

#[test]
fn test_scoped_reader_sees_authorized_libraries() {
    let context = reader().with_libraries([LibraryId::new("lib-c"), LibraryId::new("lib-a")]);
    assert_eq!(
        catalogue().visible::<BookCondition>(&context),
        ids(&["a1", "a2", "c1"])
    );
}

#[test]
fn test_no_authorized_library_sees_nothing() {
    let context = reader().with_libraries([]);
    assert!(catalogue().visible::<BookCondition>(&context).is_empty());
}

/// A user filter can narrow the scope but never widen it.
#[test]
fn test_user_filter_cannot_escape_scope() {
    let context = reader().with_libraries([LibraryId::new("lib-a")]);
    let catalogue = catalogue();
    let other_library = BookCondition::LibraryId(Equality::Is(LibraryId::new("lib-b")));
    assert!(catalogue.search(&context, &other_library).is_empty());

    let anything = BookCondition::AnyOf(vec![
        other_library,
        BookCondition::Title(StringOp::DoesNotContain("zzz".to_owned())),
        BookCondition::AllOf(vec![]),
    ]);
    assert_eq!(catalogue.search(&context, &anything), ids(&["a1", "a2"]));
}
