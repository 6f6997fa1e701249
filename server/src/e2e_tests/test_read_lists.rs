//! Test read-list membership, including several read lists in one filter.

use crate::e2e_tests::helpers::{Catalogue, compile, ids, reader};
use crate::search::{BookCondition, Entity, Equality, Literal, RequiredJoin, Table};
use crate::types::ReadListId;

/// Read list A holds books 1 and 2, read list B holds books 2 and 3.
fn catalogue() -> Catalogue {
    let entry = |list: &str, book: &str| {
        [
            ("READLIST_ID", Literal::from(list)),
            ("BOOK_ID", Literal::from(book)),
        ]
    };
    Catalogue::new()
        .book("1", "s1")
        .book("2", "s1")
        .book("3", "s1")
        .row(&Table::ReadListBook, entry("A", "1"))
        .row(&Table::ReadListBook, entry("A", "2"))
        .row(&Table::ReadListBook, entry("B", "2"))
        .row(&Table::ReadListBook, entry("B", "3"))
}

fn in_list(id: &str) -> BookCondition {
    BookCondition::ReadListId(Equality::Is(ReadListId::new(id)))
}

fn not_in_list(id: &str) -> BookCondition {
    BookCondition::ReadListId(Equality::IsNot(ReadListId::new(id)))
}

#[test]
fn test_in_both_read_lists() {
    let condition = BookCondition::AllOf(vec![in_list("A"), in_list("B")]);
    assert_eq!(catalogue().search(&reader(), &condition), ids(&["2"]));

    let compiled = compile(&reader(), Some(&condition));
    for list in ["A", "B"] {
        let join = RequiredJoin::ReadList(ReadListId::new(list));
        assert!(compiled.required_joins.contains(&join));
    }
}

#[test]
fn test_in_either_read_list() {
    let condition = BookCondition::AnyOf(vec![in_list("A"), in_list("B")]);
    assert_eq!(
        catalogue().search(&reader(), &condition),
        ids(&["1", "2", "3"])
    );
}

#[test]
fn test_not_in_read_list() {
    let catalogue = catalogue();
    assert_eq!(catalogue.search(&reader(), &not_in_list("A")), ids(&["3"]));
    let condition = BookCondition::AnyOf(vec![in_list("A"), not_in_list("B")]);
    assert_eq!(catalogue.search(&reader(), &condition), ids(&["1", "2"]));
}

#[test]
fn test_read_list_join_is_scoped_to_its_list() {
    // Book 3 has a READLIST_BOOK row, but not for list A.
    let catalogue = catalogue();
    let compiled = compile(&reader(), Some(&in_list("A")));
    assert_eq!(
        catalogue.store.select_ids(Entity::Book, &compiled),
        ids(&["1", "2"])
    );
}
