//! Test that compilation is deterministic and that joins are always unioned.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::backend::render_select;
use crate::e2e_tests::helpers::{compile, reader};
use crate::search::{
    AuthorMatch, BookCondition, ConditionTree, DateOp, Entity, Equality, JoinSet, Numeric,
    StringOp,
};
use crate::types::{MediaProfile, MediaStatus, ReadListId, ReadStatus};

fn random_leaf(rng: &mut StdRng) -> BookCondition {
    let pick = |rng: &mut StdRng, values: &[&str]| {
        values[rng.random_range(0..values.len())].to_owned()
    };
    let equality = |rng: &mut StdRng, value| {
        if rng.random_bool(0.5) {
            Equality::Is(value)
        } else {
            Equality::IsNot(value)
        }
    };
    match rng.random_range(0..8) {
        0 => {
            let tag = pick(rng, &["fiction", "horror", "fantasy"]);
            BookCondition::Tag(equality(rng, tag))
        }
        1 => BookCondition::Title(StringOp::Contains(pick(rng, &["moon", "sea"]))),
        2 => {
            let statuses = [ReadStatus::Read, ReadStatus::Unread, ReadStatus::InProgress];
            let status = statuses[rng.random_range(0..statuses.len())];
            BookCondition::ReadStatus(Equality::Is(status))
        }
        3 => {
            let list = ReadListId::new(pick(rng, &["A", "B", "C"]));
            BookCondition::ReadListId(Equality::Is(list))
        }
        4 => BookCondition::MediaStatus(Equality::Is(MediaStatus::Ready)),
        5 => BookCondition::MediaProfile(Equality::IsNot(MediaProfile::Pdf)),
        6 => BookCondition::NumberSort(Numeric::GreaterThan(rng.random_range(0.0..10.0))),
        _ => {
            let name = pick(rng, &["le guin", "banks"]);
            BookCondition::Author(Equality::Is(AuthorMatch::name(name)))
        }
    }
}

fn random_tree(rng: &mut StdRng, depth: usize) -> BookCondition {
    if depth == 0 || rng.random_bool(0.3) {
        return random_leaf(rng);
    }
    let children = (0..rng.random_range(0..4))
        .map(|_| random_tree(rng, depth - 1))
        .collect();
    if rng.random_bool(0.5) {
        BookCondition::AllOf(children)
    } else {
        BookCondition::AnyOf(children)
    }
}

fn leaves(condition: &BookCondition) -> Vec<&BookCondition> {
    match condition.children() {
        Some(children) => children.iter().flat_map(leaves).collect(),
        None => vec![condition],
    }
}

/// The joins of a tree are exactly the union of the joins of its leaves,
/// whatever the combinators and however the predicate folds.
#[test]
fn test_joins_are_the_union_of_leaf_joins() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let context = reader();
    for _ in 0..200 {
        let tree = random_tree(&mut rng, 4);
        let expected: JoinSet = leaves(&tree)
            .into_iter()
            .flat_map(|leaf| compile(&context, Some(leaf)).required_joins)
            .collect();
        assert_eq!(
            compile(&context, Some(&tree)).required_joins,
            expected,
            "{tree:?}"
        );
    }
}

#[test]
fn test_compilation_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(42);
    let context = reader();
    for _ in 0..50 {
        let tree = random_tree(&mut rng, 3);
        let first = compile(&context, Some(&tree));
        let second = compile(&context, Some(&tree));
        assert_eq!(first, second);
        assert_eq!(
            render_select(Entity::Book, &first),
            render_select(Entity::Book, &second)
        );
    }
}

/// Every placeholder in a rendered statement has a bind value, in order.
#[test]
fn test_placeholders_match_params() {
    let mut rng = StdRng::seed_from_u64(7);
    let context = reader();
    for _ in 0..100 {
        let tree = random_tree(&mut rng, 3);
        let statement = render_select(Entity::Book, &compile(&context, Some(&tree)));
        let placeholders = statement.sql.matches('$').count();
        assert_eq!(placeholders, statement.params.len(), "{}", statement.sql);
        if placeholders > 0 {
            let last = format!("${placeholders}");
            assert!(statement.sql.contains(&last), "{}", statement.sql);
        }
    }
}

#[test]
fn test_date_windows_depend_only_on_the_clock() {
    let condition =
        BookCondition::ReleaseDate(DateOp::IsInTheLast(std::time::Duration::from_secs(3600)));
    assert_eq!(
        compile(&reader(), Some(&condition)),
        compile(&reader(), Some(&condition))
    );
}
