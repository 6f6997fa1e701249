//! Security scope: authorized libraries AND content restrictions.

use super::{CompiledFilter, restriction};
use crate::auth::SecurityContext;
use crate::search::join::Entity;
use crate::search::predicate::{Literal, Predicate};

pub fn compile(entity: Entity, context: &SecurityContext) -> CompiledFilter {
    let libraries = match &context.authorized_library_ids {
        None => Predicate::True,
        Some(ids) if ids.is_empty() => Predicate::False,
        Some(ids) => Predicate::InList {
            column: entity.library_column(),
            values: ids.iter().cloned().map(Literal::from).collect(),
            negated: false,
        },
    };
    CompiledFilter::new(libraries).and(restriction::compile(&context.restrictions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AgeRestriction, ContentRestrictions};
    use crate::search::join::RequiredJoin;
    use crate::search::schema::{book, series};
    use crate::types::LibraryId;

    #[test]
    fn test_unrestricted_is_true() {
        let compiled = compile(Entity::Book, &SecurityContext::unrestricted());
        assert_eq!(compiled, CompiledFilter::always());
    }

    #[test]
    fn test_no_libraries_is_false_not_empty_in() {
        let context = SecurityContext::unrestricted().with_libraries(Vec::new());
        let compiled = compile(Entity::Series, &context);
        assert_eq!(compiled.predicate, Predicate::False);
    }

    #[test]
    fn test_library_membership_uses_entity_column() {
        let libraries = [LibraryId::new("b"), LibraryId::new("a")];
        let context = SecurityContext::unrestricted().with_libraries(libraries);
        let expected = |column| Predicate::InList {
            column,
            values: vec![Literal::from("a"), Literal::from("b")],
            negated: false,
        };
        let book_scope = compile(Entity::Book, &context);
        assert_eq!(book_scope.predicate, expected(book::LIBRARY_ID));
        let series_scope = compile(Entity::Series, &context);
        assert_eq!(series_scope.predicate, expected(series::LIBRARY_ID));
    }

    #[test]
    fn test_restrictions_are_anded_and_joins_unioned() {
        let context = SecurityContext::unrestricted()
            .with_libraries([LibraryId::new("a")])
            .with_restrictions(ContentRestrictions::new(
                Some(AgeRestriction::exclude(18)),
                Vec::<&str>::new(),
                Vec::<&str>::new(),
            ));
        let compiled = compile(Entity::Book, &context);
        let Predicate::And(parts) = &compiled.predicate else {
            panic!("expected a conjunction, got {:?}", compiled.predicate);
        };
        assert!(matches!(parts.first(), Some(Predicate::InList { .. })));
        let joins = &compiled.required_joins;
        assert!(joins.contains(&RequiredJoin::SeriesMetadata));
    }
}
