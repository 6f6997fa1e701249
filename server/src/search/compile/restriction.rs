//! Content restrictions: age rating and sharing-label policy.
//!
//! ```text
//! allowed = age_allowed OR label_allowed
//! denied  = age_denied AND label_denied
//! result  = allowed AND denied
//! ```
//!
//! A branch that is not configured is neutral: it is left out of the OR or
//! the AND rather than turned into a constant. With nothing configured the
//! result is `True` and no join is required.

use std::collections::BTreeSet;

use super::CompiledFilter;
use crate::auth::{AgeRestrictionMode, ContentRestrictions};
use crate::search::join::RequiredJoin;
use crate::search::predicate::{Comparison, Literal, Predicate, SubQuery};
use crate::search::schema::{series_metadata, series_metadata_sharing};

pub fn compile(restrictions: &ContentRestrictions) -> CompiledFilter {
    if !restrictions.is_restricted() {
        return CompiledFilter::always();
    }

    let age = restrictions.age_restriction;
    let age_allowed = age
        .filter(|age| age.mode == AgeRestrictionMode::AllowOnly)
        .map(|age| {
            let column = series_metadata::AGE_RATING;
            let within = Predicate::compare(column.clone(), Comparison::LtEq, age.age);
            Predicate::IsNotNull(column).and(within)
        });
    let age_denied = age
        .filter(|age| age.mode == AgeRestrictionMode::Exclude)
        .map(|age| {
            let column = series_metadata::AGE_RATING;
            let below = Predicate::compare(column.clone(), Comparison::Lt, age.age);
            Predicate::IsNull(column).or(below)
        });
    let label_allowed = labelled(&restrictions.labels_allow, false);
    let label_denied = labelled(&restrictions.labels_exclude, true);

    let allowed = match (age_allowed, label_allowed) {
        (Some(age), Some(label)) => Some(age.or(label)),
        (age, label) => age.or(label),
    };

    let branches: Vec<Predicate> = allowed
        .into_iter()
        .chain(age_denied)
        .chain(label_denied)
        .collect();
    tracing::trace!(branches = branches.len(), "compiled content restrictions");
    CompiledFilter::with_join(Predicate::all(branches), RequiredJoin::SeriesMetadata)
}

/// Series carrying any of `labels`, or none of them when `negated`.
fn labelled(labels: &BTreeSet<String>, negated: bool) -> Option<Predicate> {
    if labels.is_empty() {
        return None;
    }
    let subquery = SubQuery::new(
        series_metadata_sharing::SERIES_ID,
        Predicate::InList {
            column: series_metadata_sharing::LABEL,
            values: labels.iter().cloned().map(Literal::from).collect(),
            negated: false,
        },
    );
    Some(Predicate::InSubquery {
        column: series_metadata::SERIES_ID,
        subquery,
        negated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AgeRestriction;
    use crate::search::join::JoinSet;

    fn none() -> Vec<&'static str> {
        Vec::new()
    }

    fn age_at_most(age: i32) -> Predicate {
        Predicate::And(vec![
            Predicate::IsNotNull(series_metadata::AGE_RATING),
            Predicate::compare(series_metadata::AGE_RATING, Comparison::LtEq, age),
        ])
    }

    fn age_below_or_unrated(age: i32) -> Predicate {
        Predicate::Or(vec![
            Predicate::IsNull(series_metadata::AGE_RATING),
            Predicate::compare(series_metadata::AGE_RATING, Comparison::Lt, age),
        ])
    }

    #[test]
    fn test_no_restrictions_is_true_without_joins() {
        let compiled = compile(&ContentRestrictions::none());
        assert_eq!(compiled.predicate, Predicate::True);
        assert!(compiled.required_joins.is_empty());
    }

    #[test]
    fn test_allow_only_age() {
        let restrictions =
            ContentRestrictions::new(Some(AgeRestriction::allow_only(10)), none(), none());
        let compiled = compile(&restrictions);
        assert_eq!(compiled.predicate, age_at_most(10));
        assert_eq!(
            compiled.required_joins,
            JoinSet::from([RequiredJoin::SeriesMetadata])
        );
    }

    #[test]
    fn test_exclude_age() {
        let restrictions =
            ContentRestrictions::new(Some(AgeRestriction::exclude(16)), none(), none());
        assert_eq!(compile(&restrictions).predicate, age_below_or_unrated(16));
    }

    #[test]
    fn test_allow_age_or_allow_label() {
        let restrictions =
            ContentRestrictions::new(Some(AgeRestriction::allow_only(10)), ["kids"], none());
        let predicate = compile(&restrictions).predicate;
        let Predicate::Or(branches) = predicate else {
            panic!("expected a disjunction, got {predicate:?}");
        };
        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0], age_at_most(10));
        assert!(matches!(branches[1], Predicate::InSubquery { negated: false, .. }));
    }

    #[test]
    fn test_exclude_label_only_is_a_negative() {
        let restrictions = ContentRestrictions::new(None, none(), ["mature"]);
        let compiled = compile(&restrictions);
        let predicate = &compiled.predicate;
        assert!(matches!(predicate, Predicate::InSubquery { negated: true, .. }));
        assert_eq!(
            compiled.required_joins,
            JoinSet::from([RequiredJoin::SeriesMetadata])
        );
    }

    #[test]
    fn test_allow_and_exclude_are_anded() {
        let restrictions = ContentRestrictions::new(None, ["allow"], ["exclude"]);
        let predicate = compile(&restrictions).predicate;
        let Predicate::And(branches) = predicate else {
            panic!("expected a conjunction, got {predicate:?}");
        };
        let [first, second] = branches.as_slice() else {
            panic!("expected two branches, got {branches:?}");
        };
        assert!(matches!(first, Predicate::InSubquery { negated: false, .. }));
        assert!(matches!(second, Predicate::InSubquery { negated: true, .. }));
    }
}
