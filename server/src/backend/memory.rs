//! In-memory evaluation of compiled filters.
//!
//! A `MemoryStore` holds catalogue rows keyed by physical table. Selecting
//! with a compiled filter resolves each required join to at most one row
//! (a `LEFT JOIN` over to-one relations), then evaluates the predicate with
//! SQL `WHERE` semantics: any comparison involving a missing value is false.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::search::{
    Column, Comparison, CompiledFilter, Entity, JoinOn, JoinPlan, Literal, Predicate, SubQuery,
    Table, TextMatch,
};

/// One catalogue row. A missing column is NULL.
pub type Row = BTreeMap<&'static str, Literal>;

/// Rows bound to the tables (and aliases) in scope for one root row.
type Bindings<'a> = HashMap<Table, &'a Row>;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: HashMap<Table, Vec<Row>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row. Aliased tables store into their physical table.
    pub fn insert(&mut self, table: &Table, row: Row) {
        self.tables.entry(table.physical()).or_default().push(row);
    }

    /// Builder form of [`MemoryStore::insert`].
    #[must_use]
    pub fn with_row<I, V>(mut self, table: &Table, values: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, V)>,
        V: Into<Literal>,
    {
        let row = values
            .into_iter()
            .map(|(name, value)| (name, value.into()))
            .collect();
        self.insert(table, row);
        self
    }

    #[must_use]
    pub fn rows(&self, table: &Table) -> &[Row] {
        self.tables
            .get(&table.physical())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Ids of the root rows of `entity` matching `filter`, in insertion order.
    #[must_use]
    pub fn select_ids(&self, entity: Entity, filter: &CompiledFilter) -> Vec<String> {
        let root = entity.root_table();
        let plans: Vec<JoinPlan> = filter
            .required_joins
            .iter()
            .filter_map(|join| {
                let plan = join.plan(entity);
                if plan.is_none() {
                    tracing::warn!(?join, ?entity, "join does not apply to entity, skipped");
                }
                plan
            })
            .collect();
        let id_column = entity.id_column();

        self.rows(&root)
            .iter()
            .filter_map(|row| {
                let mut bindings = Bindings::new();
                bindings.insert(root.clone(), row);
                for plan in &plans {
                    if let Some(joined) = self.join(plan, &bindings) {
                        bindings.insert(plan.table.clone(), joined);
                    }
                }
                if !self.eval(&filter.predicate, &bindings) {
                    return None;
                }
                match lookup(&bindings, &id_column) {
                    Some(Literal::Text(id)) => Some(id.clone()),
                    _ => None,
                }
            })
            .collect()
    }

    /// The first row of the joined table satisfying every `ON` condition.
    fn join<'a>(&'a self, plan: &JoinPlan, bindings: &Bindings<'a>) -> Option<&'a Row> {
        self.rows(&plan.table).iter().find(|candidate| {
            plan.on.iter().all(|on| {
                let (child, expected) = match on {
                    JoinOn::Columns { parent, child } => (child, lookup(bindings, parent)),
                    JoinOn::Value { child, value } => (child, Some(value)),
                };
                match (candidate.get(child.name), expected) {
                    (Some(actual), Some(expected)) => {
                        compare(actual, expected) == Some(Ordering::Equal)
                    }
                    _ => false,
                }
            })
        })
    }

    fn eval(&self, predicate: &Predicate, bindings: &Bindings<'_>) -> bool {
        match predicate {
            Predicate::True => true,
            Predicate::False => false,
            Predicate::And(parts) => parts.iter().all(|part| self.eval(part, bindings)),
            Predicate::Or(parts) => parts.iter().any(|part| self.eval(part, bindings)),
            Predicate::Compare { column, op, value } => lookup(bindings, column)
                .is_some_and(|actual| satisfies(compare(actual, value), *op)),
            Predicate::CompareColumns { left, op, right } => {
                match (lookup(bindings, left), lookup(bindings, right)) {
                    (Some(left), Some(right)) => satisfies(compare(left, right), *op),
                    _ => false,
                }
            }
            Predicate::Text {
                column,
                mode,
                value,
                negated,
            } => match lookup(bindings, column) {
                Some(Literal::Text(actual)) => text_matches(actual, *mode, value) != *negated,
                _ => false,
            },
            Predicate::IsNull(column) => lookup(bindings, column).is_none(),
            Predicate::IsNotNull(column) => lookup(bindings, column).is_some(),
            Predicate::IsTrue(column) => {
                matches!(lookup(bindings, column), Some(Literal::Boolean(true)))
            }
            Predicate::IsFalse(column) => {
                matches!(lookup(bindings, column), Some(Literal::Boolean(false)))
            }
            Predicate::InList {
                column,
                values,
                negated,
            } => {
                if values.is_empty() {
                    return *negated;
                }
                lookup(bindings, column).is_some_and(|actual| {
                    let found = values
                        .iter()
                        .any(|value| compare(actual, value) == Some(Ordering::Equal));
                    found != *negated
                })
            }
            Predicate::InSubquery {
                column,
                subquery,
                negated,
            } => lookup(bindings, column).is_some_and(|actual| {
                self.subquery_contains(subquery, actual, bindings) != *negated
            }),
        }
    }

    fn subquery_contains(
        &self,
        subquery: &SubQuery,
        needle: &Literal,
        outer: &Bindings<'_>,
    ) -> bool {
        let table = &subquery.select.table;
        self.rows(table).iter().any(|row| {
            let mut bindings = outer.clone();
            bindings.insert(table.clone(), row);
            self.eval(&subquery.filter, &bindings)
                && lookup(&bindings, &subquery.select)
                    .is_some_and(|value| compare(value, needle) == Some(Ordering::Equal))
        })
    }
}

fn lookup<'a>(bindings: &Bindings<'a>, column: &Column) -> Option<&'a Literal> {
    bindings
        .get(&column.table)
        .and_then(|row| row.get(column.name))
}

/// Order two values of compatible kinds; `None` when they cannot be compared.
fn compare(left: &Literal, right: &Literal) -> Option<Ordering> {
    match (left, right) {
        (Literal::Text(l), Literal::Text(r)) => Some(l.cmp(r)),
        (Literal::Integer(l), Literal::Integer(r)) => Some(l.cmp(r)),
        (Literal::Float(l), Literal::Float(r)) => l.partial_cmp(r),
        #[allow(clippy::cast_precision_loss)] // catalogue integers are small counts and ratings
        (Literal::Integer(l), Literal::Float(r)) => (*l as f64).partial_cmp(r),
        #[allow(clippy::cast_precision_loss)]
        (Literal::Float(l), Literal::Integer(r)) => l.partial_cmp(&(*r as f64)),
        (Literal::Boolean(l), Literal::Boolean(r)) => Some(l.cmp(r)),
        (Literal::Timestamp(l), Literal::Timestamp(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

fn satisfies(ordering: Option<Ordering>, op: Comparison) -> bool {
    ordering.is_some_and(|ordering| match op {
        Comparison::Eq => ordering.is_eq(),
        Comparison::NotEq => ordering.is_ne(),
        Comparison::Gt => ordering.is_gt(),
        Comparison::GtEq => ordering.is_ge(),
        Comparison::Lt => ordering.is_lt(),
        Comparison::LtEq => ordering.is_le(),
    })
}

fn text_matches(actual: &str, mode: TextMatch, expected: &str) -> bool {
    let actual = actual.to_lowercase();
    let expected = expected.to_lowercase();
    match mode {
        TextMatch::Equals => actual == expected,
        TextMatch::Contains => actual.contains(&expected),
        TextMatch::StartsWith => actual.starts_with(&expected),
        TextMatch::EndsWith => actual.ends_with(&expected),
    }
}
