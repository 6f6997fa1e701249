//! Backend-agnostic predicate IR.
//!
//! A compiled filter is a `Predicate` tree over typed column references. It
//! says nothing about how the predicate is executed: the SQL backend renders
//! it to a parameterised `WHERE` fragment, the in-memory backend evaluates it
//! row by row.
//!
//! # Invariants
//!
//! - There is no general NOT node. Every negation is spelled out at the leaf
//!   (`negated` flags, `NotEq`, `IsNull`/`IsNotNull`), so a comparison against
//!   NULL is simply false and two-valued evaluation matches SQL `WHERE`.
//! - Text matches are always case-insensitive.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::schema::Table;

/// A reference to one column of one (possibly aliased) table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    pub table: Table,
    pub name: &'static str,
}

impl Column {
    #[must_use]
    pub const fn new(table: Table, name: &'static str) -> Self {
        Self { table, name }
    }
}

/// A literal value bound into a predicate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Literal {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f32> for Literal {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<DateTime<Utc>> for Literal {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    NotEq,
    Gt,
    GtEq,
    Lt,
    LtEq,
}

impl Comparison {
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Lt => "<",
            Self::LtEq => "<=",
        }
    }
}

/// How a case-insensitive text match anchors its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatch {
    Equals,
    Contains,
    StartsWith,
    EndsWith,
}

/// `SELECT <select> FROM <select.table> WHERE <filter>`.
#[derive(Debug, Clone, PartialEq)]
pub struct SubQuery {
    pub select: Column,
    pub filter: Box<Predicate>,
}

impl SubQuery {
    #[must_use]
    pub fn new(select: Column, filter: Predicate) -> Self {
        Self {
            select,
            filter: Box::new(filter),
        }
    }
}

/// A boolean predicate over catalogue columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every row.
    True,
    /// Matches no row.
    False,
    And(Vec<Self>),
    Or(Vec<Self>),
    Compare {
        column: Column,
        op: Comparison,
        value: Literal,
    },
    CompareColumns {
        left: Column,
        op: Comparison,
        right: Column,
    },
    /// Case-insensitive text match.
    Text {
        column: Column,
        mode: TextMatch,
        value: String,
        negated: bool,
    },
    IsNull(Column),
    IsNotNull(Column),
    IsTrue(Column),
    IsFalse(Column),
    InList {
        column: Column,
        values: Vec<Literal>,
        negated: bool,
    },
    InSubquery {
        column: Column,
        subquery: SubQuery,
        negated: bool,
    },
}

impl Predicate {
    #[must_use]
    pub fn compare(column: Column, op: Comparison, value: impl Into<Literal>) -> Self {
        Self::Compare {
            column,
            op,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn eq(column: Column, value: impl Into<Literal>) -> Self {
        Self::compare(column, Comparison::Eq, value)
    }

    #[must_use]
    pub fn ne(column: Column, value: impl Into<Literal>) -> Self {
        Self::compare(column, Comparison::NotEq, value)
    }

    #[must_use]
    pub fn text(column: Column, mode: TextMatch, value: impl Into<String>, negated: bool) -> Self {
        Self::Text {
            column,
            mode,
            value: value.into(),
            negated,
        }
    }

    #[must_use]
    pub const fn in_subquery(column: Column, subquery: SubQuery) -> Self {
        Self::InSubquery {
            column,
            subquery,
            negated: false,
        }
    }

    #[must_use]
    pub const fn not_in_subquery(column: Column, subquery: SubQuery) -> Self {
        Self::InSubquery {
            column,
            subquery,
            negated: true,
        }
    }

    /// Conjunction, flattening nested `And` and folding constants.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::True, p) | (p, Self::True) => p,
            (Self::False, _) | (_, Self::False) => Self::False,
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), p) => {
                left.push(p);
                Self::And(left)
            }
            (p, Self::And(right)) => {
                let mut all = Vec::with_capacity(right.len() + 1);
                all.push(p);
                all.extend(right);
                Self::And(all)
            }
            (left, right) => Self::And(vec![left, right]),
        }
    }

    /// Disjunction, flattening nested `Or` and folding constants.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        match (self, other) {
            (Self::False, p) | (p, Self::False) => p,
            (Self::True, _) | (_, Self::True) => Self::True,
            (Self::Or(mut left), Self::Or(right)) => {
                left.extend(right);
                Self::Or(left)
            }
            (Self::Or(mut left), p) => {
                left.push(p);
                Self::Or(left)
            }
            (p, Self::Or(right)) => {
                let mut any = Vec::with_capacity(right.len() + 1);
                any.push(p);
                any.extend(right);
                Self::Or(any)
            }
            (left, right) => Self::Or(vec![left, right]),
        }
    }

    /// Conjunction of all predicates. An empty input is `True`.
    #[must_use]
    pub fn all(predicates: impl IntoIterator<Item = Self>) -> Self {
        predicates.into_iter().fold(Self::True, Self::and)
    }

    /// Disjunction of all predicates.
    ///
    /// The fold starts from a neutral "no condition" seed, so an empty input
    /// is `True`, not `False`. Empty `anyOf` filters therefore match everything.
    #[must_use]
    pub fn any(predicates: impl IntoIterator<Item = Self>) -> Self {
        predicates
            .into_iter()
            .fold(None, |acc: Option<Self>, p| {
                Some(match acc {
                    None => p,
                    Some(acc) => acc.or(p),
                })
            })
            .unwrap_or(Self::True)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &'static str) -> Column {
        Column::new(Table::Book, name)
    }

    #[test]
    fn test_and_folds_constants() {
        let p = Predicate::IsNull(col("A"));
        assert_eq!(Predicate::True.and(p.clone()), p);
        assert_eq!(p.clone().and(Predicate::True), p);
        assert_eq!(p.clone().and(Predicate::False), Predicate::False);
    }

    #[test]
    fn test_or_folds_constants() {
        let p = Predicate::IsNull(col("A"));
        assert_eq!(Predicate::False.or(p.clone()), p);
        assert_eq!(p.clone().or(Predicate::True), Predicate::True);
    }

    #[test]
    fn test_and_flattens() {
        let a = Predicate::IsNull(col("A"));
        let b = Predicate::IsNull(col("B"));
        let c = Predicate::IsNull(col("C"));
        let combined = a.clone().and(b.clone()).and(c.clone());
        assert_eq!(combined, Predicate::And(vec![a, b, c]));
    }

    #[test]
    fn test_or_flattens_right_nested() {
        let a = Predicate::IsNull(col("A"));
        let b = Predicate::IsNull(col("B"));
        let c = Predicate::IsNull(col("C"));
        let combined = a.clone().or(b.clone().or(c.clone()));
        assert_eq!(combined, Predicate::Or(vec![a, b, c]));
    }

    #[test]
    fn test_empty_folds_are_true() {
        assert_eq!(Predicate::all(Vec::new()), Predicate::True);
        assert_eq!(Predicate::any(Vec::new()), Predicate::True);
    }

    #[test]
    fn test_any_of_single_false_stays_false() {
        assert_eq!(Predicate::any(vec![Predicate::False]), Predicate::False);
    }

    #[test]
    fn test_literal_conversions() {
        assert_eq!(Literal::from(3_i32), Literal::Integer(3));
        assert_eq!(Literal::from(1.5_f32), Literal::Float(1.5));
        assert_eq!(Literal::from("x"), Literal::Text("x".to_owned()));
        assert_eq!(Literal::from(true), Literal::Boolean(true));
    }
}
