//! Search operators: the comparison semantics applied at a filter leaf.
//!
//! Each family is its own closed enum, so a leaf declares exactly which
//! operators its attribute accepts: a numeric operator on a text attribute
//! cannot be constructed.
//!
//! On the wire operators are adjacently tagged:
//! `{"operator": "contains", "value": "moon"}`, `{"operator": "isTrue"}`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Exact equality or inequality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operator", content = "value", rename_all = "camelCase")]
pub enum Equality<T> {
    Is(T),
    IsNot(T),
}

/// Case-insensitive text matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operator", content = "value", rename_all = "camelCase")]
pub enum StringOp {
    Contains(String),
    DoesNotContain(String),
    BeginsWith(String),
    DoesNotBeginWith(String),
    EndsWith(String),
    DoesNotEndWith(String),
    /// Case-insensitive equality.
    Is(String),
    /// Case-insensitive inequality.
    IsNot(String),
}

/// Ordered comparison of a non-null number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operator", content = "value", rename_all = "camelCase")]
pub enum Numeric<T> {
    Is(T),
    IsNot(T),
    GreaterThan(T),
    LessThan(T),
}

/// Ordered comparison of a number that may be absent.
///
/// `IsNot(v)` also matches rows where the value is absent, while `Is(v)`
/// never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operator", content = "value", rename_all = "camelCase")]
pub enum NumericNullable<T> {
    Is(T),
    IsNot(T),
    GreaterThan(T),
    LessThan(T),
    IsNull,
    IsNotNull,
}

/// Comparison of an instant.
///
/// The relative variants are measured back from "now". A missing date is
/// neither in the last period nor outside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operator", content = "value", rename_all = "camelCase")]
pub enum DateOp {
    After(DateTime<Utc>),
    Before(DateTime<Utc>),
    IsInTheLast(Duration),
    IsNotInTheLast(Duration),
    IsNull,
    IsNotNull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operator", rename_all = "camelCase")]
pub enum BooleanOp {
    IsTrue,
    IsFalse,
}
