use crate::{Comparison, FieldRef, Value};
use std::borrow::Cow;
use thiserror::Error;

/// Failures detected by Weir itself, before or without reaching a database.
///
/// They travel inside [`crate::Error`], use `downcast_ref::<QueryError>()` to
/// tell them apart from driver errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueryError {
    #[error("{action} on `{entity}` requires at least one field to write")]
    EmptyPayload {
        entity: Cow<'static, str>,
        action: &'static str,
    },
    #[error("{action} on `{entity}` does not accept a payload")]
    UnexpectedPayload {
        entity: Cow<'static, str>,
        action: &'static str,
    },
    #[error("{action} on `{entity}` cannot join other entities")]
    JoinedWrite {
        entity: Cow<'static, str>,
        action: &'static str,
    },
    #[error("Field {field} does not belong to `{entity}` nor to any joined entity")]
    UnresolvedField {
        field: FieldRef,
        entity: Cow<'static, str>,
    },
    #[error("Field reference has an empty name (entity `{entity}`)")]
    EmptyField { entity: Cow<'static, str> },
    #[error("Cannot compare {field} with NULL using {op:?}, only equality checks are allowed")]
    NullComparison { field: FieldRef, op: Comparison },
    #[error("Operator {op:?} on {field} expects a text value, found {value:?}")]
    InvalidOperand {
        field: FieldRef,
        op: Comparison,
        value: Value,
    },
    #[error("Page {page} with {per} items per page is not valid, both must be at least 1 and the offset must fit in 64 bits")]
    InvalidPage { page: u64, per: u64 },
    #[error("Pivot `{pivot}` does not connect `{left}` with `{right}`")]
    InvalidPivot {
        pivot: Cow<'static, str>,
        left: Cow<'static, str>,
        right: Cow<'static, str>,
    },
    #[error("Entity `{entity}` has no identifier yet, save it first")]
    MissingId { entity: Cow<'static, str> },
    #[error("Relation `{relation}` was not eager loaded")]
    NotLoaded { relation: &'static str },
    #[error("Entity `{entity}` is not valid: {reason}")]
    InvalidEntity {
        entity: Cow<'static, str>,
        reason: String,
    },
}
