use crate::{FieldRef, Filter, QueryError, Result, Sort, Value};
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Count,
    Sum,
    Average,
    Minimum,
    Maximum,
}

impl AggregateFunction {
    pub fn sql_name(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Average => "AVG",
            AggregateFunction::Minimum => "MIN",
            AggregateFunction::Maximum => "MAX",
        }
    }
}

/// Label of the single column produced by an aggregate query.
pub const AGGREGATE_LABEL: &str = "weir_aggregate";

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Select,
    Insert,
    Update,
    Delete,
    /// `field` is `None` for `COUNT(*)`.
    Aggregate {
        function: AggregateFunction,
        field: Option<FieldRef>,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Select => "Select",
            Action::Insert => "Insert",
            Action::Update => "Update",
            Action::Delete => "Delete",
            Action::Aggregate { .. } => "Aggregate",
        }
    }
}

/// Selected field, optionally relabeled.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryField {
    pub field: FieldRef,
    pub alias: Option<Cow<'static, str>>,
}

impl QueryField {
    pub fn new(field: FieldRef) -> Self {
        Self { field, alias: None }
    }
    pub fn aliased(field: FieldRef, alias: impl Into<Cow<'static, str>>) -> Self {
        Self {
            field,
            alias: Some(alias.into()),
        }
    }
    /// Label of the column in the result rows.
    pub fn label(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.field.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
    Outer,
}

impl JoinKind {
    pub fn sql_name(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Outer => "FULL OUTER JOIN",
        }
    }
}

/// `<kind> JOIN <entity> ON <local> = <foreign>`, `foreign` belongs to `entity`.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub entity: Cow<'static, str>,
    pub local: FieldRef,
    pub foreign: FieldRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Limit {
    pub count: u64,
    pub offset: u64,
}

/// Driver agnostic description of one data operation.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseQuery {
    pub entity: Cow<'static, str>,
    pub action: Action,
    /// Empty means every field.
    pub fields: Vec<QueryField>,
    pub distinct: bool,
    /// Always a group, `And` at the root.
    pub filter: Filter,
    pub sorts: Vec<Sort>,
    pub limit: Option<Limit>,
    pub group_by: Vec<FieldRef>,
    pub joins: Vec<Join>,
    /// Field values written by inserts and updates.
    pub input: Vec<(Cow<'static, str>, Value)>,
}

impl DatabaseQuery {
    pub fn new(entity: impl Into<Cow<'static, str>>, action: Action) -> Self {
        Self {
            entity: entity.into(),
            action,
            fields: Vec::new(),
            distinct: false,
            filter: Filter::default(),
            sorts: Vec::new(),
            limit: None,
            group_by: Vec::new(),
            joins: Vec::new(),
            input: Vec::new(),
        }
    }

    /// Whether `entity` is the query entity or one of the joined ones.
    pub fn knows_entity(&self, entity: &str) -> bool {
        entity.is_empty() || self.entity == entity || self.joins.iter().any(|v| v.entity == entity)
    }

    /// Checks the payload and the joins against the action.
    pub fn validate(&self) -> Result<()> {
        let writes = matches!(self.action, Action::Insert | Action::Update);
        if writes && self.input.is_empty() {
            return Err(QueryError::EmptyPayload {
                entity: self.entity.clone(),
                action: self.action.name(),
            }
            .into());
        }
        if !writes && !self.input.is_empty() {
            return Err(QueryError::UnexpectedPayload {
                entity: self.entity.clone(),
                action: self.action.name(),
            }
            .into());
        }
        let reads = matches!(self.action, Action::Select | Action::Aggregate { .. });
        if !reads && !self.joins.is_empty() {
            return Err(QueryError::JoinedWrite {
                entity: self.entity.clone(),
                action: self.action.name(),
            }
            .into());
        }
        Ok(())
    }

    /// Checks that every field reference can be resolved.
    pub fn check_field(&self, field: &FieldRef) -> Result<()> {
        if field.name.is_empty() {
            return Err(QueryError::EmptyField {
                entity: field.entity.clone(),
            }
            .into());
        }
        if !self.knows_entity(&field.entity) {
            return Err(QueryError::UnresolvedField {
                field: field.clone(),
                entity: self.entity.clone(),
            }
            .into());
        }
        Ok(())
    }
}
