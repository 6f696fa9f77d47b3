use crate::{FieldRef, Value};
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    /// Text starts with the value.
    HasPrefix,
    /// Text ends with the value.
    HasSuffix,
    /// Text contains the value.
    Contains,
}

impl Comparison {
    pub fn is_pattern(&self) -> bool {
        matches!(
            self,
            Comparison::HasPrefix | Comparison::HasSuffix | Comparison::Contains
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    In,
    NotIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    And,
    Or,
}

/// Condition tree applied to the rows of a query.
///
/// Groups keep their children in declaration order. A group without any
/// effective child is a no-op and disappears from the rendered statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Compare {
        field: FieldRef,
        op: Comparison,
        value: Value,
    },
    Subset {
        field: FieldRef,
        scope: Scope,
        values: Vec<Value>,
    },
    Group {
        relation: Relation,
        filters: Vec<Filter>,
    },
}

impl Default for Filter {
    fn default() -> Self {
        Filter::and(Vec::new())
    }
}

impl Filter {
    pub fn compare(field: impl Into<FieldRef>, op: Comparison, value: impl Into<Value>) -> Self {
        Filter::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }
    pub fn subset(
        field: impl Into<FieldRef>,
        scope: Scope,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        Filter::Subset {
            field: field.into(),
            scope,
            values: values.into_iter().map(Into::into).collect(),
        }
    }
    pub fn group(relation: Relation, filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Group {
            relation,
            filters: filters.into_iter().collect(),
        }
    }
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::group(Relation::And, filters)
    }
    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::group(Relation::Or, filters)
    }

    /// True when the filter has no effect at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Filter::Group { filters, .. } => filters.iter().all(Filter::is_empty),
            _ => false,
        }
    }

    /// Appends a condition, turning the filter into an `And` group if needed.
    pub fn push(&mut self, filter: Filter) {
        match self {
            Filter::Group {
                relation: Relation::And,
                filters,
            } => filters.push(filter),
            _ => {
                let current = std::mem::take(self);
                *self = Filter::and([current, filter]);
            }
        }
    }

    /// Qualifies every field that has no entity yet.
    pub fn qualify(&mut self, entity: &Cow<'static, str>) {
        match self {
            Filter::Compare { field, .. } | Filter::Subset { field, .. } => {
                if !field.is_qualified() {
                    field.entity = entity.clone();
                }
            }
            Filter::Group { filters, .. } => {
                filters.iter_mut().for_each(|v| v.qualify(entity));
            }
        }
    }

    /// Every field referenced by the filter, depth first.
    pub fn fields(&self) -> Vec<&FieldRef> {
        let mut result = Vec::new();
        self.collect_fields(&mut result);
        result
    }

    fn collect_fields<'s>(&'s self, out: &mut Vec<&'s FieldRef>) {
        match self {
            Filter::Compare { field, .. } | Filter::Subset { field, .. } => out.push(field),
            Filter::Group { filters, .. } => filters.iter().for_each(|v| v.collect_fields(out)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// Ordering key, later sorts break the ties of the earlier ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sort {
    pub field: FieldRef,
    pub direction: Direction,
}

impl Sort {
    pub fn new(field: impl Into<FieldRef>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}
