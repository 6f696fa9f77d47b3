use crate::Value;
use std::{
    borrow::Cow,
    fmt::{self, Display},
};

/// Reference to a field, qualified by the entity it belongs to.
///
/// An empty `entity` means "the entity of the query", builders qualify it
/// before the query leaves them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub entity: Cow<'static, str>,
    pub name: Cow<'static, str>,
}

impl FieldRef {
    pub const fn new(entity: &'static str, name: &'static str) -> Self {
        Self {
            entity: Cow::Borrowed(entity),
            name: Cow::Borrowed(name),
        }
    }
    pub fn unqualified(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            entity: Cow::Borrowed(""),
            name: name.into(),
        }
    }
    pub fn is_qualified(&self) -> bool {
        !self.entity.is_empty()
    }
    /// The same reference, qualified with `entity` if it was not already.
    pub fn qualified(mut self, entity: &Cow<'static, str>) -> Self {
        if self.entity.is_empty() {
            self.entity = entity.clone();
        }
        self
    }
    /// Label used for the field when selected through a join: `entity_field`.
    pub fn alias(&self) -> String {
        format!("{}_{}", self.entity, self.name)
    }
}

impl From<&'static str> for FieldRef {
    fn from(value: &'static str) -> Self {
        FieldRef::unqualified(value)
    }
}

impl From<String> for FieldRef {
    fn from(value: String) -> Self {
        FieldRef::unqualified(value)
    }
}

impl From<&FieldRef> for FieldRef {
    fn from(value: &FieldRef) -> Self {
        value.clone()
    }
}

impl Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entity.is_empty() {
            write!(f, "`{}`", self.name)
        } else {
            write!(f, "`{}.{}`", self.entity, self.name)
        }
    }
}

/// How the identifier of a new row is obtained.
#[derive(Debug, Clone, Copy)]
pub enum IdType {
    /// The database assigns it, it comes back as the last affected id.
    Autoincrement,
    /// Weir generates it right before the insert.
    Generated(fn() -> Value),
    /// The caller must set it.
    Supplied,
}

impl PartialEq for IdType {
    fn eq(&self, other: &Self) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }
}

/// Description of a persisted field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: Cow<'static, str>,
    /// Typed null giving the type of the field.
    pub value: Value,
    pub nullable: bool,
    pub unique: bool,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub default: Option<Value>,
    pub references: Option<FieldRef>,
}

impl FieldDef {
    pub fn new(name: impl Into<Cow<'static, str>>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            nullable: false,
            unique: false,
            primary_key: false,
            auto_increment: false,
            default: None,
            references: None,
        }
    }
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
    pub fn references(mut self, field: FieldRef) -> Self {
        self.references = Some(field);
        self
    }
}
