use crate::{Driver, Entity, Executor, FieldDef, QueryError, Result, Value};
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaAction {
    Create,
    Update,
    Delete,
}

/// Driver agnostic description of a change to the structure of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaQuery {
    pub entity: Cow<'static, str>,
    pub action: SchemaAction,
    /// Columns of a created entity, or columns added by an update.
    pub create_fields: Vec<FieldDef>,
    /// Columns removed by an update.
    pub delete_fields: Vec<Cow<'static, str>>,
}

impl SchemaQuery {
    pub fn new(entity: impl Into<Cow<'static, str>>, action: SchemaAction) -> Self {
        Self {
            entity: entity.into(),
            action,
            create_fields: Vec::new(),
            delete_fields: Vec::new(),
        }
    }

    /// Creation of the table described by `M`.
    pub fn create_entity<M: Entity>() -> Self {
        let def = M::entity();
        Self {
            create_fields: def.fields.clone(),
            ..Self::new(def.name.clone(), SchemaAction::Create)
        }
    }

    pub fn delete_entity<M: Entity>() -> Self {
        Self::new(M::entity().name.clone(), SchemaAction::Delete)
    }

    pub fn validate(&self) -> Result<()> {
        let reason = match self.action {
            SchemaAction::Create if self.create_fields.is_empty() => "a table needs at least one field",
            SchemaAction::Create if !self.delete_fields.is_empty() => "a new table cannot drop fields",
            SchemaAction::Update if self.create_fields.is_empty() && self.delete_fields.is_empty() => {
                "nothing to change"
            }
            SchemaAction::Delete if !self.create_fields.is_empty() || !self.delete_fields.is_empty() => {
                "dropping a table does not take fields"
            }
            _ => return Ok(()),
        };
        Err(QueryError::InvalidEntity {
            entity: self.entity.clone(),
            reason: reason.into(),
        }
        .into())
    }
}

/// Fluent construction of a [`SchemaQuery`] bound to an executor.
///
/// ```ignore
/// SchemaBuilder::create(&mut connection, "planet")
///     .id()
///     .field(FieldDef::new("name", Value::Varchar(None)).unique())
///     .parent::<Star>()
///     .run()
///     .await?;
/// ```
pub struct SchemaBuilder<'e, E: Executor> {
    executor: &'e mut E,
    query: SchemaQuery,
}

impl<'e, E: Executor> SchemaBuilder<'e, E> {
    pub fn create(executor: &'e mut E, entity: impl Into<Cow<'static, str>>) -> Self {
        Self {
            executor,
            query: SchemaQuery::new(entity, SchemaAction::Create),
        }
    }

    pub fn update(executor: &'e mut E, entity: impl Into<Cow<'static, str>>) -> Self {
        Self {
            executor,
            query: SchemaQuery::new(entity, SchemaAction::Update),
        }
    }

    pub fn delete(executor: &'e mut E, entity: impl Into<Cow<'static, str>>) -> Self {
        Self {
            executor,
            query: SchemaQuery::new(entity, SchemaAction::Delete),
        }
    }

    /// Autoincrement integer primary key named after the driver convention.
    pub fn id(mut self) -> Self {
        let name = self.executor.driver().id_key();
        self.query.create_fields.push(
            FieldDef::new(name, Value::Int64(None))
                .primary_key()
                .auto_increment(),
        );
        self
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.query.create_fields.push(field);
        self
    }

    /// Foreign key referencing the identifier of `P`, `<model>_id` by default.
    pub fn parent<P: Entity>(mut self) -> Self {
        let parent = P::entity();
        let name = self
            .executor
            .driver()
            .key_naming()
            .foreign_key(&parent.model, &parent.id_key);
        let value = parent
            .field(&parent.id_key)
            .map(|v| v.value.as_null())
            .unwrap_or(Value::Int64(None));
        self.query
            .create_fields
            .push(FieldDef::new(name, value).references(parent.id_ref()));
        self
    }

    pub fn delete_field(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.query.delete_fields.push(name.into());
        self
    }

    pub fn query(&self) -> &SchemaQuery {
        &self.query
    }

    pub fn into_query(self) -> SchemaQuery {
        self.query
    }

    pub async fn run(self) -> Result<()> {
        self.query.validate()?;
        self.executor.schema(self.query).await
    }
}
