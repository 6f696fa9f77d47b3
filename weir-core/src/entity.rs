use crate::{
    Action, Comparison, DatabaseQuery, Error, Executor, FieldDef, FieldRef, Filter, IdType,
    QueryBuilder, QueryError, QueryField, Result, RowLabeled, RowsAffected, SchemaQuery, Value,
    timestamp_now,
};
use log::Level;
use std::{borrow::Cow, collections::HashSet, future::Future};

/// Static description of a persisted model.
#[derive(Debug, Clone)]
pub struct EntityDef {
    /// Table name.
    pub name: Cow<'static, str>,
    /// Singular model name, used to derive foreign key names.
    pub model: Cow<'static, str>,
    pub id_key: Cow<'static, str>,
    pub id_type: IdType,
    /// Persisted fields in declaration order, the identifier included.
    pub fields: Vec<FieldDef>,
    pub created_at: Option<Cow<'static, str>>,
    pub updated_at: Option<Cow<'static, str>>,
    /// Soft delete marker, rows with a past value are hidden from queries.
    pub deleted_at: Option<Cow<'static, str>>,
}

impl EntityDef {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|v| v.name == name)
    }

    pub fn id_ref(&self) -> FieldRef {
        self.field_ref(self.id_key.clone())
    }

    pub fn field_ref(&self, name: impl Into<Cow<'static, str>>) -> FieldRef {
        FieldRef {
            entity: self.name.clone(),
            name: name.into(),
        }
    }

    /// Every field, qualified with the entity name.
    pub fn query_fields(&self) -> Vec<QueryField> {
        self.fields
            .iter()
            .map(|v| QueryField::new(self.field_ref(v.name.clone())))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| -> Error {
            QueryError::InvalidEntity {
                entity: self.name.clone(),
                reason,
            }
            .into()
        };
        let mut names = HashSet::new();
        for field in &self.fields {
            if !names.insert(&field.name) {
                return Err(invalid(format!("field `{}` is declared twice", field.name)));
            }
        }
        if self.field(&self.id_key).is_none() {
            return Err(invalid(format!(
                "identifier field `{}` is missing",
                self.id_key
            )));
        }
        for name in [&self.created_at, &self.updated_at, &self.deleted_at]
            .into_iter()
            .flatten()
        {
            if self.field(name).is_none() {
                return Err(invalid(format!("timestamp field `{}` is missing", name)));
            }
        }
        Ok(())
    }
}

/// A model persisted in one entity (table).
///
/// Usually implemented through `#[derive(Entity)]`, which provides the
/// required methods. The provided ones build on them.
pub trait Entity: Send + Sync + Sized + 'static {
    /// Entity name, the same as `entity().name`.
    const NAME: &'static str;
    /// Identifier field name, the same as `entity().id_key`.
    const ID_KEY: &'static str;

    fn entity() -> &'static EntityDef;

    /// Decode a model from a row, labels are matched against the field names.
    fn from_row(row: RowLabeled) -> Result<Self>;

    /// Persisted field values, in descriptor order.
    fn row(&self) -> Vec<(&'static str, Value)>;

    fn id(&self) -> Value;

    fn set_id(&mut self, value: Value) -> Result<()>;

    fn set_field(&mut self, name: &str, value: Value) -> Result<()>;

    /// Current value of a persisted field.
    fn get(&self, name: &str) -> Option<Value> {
        self.row()
            .into_iter()
            .find(|(v, _)| *v == name)
            .map(|(_, v)| v)
    }

    fn query<'e, E: Executor>(executor: &'e mut E) -> QueryBuilder<'e, Self, E> {
        QueryBuilder::new(executor)
    }

    fn find<E: Executor>(
        executor: &mut E,
        id: impl Into<Value>,
    ) -> impl Future<Output = Result<Option<Self>>> + Send {
        let id = id.into();
        async move {
            Self::query(executor)
                .filter(Self::entity().id_ref(), Comparison::Equals, id)
                .first()
                .await
        }
    }

    fn create_table<E: Executor>(executor: &mut E) -> impl Future<Output = Result<()>> + Send {
        executor.schema(SchemaQuery::create_entity::<Self>())
    }

    fn drop_table<E: Executor>(executor: &mut E) -> impl Future<Output = Result<()>> + Send {
        executor.schema(SchemaQuery::delete_entity::<Self>())
    }

    /// Insert the model when it is new, update it by identifier otherwise.
    ///
    /// Timestamps are stamped and a missing identifier is produced according
    /// to the id type of the entity.
    fn save<E: Executor>(&mut self, executor: &mut E) -> impl Future<Output = Result<()>> + Send {
        async move {
            let def = Self::entity();
            let now = Value::Timestamp(Some(timestamp_now()));
            if let Some(updated_at) = &def.updated_at {
                self.set_field(updated_at, now.clone())?;
            }
            let id = self.id();
            if !id.is_null() {
                let mut query = DatabaseQuery::new(def.name.clone(), Action::Update);
                query
                    .filter
                    .push(Filter::compare(def.id_ref(), Comparison::Equals, id.clone()));
                query.input = self
                    .row()
                    .into_iter()
                    .filter(|(name, _)| {
                        def.id_key != *name && def.created_at.as_deref() != Some(*name)
                    })
                    .map(|(name, value)| (Cow::Borrowed(name), value))
                    .collect();
                if !query.input.is_empty() {
                    let result = executor.execute(query).await?;
                    if result.rows_affected > 0 {
                        return Ok(());
                    }
                }
            }
            if let Some(created_at) = &def.created_at {
                if self.get(created_at).is_none_or(|v| v.is_null()) {
                    self.set_field(created_at, now)?;
                }
            }
            if id.is_null() {
                match def.id_type {
                    IdType::Generated(generate) => self.set_id(generate())?,
                    IdType::Supplied => {
                        return Err(QueryError::MissingId {
                            entity: def.name.clone(),
                        }
                        .into());
                    }
                    IdType::Autoincrement => {}
                }
            }
            let mut query = DatabaseQuery::new(def.name.clone(), Action::Insert);
            query.input = self
                .row()
                .into_iter()
                .filter(|(name, value)| {
                    !value.is_null()
                        || (def.id_key != *name
                            && def.field(name).is_none_or(|v| v.default.is_none()))
                })
                .map(|(name, value)| (Cow::Borrowed(name), value))
                .collect();
            let result = executor.execute(query).await?;
            if def.id_type == IdType::Autoincrement && self.id().is_null() {
                if let Some(id) = result.last_affected_id {
                    self.set_id(Value::Int64(Some(id)))?;
                }
            }
            Ok(())
        }
    }

    /// Delete the model, only marking it when the entity has a soft delete field.
    fn delete<E: Executor>(&mut self, executor: &mut E) -> impl Future<Output = Result<()>> + Send {
        async move {
            let def = Self::entity();
            let Some(deleted_at) = &def.deleted_at else {
                return self.force_delete(executor).await;
            };
            let now = Value::Timestamp(Some(timestamp_now()));
            let query = self.update_by_id(vec![(deleted_at.clone(), now.clone())])?;
            expect_one(executor.execute(query).await?, "deleted")?;
            self.set_field(deleted_at, now)
        }
    }

    fn force_delete<E: Executor>(&self, executor: &mut E) -> impl Future<Output = Result<()>> + Send {
        async move {
            let def = Self::entity();
            let id = self.id();
            if id.is_null() {
                return Err(QueryError::MissingId {
                    entity: def.name.clone(),
                }
                .into());
            }
            let mut query = DatabaseQuery::new(def.name.clone(), Action::Delete);
            query
                .filter
                .push(Filter::compare(def.id_ref(), Comparison::Equals, id));
            expect_one(executor.execute(query).await?, "deleted")
        }
    }

    /// Clear the soft delete mark.
    fn restore<E: Executor>(&mut self, executor: &mut E) -> impl Future<Output = Result<()>> + Send {
        async move {
            let def = Self::entity();
            let Some(deleted_at) = &def.deleted_at else {
                return Err(QueryError::InvalidEntity {
                    entity: def.name.clone(),
                    reason: "it has no soft delete field to restore".into(),
                }
                .into());
            };
            let null = Value::Timestamp(None);
            let query = self.update_by_id(vec![(deleted_at.clone(), null.clone())])?;
            expect_one(executor.execute(query).await?, "restored")?;
            self.set_field(deleted_at, null)
        }
    }

    #[doc(hidden)]
    fn update_by_id(&self, input: Vec<(Cow<'static, str>, Value)>) -> Result<DatabaseQuery> {
        let def = Self::entity();
        let id = self.id();
        if id.is_null() {
            return Err(QueryError::MissingId {
                entity: def.name.clone(),
            }
            .into());
        }
        let mut query = DatabaseQuery::new(def.name.clone(), Action::Update);
        query
            .filter
            .push(Filter::compare(def.id_ref(), Comparison::Equals, id));
        query.input = input;
        Ok(query)
    }
}

fn expect_one(result: RowsAffected, action: &str) -> Result<()> {
    if result.rows_affected == 1 {
        return Ok(());
    }
    let error = Error::msg(format!(
        "The query {} {} rows instead of the expected 1",
        action, result.rows_affected
    ));
    log::log!(
        if result.rows_affected == 0 {
            Level::Info
        } else {
            Level::Error
        },
        "{}",
        error
    );
    Err(error)
}
