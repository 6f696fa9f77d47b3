use crate::{
    AsValue, Comparison, Direction, Entity, EntityDef, Error, Executor, FieldDef, FieldRef,
    IdType, Result, RowLabeled, Value,
    future::{BoxFuture, FutureExt},
};
use anyhow::Context;
use std::{borrow::Cow, collections::HashSet, marker::PhantomData, sync::LazyLock};
use time::PrimitiveDateTime;

/// A reversible change to the database.
pub trait Migration<E: Executor>: Send + Sync {
    /// Unique name, recorded once the migration is prepared.
    fn name(&self) -> Cow<'static, str>;

    fn prepare<'a>(&'a self, executor: &'a mut E) -> BoxFuture<'a, Result<()>>;

    fn revert<'a>(&'a self, executor: &'a mut E) -> BoxFuture<'a, Result<()>>;
}

/// Creates the entity `M` and drops it when reverted.
pub struct EntityMigration<M>(PhantomData<fn() -> M>);

impl<M: Entity> EntityMigration<M> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<M: Entity> Default for EntityMigration<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Entity, E: Executor> Migration<E> for EntityMigration<M> {
    fn name(&self) -> Cow<'static, str> {
        format!("create_{}", M::entity().name).into()
    }

    fn prepare<'a>(&'a self, executor: &'a mut E) -> BoxFuture<'a, Result<()>> {
        M::create_table(executor).boxed()
    }

    fn revert<'a>(&'a self, executor: &'a mut E) -> BoxFuture<'a, Result<()>> {
        M::drop_table(executor).boxed()
    }
}

/// Row of the `weir_migrations` entity, one per prepared migration.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationLog {
    pub id: Option<i64>,
    pub name: String,
    pub batch: i64,
    pub created_at: Option<PrimitiveDateTime>,
    pub updated_at: Option<PrimitiveDateTime>,
}

#[allow(non_upper_case_globals)]
impl MigrationLog {
    pub const id: FieldRef = FieldRef::new("weir_migrations", "id");
    pub const name: FieldRef = FieldRef::new("weir_migrations", "name");
    pub const batch: FieldRef = FieldRef::new("weir_migrations", "batch");

    pub fn new(name: impl Into<String>, batch: i64) -> Self {
        Self {
            id: None,
            name: name.into(),
            batch,
            created_at: None,
            updated_at: None,
        }
    }
}

static MIGRATION_LOG: LazyLock<EntityDef> = LazyLock::new(|| EntityDef {
    name: "weir_migrations".into(),
    model: "weir_migration".into(),
    id_key: "id".into(),
    id_type: IdType::Autoincrement,
    fields: vec![
        FieldDef::new("id", Value::Int64(None))
            .primary_key()
            .auto_increment(),
        FieldDef::new("name", Value::Varchar(None)).unique(),
        FieldDef::new("batch", Value::Int64(None)),
        FieldDef::new("created_at", Value::Timestamp(None)).nullable(),
        FieldDef::new("updated_at", Value::Timestamp(None)).nullable(),
    ],
    created_at: Some("created_at".into()),
    updated_at: Some("updated_at".into()),
    deleted_at: None,
});

fn column<T: AsValue>(row: &RowLabeled, name: &str) -> Result<T> {
    let value = row
        .get_column(name)
        .ok_or_else(|| Error::msg(format!("Column `{}` is missing from the row", name)))?;
    T::try_from_value(value.clone()).with_context(|| format!("While decoding column `{}`", name))
}

impl Entity for MigrationLog {
    const NAME: &'static str = "weir_migrations";
    const ID_KEY: &'static str = "id";

    fn entity() -> &'static EntityDef {
        &MIGRATION_LOG
    }

    fn from_row(row: RowLabeled) -> Result<Self> {
        Ok(Self {
            id: column(&row, "id")?,
            name: column(&row, "name")?,
            batch: column(&row, "batch")?,
            created_at: column(&row, "created_at")?,
            updated_at: column(&row, "updated_at")?,
        })
    }

    fn row(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.as_value()),
            ("name", self.name.clone().as_value()),
            ("batch", self.batch.as_value()),
            ("created_at", self.created_at.as_value()),
            ("updated_at", self.updated_at.as_value()),
        ]
    }

    fn id(&self) -> Value {
        self.id.as_value()
    }

    fn set_id(&mut self, value: Value) -> Result<()> {
        self.id = AsValue::try_from_value(value)?;
        Ok(())
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "id" => self.id = AsValue::try_from_value(value)?,
            "name" => self.name = AsValue::try_from_value(value)?,
            "batch" => self.batch = AsValue::try_from_value(value)?,
            "created_at" => self.created_at = AsValue::try_from_value(value)?,
            "updated_at" => self.updated_at = AsValue::try_from_value(value)?,
            _ => {
                return Err(Error::msg(format!(
                    "Entity `weir_migrations` has no field `{}`",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Prepares and reverts migrations in batches, recording them in `weir_migrations`.
///
/// Migrations run one at a time in the order they were added. Every call to
/// [`MigrationRunner::prepare_batch`] records the pending ones under a new
/// batch number, reverting walks the log backwards.
pub struct MigrationRunner<E: Executor> {
    migrations: Vec<Box<dyn Migration<E>>>,
}

impl<E: Executor> Default for MigrationRunner<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Executor> MigrationRunner<E> {
    pub fn new() -> Self {
        Self {
            migrations: Vec::new(),
        }
    }

    pub fn add(mut self, migration: impl Migration<E> + 'static) -> Self {
        self.migrations.push(Box::new(migration));
        self
    }

    fn find(&self, name: &str) -> Result<&dyn Migration<E>> {
        self.migrations
            .iter()
            .find(|v| v.name() == name)
            .map(|v| &**v)
            .ok_or_else(|| {
                Error::msg(format!(
                    "Migration `{}` was prepared but is not registered",
                    name
                ))
            })
    }

    /// Make sure the log entity exists.
    pub async fn prepare_metadata(&self, executor: &mut E) -> Result<()> {
        if let Err(e) = MigrationLog::query(executor).count().await {
            log::warn!(
                "Migration log is not readable, creating it: {:#}",
                e
            );
            MigrationLog::create_table(executor)
                .await
                .context("While creating the migration log")?;
            MigrationLog::query(executor)
                .count()
                .await
                .context("While reading the migration log after creating it")?;
        }
        Ok(())
    }

    /// Every recorded migration, oldest first.
    pub async fn logs(&self, executor: &mut E) -> Result<Vec<MigrationLog>> {
        self.prepare_metadata(executor).await?;
        MigrationLog::query(executor)
            .sort(MigrationLog::id, Direction::Ascending)
            .all()
            .await
    }

    /// Names of the registered migrations that were not prepared yet.
    pub async fn pending(&self, executor: &mut E) -> Result<Vec<Cow<'static, str>>> {
        let prepared: HashSet<_> = self
            .logs(executor)
            .await?
            .into_iter()
            .map(|v| v.name)
            .collect();
        Ok(self
            .migrations
            .iter()
            .map(|v| v.name())
            .filter(|v| !prepared.contains(&**v))
            .collect())
    }

    /// Prepare the pending migrations as a new batch, returns their names.
    pub async fn prepare_batch(&self, executor: &mut E) -> Result<Vec<Cow<'static, str>>> {
        let logs = self.logs(executor).await?;
        let batch = logs.iter().map(|v| v.batch).max().unwrap_or_default() + 1;
        let prepared: HashSet<_> = logs.into_iter().map(|v| v.name).collect();
        let mut result = Vec::new();
        for migration in &self.migrations {
            let name = migration.name();
            if prepared.contains(&*name) {
                continue;
            }
            log::debug!("Preparing migration `{}` (batch {})", name, batch);
            migration
                .prepare(executor)
                .await
                .with_context(|| format!("While preparing migration `{}`", name))?;
            MigrationLog::new(name.clone(), batch)
                .save(executor)
                .await
                .with_context(|| format!("While recording migration `{}`", name))?;
            result.push(name);
        }
        Ok(result)
    }

    /// Revert the migrations of the most recent batch, returns their names.
    pub async fn revert_last_batch(&self, executor: &mut E) -> Result<Vec<Cow<'static, str>>> {
        let logs = self.logs(executor).await?;
        let Some(batch) = logs.iter().map(|v| v.batch).max() else {
            return Ok(Vec::new());
        };
        let logs = logs.into_iter().filter(|v| v.batch == batch).collect();
        self.revert(executor, logs).await
    }

    /// Revert every prepared migration, returns their names.
    pub async fn revert_all(&self, executor: &mut E) -> Result<Vec<Cow<'static, str>>> {
        let logs = self.logs(executor).await?;
        self.revert(executor, logs).await
    }

    async fn revert(
        &self,
        executor: &mut E,
        mut logs: Vec<MigrationLog>,
    ) -> Result<Vec<Cow<'static, str>>> {
        logs.sort_by(|a, b| b.id.cmp(&a.id));
        let mut result = Vec::new();
        for entry in logs {
            let migration = self.find(&entry.name)?;
            log::warn!("Reverting migration `{}` (batch {})", entry.name, entry.batch);
            migration
                .revert(executor)
                .await
                .with_context(|| format!("While reverting migration `{}`", entry.name))?;
            let affected = MigrationLog::query(executor)
                .filter(MigrationLog::id, Comparison::Equals, entry.id)
                .force_delete()
                .await?;
            if affected.rows_affected != 1 {
                log::error!(
                    "Migration log of `{}` removed {} rows",
                    entry.name,
                    affected.rows_affected
                );
            }
            result.push(migration.name());
        }
        Ok(result)
    }
}
