use crate::{MemoryDriver, MemoryTransaction, Store};
use async_stream::try_stream;
use std::{borrow::Cow, future::Future};
use weir_core::{
    Connection, Context, DatabaseQuery, Driver, Error, Executor, QueryResult, Result,
    SchemaQuery, SqlWriter, stream::Stream, truncate_long,
};

/// Run `query` on `store`, rendering the statement for the logs first.
pub(crate) fn execute_query(
    driver: &MemoryDriver,
    store: &mut Store,
    query: &DatabaseQuery,
) -> Result<Vec<QueryResult>> {
    let statement = driver.sql_writer().write_query(query).map_err(|e| {
        log::error!("{:#}", e);
        e
    })?;
    log::debug!("{}", statement);
    store
        .execute(query)
        .with_context(|| format!("While executing the query:\n{}", statement))
        .map_err(|e| {
            log::error!("{:#}", e);
            e
        })
}

pub(crate) fn execute_schema(
    driver: &MemoryDriver,
    store: &mut Store,
    query: &SchemaQuery,
) -> Result<()> {
    let statements = driver.sql_writer().write_schema(query).map_err(|e| {
        log::error!("{:#}", e);
        e
    })?;
    for statement in &statements {
        log::debug!("{}", truncate_long!(statement));
    }
    store
        .schema(query)
        .with_context(|| format!("While changing the schema of `{}`", query.entity))
        .map_err(|e| {
            log::error!("{:#}", e);
            e
        })
}

/// Connection to the database of a [`MemoryDriver`].
///
/// Queries are interpreted directly, the SQL that a database would receive
/// is only rendered for the logs. Each query runs atomically.
#[derive(Debug, Clone)]
pub struct MemoryConnection {
    pub(crate) driver: MemoryDriver,
}

impl Executor for MemoryConnection {
    type Driver = MemoryDriver;

    fn driver(&self) -> &MemoryDriver {
        &self.driver
    }

    fn run(&mut self, query: DatabaseQuery) -> impl Stream<Item = Result<QueryResult>> + Send {
        let driver = self.driver.clone();
        try_stream! {
            let results = execute_query(&driver, &mut *driver.store.lock().await, &query)?;
            for result in results {
                yield result;
            }
        }
    }

    async fn schema(&mut self, query: SchemaQuery) -> Result<()> {
        execute_schema(&self.driver, &mut *self.driver.store.lock().await, &query)
    }
}

impl Connection for MemoryConnection {
    type Transaction<'c> = MemoryTransaction<'c>;

    /// Opens a new empty database, the url must be `memory://`.
    fn connect(url: Cow<'static, str>) -> impl Future<Output = Result<Self>> + Send {
        async move {
            let prefix = "memory://";
            if !url.starts_with(prefix) {
                let error = Error::msg(format!(
                    "Memory connection url must start with `{}`, found `{}`",
                    prefix, url
                ));
                log::error!("{:#}", error);
                return Err(error);
            }
            Ok(MemoryDriver::new().connection())
        }
    }

    /// Locks the database until the transaction ends, other connections wait for it.
    async fn begin(&mut self) -> Result<MemoryTransaction<'_>> {
        MemoryTransaction::new(self).await
    }
}
