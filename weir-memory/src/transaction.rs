use crate::{
    MemoryConnection, MemoryDriver, Store,
    connection::{execute_query, execute_schema},
};
use async_stream::try_stream;
use tokio::sync::OwnedMutexGuard;
use weir_core::{
    DatabaseQuery, Driver, Executor, QueryResult, Result, SchemaQuery, SqlWriter, Transaction,
    stream::Stream,
};

/// Transaction on a [`MemoryConnection`].
///
/// It holds the lock of the database and a copy of the tables taken when it
/// began, rolling back puts the copy back.
pub struct MemoryTransaction<'c> {
    connection: &'c mut MemoryConnection,
    store: OwnedMutexGuard<Store>,
    snapshot: Option<Store>,
}

impl<'c> MemoryTransaction<'c> {
    pub(crate) async fn new(connection: &'c mut MemoryConnection) -> Result<Self> {
        let store = connection.driver.store.clone().lock_owned().await;
        let snapshot = Some(Store::clone(&store));
        let mut sql = String::new();
        connection.driver.sql_writer().write_transaction_begin(&mut sql);
        log::debug!("{}", sql);
        Ok(Self {
            connection,
            store,
            snapshot,
        })
    }
}

impl<'c> Executor for MemoryTransaction<'c> {
    type Driver = MemoryDriver;

    fn driver(&self) -> &MemoryDriver {
        self.connection.driver()
    }

    fn run(&mut self, query: DatabaseQuery) -> impl Stream<Item = Result<QueryResult>> + Send {
        let driver = &self.connection.driver;
        let store = &mut *self.store;
        try_stream! {
            for result in execute_query(driver, store, &query)? {
                yield result;
            }
        }
    }

    async fn schema(&mut self, query: SchemaQuery) -> Result<()> {
        execute_schema(&self.connection.driver, &mut self.store, &query)
    }
}

impl<'c> Transaction<'c> for MemoryTransaction<'c> {
    async fn commit(mut self) -> Result<()> {
        let mut sql = String::new();
        self.driver().sql_writer().write_transaction_commit(&mut sql);
        log::debug!("{}", sql);
        self.snapshot = None;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        let mut sql = String::new();
        self.driver().sql_writer().write_transaction_rollback(&mut sql);
        log::debug!("{}", sql);
        Ok(())
    }
}

impl Drop for MemoryTransaction<'_> {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.store = snapshot;
        }
    }
}
