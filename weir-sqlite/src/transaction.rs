use crate::{SqliteConnection, SqliteDriver, connection::lock};
use std::future::Future;
use weir_core::{
    DatabaseQuery, Driver, Executor, QueryResult, Result, SchemaQuery, SqlWriter, Transaction,
    stream::Stream,
};

pub struct SqliteTransaction<'c> {
    connection: &'c mut SqliteConnection,
}

impl<'c> SqliteTransaction<'c> {
    pub(crate) async fn new(connection: &'c mut SqliteConnection) -> Result<Self> {
        let mut sql = String::new();
        connection
            .driver()
            .sql_writer()
            .write_transaction_begin(&mut sql);
        connection.batch(sql).await?;
        Ok(Self { connection })
    }
}

impl<'c> Executor for SqliteTransaction<'c> {
    type Driver = SqliteDriver;

    fn driver(&self) -> &SqliteDriver {
        self.connection.driver()
    }

    fn run(&mut self, query: DatabaseQuery) -> impl Stream<Item = Result<QueryResult>> + Send {
        self.connection.run(query)
    }

    fn schema(&mut self, query: SchemaQuery) -> impl Future<Output = Result<()>> + Send {
        self.connection.schema(query)
    }
}

impl<'c> Transaction<'c> for SqliteTransaction<'c> {
    async fn commit(self) -> Result<()> {
        let mut sql = String::new();
        self.driver().sql_writer().write_transaction_commit(&mut sql);
        self.connection.batch(sql).await
    }

    async fn rollback(self) -> Result<()> {
        let mut sql = String::new();
        self.driver()
            .sql_writer()
            .write_transaction_rollback(&mut sql);
        self.connection.batch(sql).await
    }
}

impl Drop for SqliteTransaction<'_> {
    fn drop(&mut self) {
        let Ok(connection) = lock(&self.connection.connection) else {
            return;
        };
        // Still open when neither commit nor rollback completed
        if connection.is_autocommit() {
            return;
        }
        let mut sql = String::new();
        self.connection
            .driver()
            .sql_writer()
            .write_transaction_rollback(&mut sql);
        log::debug!("{}", sql);
        if let Err(e) = connection.execute_batch(&sql) {
            log::error!("{:#}", e);
        }
    }
}
