use crate::{MemoryConnection, Store};
use std::{future::Future, sync::Arc};
use tokio::sync::Mutex;
use weir_core::{ConnectionProvider, Driver, GenericSqlWriter, Result};

/// Driver holding one in memory database.
///
/// Cloning the driver shares the database, every connection handed out by
/// [`MemoryDriver::connection`] sees the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryDriver {
    pub(crate) store: Arc<Mutex<Store>>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection(&self) -> MemoryConnection {
        MemoryConnection {
            driver: self.clone(),
        }
    }
}

impl Driver for MemoryDriver {
    type Connection = MemoryConnection;
    type SqlWriter = GenericSqlWriter;

    const NAME: &'static str = "memory";

    fn sql_writer(&self) -> GenericSqlWriter {
        GenericSqlWriter::new()
    }
}

impl ConnectionProvider for MemoryDriver {
    type Connection = MemoryConnection;

    fn acquire(&self) -> impl Future<Output = Result<MemoryConnection>> + Send {
        let connection = self.connection();
        async move { Ok(connection) }
    }

    async fn release(&self, connection: MemoryConnection) {
        drop(connection);
    }
}
