use crate::{SqliteConnection, SqliteSqlWriter};
use std::borrow::Cow;
use weir_core::{Connection, Driver, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver {}

impl SqliteDriver {
    pub const fn new() -> Self {
        Self {}
    }

    /// Open a connection, see [`SqliteConnection::connect`] for the accepted urls.
    pub async fn connect(&self, url: Cow<'static, str>) -> Result<SqliteConnection> {
        SqliteConnection::connect(url).await
    }
}

impl Driver for SqliteDriver {
    type Connection = SqliteConnection;
    type SqlWriter = SqliteSqlWriter;

    const NAME: &'static str = "sqlite";

    fn sql_writer(&self) -> SqliteSqlWriter {
        SqliteSqlWriter {}
    }
}
