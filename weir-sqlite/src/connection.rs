use crate::{
    SqliteDriver, SqliteTransaction,
    extract::{bind_value, extract_value},
};
use async_stream::try_stream;
use rusqlite::OpenFlags;
use std::{
    borrow::Cow,
    future::Future,
    sync::{Arc, Mutex, MutexGuard},
};
use tokio::{
    sync::mpsc::{UnboundedSender, unbounded_channel},
    task::spawn_blocking,
};
use weir_core::{
    Action, Connection, Context, DatabaseQuery, Driver, Error, Executor, QueryResult, Result,
    RowLabeled, RowsAffected, SchemaQuery, SqlWriter, Statement, Value, send_value,
    stream::Stream, truncate_long,
};

/// Connection to one SQLite database.
///
/// The handle is blocking, every statement runs on the blocking thread pool
/// while the rows are streamed back through a channel.
#[derive(Debug, Clone)]
pub struct SqliteConnection {
    pub(crate) connection: Arc<Mutex<rusqlite::Connection>>,
    pub(crate) driver: SqliteDriver,
}

impl SqliteConnection {
    /// Execute `sql` as one batch, without binds.
    pub(crate) async fn batch(&self, sql: String) -> Result<()> {
        log::debug!("{}", sql);
        let connection = self.connection.clone();
        spawn_blocking(move || -> Result<()> {
            lock(&connection)?
                .execute_batch(&sql)
                .with_context(|| format!("While executing the statement:\n{}", sql))?;
            Ok(())
        })
        .await?
        .map_err(|e| {
            log::error!("{:#}", e);
            e
        })
    }
}

pub(crate) fn lock(
    connection: &Mutex<rusqlite::Connection>,
) -> Result<MutexGuard<'_, rusqlite::Connection>> {
    connection
        .lock()
        .map_err(|e| Error::msg(format!("The sqlite connection is poisoned: {}", e)))
}

fn execute_statement(
    connection: &Mutex<rusqlite::Connection>,
    statement: &Statement,
    action: &Action,
    tx: &UnboundedSender<Result<QueryResult>>,
) -> Result<()> {
    let connection = lock(connection)?;
    let mut prepared = connection.prepare_cached(&statement.sql)?;
    for (i, value) in statement.binds.iter().enumerate() {
        prepared.raw_bind_parameter(i + 1, bind_value(value)?)?;
    }
    if !matches!(action, Action::Select | Action::Aggregate { .. }) {
        let rows_affected = prepared.raw_execute()? as u64;
        let last_affected_id = if *action == Action::Insert {
            Some(connection.last_insert_rowid())
        } else {
            None
        };
        send_value!(
            tx,
            Ok(RowsAffected {
                rows_affected,
                last_affected_id,
            }
            .into())
        );
        return Ok(());
    }
    let labels: Arc<[String]> = prepared
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    let mut rows = prepared.raw_query();
    while let Some(row) = rows.next()? {
        let values = (0..labels.len())
            .map(|i| extract_value(row.get_ref(i)?))
            .collect::<Result<Box<[Value]>>>()?;
        if tx
            .send(Ok(RowLabeled::new(labels.clone(), values).into()))
            .is_err()
        {
            // The stream was dropped
            break;
        }
    }
    Ok(())
}

impl Executor for SqliteConnection {
    type Driver = SqliteDriver;

    fn driver(&self) -> &SqliteDriver {
        &self.driver
    }

    fn run(&mut self, query: DatabaseQuery) -> impl Stream<Item = Result<QueryResult>> + Send {
        let connection = self.connection.clone();
        let writer = self.driver.sql_writer();
        try_stream! {
            let statement = writer.write_query(&query).map_err(|e| {
                log::error!("{:#}", e);
                e
            })?;
            log::debug!("{}", statement);
            let context = format!("While executing the query:\n{}", statement);
            let (tx, mut rx) = unbounded_channel();
            let action = query.action;
            let task = spawn_blocking(move || {
                if let Err(e) = execute_statement(&connection, &statement, &action, &tx) {
                    send_value!(tx, Err(e));
                }
            });
            while let Some(result) = rx.recv().await {
                yield result.context(context.clone()).map_err(|e| {
                    log::error!("{:#}", e);
                    e
                })?;
            }
            task.await?;
        }
    }

    async fn schema(&mut self, query: SchemaQuery) -> Result<()> {
        let statements = self.driver.sql_writer().write_schema(&query).map_err(|e| {
            log::error!("{:#}", e);
            e
        })?;
        let connection = self.connection.clone();
        spawn_blocking(move || -> Result<()> {
            let connection = lock(&connection)?;
            for statement in &statements {
                log::debug!("{}", truncate_long!(statement));
                connection
                    .execute_batch(statement)
                    .with_context(|| format!("While executing the statement:\n{}", statement))?;
            }
            Ok(())
        })
        .await?
        .map_err(|e| {
            log::error!("{:#}", e);
            e
        })
    }
}

/// How a database file is opened, from the `mode` url parameter.
fn open_flags(mode: &str) -> Result<OpenFlags> {
    let flags = match mode {
        "ro" => OpenFlags::SQLITE_OPEN_READ_ONLY,
        "rw" => OpenFlags::SQLITE_OPEN_READ_WRITE,
        "rwc" => OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        _ => {
            return Err(Error::msg(format!(
                "Unknown sqlite mode `{}`, expected one of `ro`, `rw`, `rwc`",
                mode
            )));
        }
    };
    Ok(flags | OpenFlags::SQLITE_OPEN_NO_MUTEX)
}

impl Connection for SqliteConnection {
    type Transaction<'c> = SqliteTransaction<'c>;

    /// Opens `sqlite://<path>[?mode=ro|rw|rwc]` or the private in memory database `sqlite::memory:`.
    ///
    /// The default mode is `rwc`, creating the file when missing.
    fn connect(url: Cow<'static, str>) -> impl Future<Output = Result<Self>> + Send {
        async move {
            let context = || format!("While opening the sqlite database `{}`", url);
            let connection = if url == "sqlite::memory:" {
                rusqlite::Connection::open_in_memory().with_context(context)?
            } else {
                let prefix = format!("{}://", SqliteDriver::NAME);
                let Some(location) = url.strip_prefix(&prefix) else {
                    let error = Error::msg(format!(
                        "Expected sqlite connection url to start with `{}` or be `sqlite::memory:`, found `{}`",
                        prefix, url
                    ));
                    log::error!("{:#}", error);
                    return Err(error);
                };
                let (path, parameters) = location.split_once('?').unwrap_or((location, ""));
                let mut flags = open_flags("rwc")?;
                for parameter in parameters.split('&').filter(|v| !v.is_empty()) {
                    match parameter.split_once('=') {
                        Some(("mode", mode)) => flags = open_flags(mode).with_context(context)?,
                        _ => {
                            let error = Error::msg(format!(
                                "Unknown sqlite url parameter `{}`",
                                parameter
                            ))
                            .context(context());
                            log::error!("{:#}", error);
                            return Err(error);
                        }
                    }
                }
                let path = path.to_string();
                spawn_blocking(move || rusqlite::Connection::open_with_flags(path, flags))
                    .await?
                    .with_context(context)?
            };
            Ok(Self {
                connection: Arc::new(Mutex::new(connection)),
                driver: SqliteDriver::new(),
            })
        }
    }

    /// Clones of this connection share its handle, their statements run inside the transaction too.
    async fn begin(&mut self) -> Result<SqliteTransaction<'_>> {
        SqliteTransaction::new(self).await
    }
}
