use crate::{Executor, Result, Transaction, future::BoxFuture};
use std::{borrow::Cow, future::Future, marker::PhantomData};

pub trait Connection: Executor {
    type Transaction<'c>: Transaction<'c>
    where
        Self: 'c;

    /// Open a connection to the given URL.
    fn connect(url: Cow<'static, str>) -> impl Future<Output = Result<Self>> + Send;

    /// Start a transaction, the connection is borrowed until it ends.
    fn begin(&mut self) -> impl Future<Output = Result<Self::Transaction<'_>>> + Send;

    /// Run `f` in a transaction, committed when `f` succeeds and rolled back when it fails.
    fn transaction<'c, T, F>(&'c mut self, f: F) -> impl Future<Output = Result<T>> + Send
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut Self::Transaction<'c>) -> BoxFuture<'t, Result<T>> + Send,
    {
        async move {
            let mut transaction = self.begin().await?;
            match f(&mut transaction).await {
                Ok(value) => {
                    transaction.commit().await?;
                    Ok(value)
                }
                Err(e) => {
                    if let Err(rollback) = transaction.rollback().await {
                        log::error!("{:#}", rollback);
                    }
                    Err(e)
                }
            }
        }
    }
}

/// Hands out connections, one per logical operation.
pub trait ConnectionProvider: Send + Sync {
    type Connection: Connection;

    fn acquire(&self) -> impl Future<Output = Result<Self::Connection>> + Send;

    fn release(&self, connection: Self::Connection) -> impl Future<Output = ()> + Send;

    /// Acquire a connection, run `f` on it and release it, also when `f` fails.
    fn with_connection<T, F>(&self, f: F) -> impl Future<Output = Result<T>> + Send
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut Self::Connection) -> BoxFuture<'c, Result<T>> + Send,
    {
        async move {
            let mut connection = self.acquire().await?;
            let result = f(&mut connection).await;
            self.release(connection).await;
            result
        }
    }
}

/// Provider opening a fresh connection from a URL on every acquire.
pub struct UrlProvider<C: Connection> {
    url: Cow<'static, str>,
    _connection: PhantomData<fn() -> C>,
}

impl<C: Connection> UrlProvider<C> {
    pub fn new(url: impl Into<Cow<'static, str>>) -> Self {
        Self {
            url: url.into(),
            _connection: PhantomData,
        }
    }
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl<C: Connection> ConnectionProvider for UrlProvider<C> {
    type Connection = C;

    fn acquire(&self) -> impl Future<Output = Result<C>> + Send {
        C::connect(self.url.clone())
    }

    async fn release(&self, connection: C) {
        drop(connection);
    }
}
