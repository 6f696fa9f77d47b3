use crate::{Executor, Result};
use std::future::Future;

/// Executor whose changes stay pending until [`Transaction::commit`].
///
/// Dropping a transaction without committing it rolls it back.
pub trait Transaction<'c>: Executor {
    fn commit(self) -> impl Future<Output = Result<()>> + Send;
    fn rollback(self) -> impl Future<Output = Result<()>> + Send;
}
