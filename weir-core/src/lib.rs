mod as_value;
mod builder;
mod connection;
mod driver;
mod eager;
mod entity;
mod error;
mod executor;
mod field;
mod filter;
mod migration;
mod query;
mod relation;
mod row;
mod schema;
mod transaction;
mod util;
mod value;
pub mod writer;

pub use ::anyhow::Context;
pub use as_value::*;
pub use builder::*;
pub use connection::*;
pub use driver::*;
pub use eager::*;
pub use entity::*;
pub use error::*;
pub use executor::*;
pub use field::*;
pub use filter::*;
pub use migration::*;
pub use query::*;
pub use relation::*;
pub use row::*;
pub use schema::*;
pub use transaction::*;
pub use util::*;
pub use value::*;
pub use writer::{GenericSqlWriter, LimitStyle, SqlWriter, Statement};
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
