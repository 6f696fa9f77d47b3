mod connection;
mod driver;
mod store;
mod transaction;

pub use connection::*;
pub use driver::*;
pub(crate) use store::Store;
pub use transaction::*;
