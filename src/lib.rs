//! Weir: a driver agnostic ORM.
//!
//! Models derive [`Entity`], queries are built with [`QueryBuilder`] and
//! executed by any [`Executor`]. Drivers live in their own crates
//! (`weir-memory`, `weir-sqlite`).
//!
//! ```ignore
//! #[derive(Entity)]
//! #[weir(entity = "planets")]
//! struct Planet {
//!     id: Option<i64>,
//!     name: String,
//!     #[weir(references = Star)]
//!     star_id: Option<i64>,
//! }
//!
//! let planets = Planet::query(&mut connection)
//!     .filter(Planet::name, Comparison::HasPrefix, "M")
//!     .sort(Planet::name, Direction::Ascending)
//!     .all()
//!     .await?;
//! ```

pub use weir_core::*;
pub use weir_macros::Entity;
