//! # storage-adapters
//!
//! Implementations of the domain repository ports.
//!
//! - [`memory::InMemoryStore`] keeps everything in concurrent maps. Used by
//!   tests and by `storage.backend = "memory"`.
//! - [`postgres::PgStore`] (feature `db-postgres`) is the production store.

pub mod memory;
#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use memory::InMemoryStore;
#[cfg(feature = "db-postgres")]
pub use postgres::PgStore;
