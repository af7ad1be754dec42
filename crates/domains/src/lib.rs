//! # domains
//!
//! The central domain model and port definitions for Inkwell.
//! Nothing in this crate performs I/O; adapters implement the ports.

pub mod errors;
pub mod feed;
pub mod models;
pub mod ports;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use feed::*;
pub use models::*;
pub use ports::*;
