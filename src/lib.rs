//! Waymark - saved-places organizer core.
//!
//! The two load-bearing pieces are the bulk-import pipeline, which turns a
//! semi-structured "saved places" export into normalized relational records
//! with per-row outcome reporting, and the filtered-search query builder,
//! which combines free-text, tag membership, and collection scoping into a
//! single parameterized query. Both sit on a SQLite record store shared with
//! the tag resolver's atomic find-or-create.
//!
//! The surrounding HTTP/auth/UI service is a separate consumer of this crate.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use error::{Error, Result};
