//! Data models for Waymark.
//!
//! Defines the core types used throughout the system: places, tags,
//! collections, and the minimal owner record.

mod collection;
mod place;
mod tag;
mod user;

pub use collection::*;
pub use place::*;
pub use tag::*;
pub use user::*;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new UUID
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}
