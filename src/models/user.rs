//! Minimal owner record.
//!
//! Every place, tag, and collection belongs to exactly one user. Sign-up,
//! credentials, and sessions live in the surrounding service; this record
//! exists so ownership references and user-cascade deletion are enforced
//! by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct User {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}
