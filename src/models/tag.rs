//! Tag model: a user-defined label attachable to many places.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Color assigned when a tag is created without an explicit color,
/// e.g. implicitly during import.
pub const DEFAULT_TAG_COLOR: &str = "#3B82F6";

/// How a tag's color string should be rendered.
///
/// The color column is free-form: either a hex code or an emoji literal.
/// The distinction is a format check, not a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorKind {
    Hex,
    Emoji,
}

/// Tag record from the database.
///
/// Names are unique per owner and case-sensitive: "Coffee" and "coffee"
/// are distinct tags.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Tag {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

impl Tag {
    /// Classify the color string as a hex code or an emoji literal.
    pub fn color_kind(&self) -> ColorKind {
        if is_hex_color(&self.color) {
            ColorKind::Hex
        } else {
            ColorKind::Emoji
        }
    }
}

fn is_hex_color(s: &str) -> bool {
    let Some(digits) = s.strip_prefix('#') else {
        return false;
    };
    matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
}
