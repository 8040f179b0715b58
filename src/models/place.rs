//! Place model: a single saved location owned by a user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Tag;

/// A saved place record from the database.
///
/// Imported places carry sentinel coordinates (0.0/0.0) and an empty
/// address; the export format does not include structured location data
/// and the core does not geocode.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Place {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Opaque identifier embedded in a map-provider URL, when one was found.
    pub external_place_id: Option<String>,
    pub url: Option<String>,
    pub notes: Option<String>,
    /// No range is enforced here; validation is a caller concern.
    pub rating: Option<f64>,
    pub collection_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A place together with its resolved tag set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceWithTags {
    #[serde(flatten)]
    pub place: Place,
    pub tags: Vec<Tag>,
}

/// Input for creating a new place.
#[derive(Debug, Clone, Default)]
pub struct CreatePlace {
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub external_place_id: Option<String>,
    pub url: Option<String>,
    pub notes: Option<String>,
    pub rating: Option<f64>,
    pub collection_id: Option<String>,
}
