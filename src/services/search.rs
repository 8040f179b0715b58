//! Filtered place search.
//!
//! Translates a filter request (free text, tag set, collection scope)
//! into one retrieval against the record store. The WHERE clause is
//! assembled from fixed fragments with every user-supplied value passed
//! as a bound parameter; no input is ever concatenated into SQL source.

use serde::{Deserialize, Serialize};

use crate::db::{self, DbPool};
use crate::models::{Place, PlaceWithTags};
use crate::{Error, Result};

/// Collection scoping for a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionScope {
    /// Only places assigned to no collection.
    Unassigned,
    /// Only places in this collection.
    Collection(String),
}

/// A search filter request. Absent or empty fields impose no filter;
/// provided predicates combine with AND.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Case-insensitive substring matched against name, address, or notes.
    pub text: Option<String>,
    /// A place matches if its tag set intersects this set (OR semantics).
    pub tag_ids: Vec<String>,
    pub collection: Option<CollectionScope>,
}

/// Generates the WHERE clause fragment for a place search.
///
/// Converts `SearchFilters` into SQL clauses plus the parameters to bind,
/// in order. An empty filter produces `TRUE`: the caller's user scope is
/// then the only predicate.
pub struct PlaceFilterQueryBuilder {
    filters: SearchFilters,
}

impl PlaceFilterQueryBuilder {
    pub fn new(filters: SearchFilters) -> Self {
        Self { filters }
    }

    /// Build the WHERE fragment and its bound parameters.
    pub fn build(&self) -> (String, Vec<String>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();

        // Free text: substring across name OR address OR notes,
        // case-insensitive, with LIKE wildcards in the input escaped so
        // they match literally.
        if let Some(text) = self.filters.text.as_deref().map(str::trim) {
            if !text.is_empty() {
                let pattern = format!("%{}%", escape_like(&text.to_lowercase()));
                clauses.push(
                    "(LOWER(p.name) LIKE ? ESCAPE '\\' \
                     OR LOWER(p.address) LIKE ? ESCAPE '\\' \
                     OR LOWER(COALESCE(p.notes, '')) LIKE ? ESCAPE '\\')"
                        .to_string(),
                );
                params.push(pattern.clone());
                params.push(pattern.clone());
                params.push(pattern);
            }
        }

        // Tag membership: one matching tag suffices.
        if !self.filters.tag_ids.is_empty() {
            let placeholders = vec!["?"; self.filters.tag_ids.len()].join(", ");
            clauses.push(format!(
                "EXISTS (SELECT 1 FROM place_tags pt WHERE pt.place_id = p.id AND pt.tag_id IN ({}))",
                placeholders
            ));
            params.extend(self.filters.tag_ids.iter().cloned());
        }

        // Collection scope, including the "unassigned" sentinel.
        match &self.filters.collection {
            Some(CollectionScope::Unassigned) => {
                clauses.push("p.collection_id IS NULL".to_string());
            }
            Some(CollectionScope::Collection(id)) => {
                clauses.push("p.collection_id = ?".to_string());
                params.push(id.clone());
            }
            None => {}
        }

        let sql = if clauses.is_empty() {
            "TRUE".to_string()
        } else {
            clauses.join(" AND ")
        };

        (sql, params)
    }
}

/// Escape LIKE wildcards so user input matches as a literal substring.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Service for filtered place search.
#[derive(Clone)]
pub struct SearchService {
    db: DbPool,
}

impl SearchService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Search a user's places, newest first.
    ///
    /// Results are always scoped to the user; an empty result set is not
    /// an error.
    pub async fn search(&self, user_id: &str, filters: &SearchFilters) -> Result<Vec<Place>> {
        let (fragment, params) = PlaceFilterQueryBuilder::new(filters.clone()).build();
        let sql = format!(
            "SELECT p.* FROM places p WHERE p.user_id = ? AND {} ORDER BY p.created_at DESC",
            fragment
        );

        let mut query = sqlx::query_as::<_, Place>(&sql);
        query = query.bind(user_id);
        for param in &params {
            query = query.bind(param);
        }

        query.fetch_all(&self.db).await.map_err(Error::Database)
    }

    /// Search and hydrate each matching place's tag set with one grouped
    /// membership query.
    pub async fn search_with_tags(
        &self,
        user_id: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<PlaceWithTags>> {
        let places = self.search(user_id, filters).await?;
        let ids: Vec<String> = places.iter().map(|p| p.id.clone()).collect();
        let mut tags_by_place = db::list_tags_for_places(&self.db, &ids).await?;

        Ok(places
            .into_iter()
            .map(|place| {
                let tags = tags_by_place.remove(&place.id).unwrap_or_default();
                PlaceWithTags { place, tags }
            })
            .collect())
    }
}
