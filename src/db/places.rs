//! Place database queries.
//!
//! Every operation is scoped to the owning user; linking and
//! collection-moves verify both endpoints belong to that user before
//! writing, so cross-user references cannot be created through this
//! module.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::models::{new_id, now, CreatePlace, Place, PlaceWithTags, Tag};
use crate::{Error, Result};

use super::DbPool;

/// Create a new place.
pub async fn create_place(pool: &DbPool, user_id: &str, input: CreatePlace) -> Result<Place> {
    if input.name.trim().is_empty() {
        return Err(Error::InvalidInput("place name must not be empty".to_string()));
    }
    if let Some(collection_id) = input.collection_id.as_deref() {
        ensure_collection_owned(pool, user_id, collection_id).await?;
    }

    let timestamp = now();
    sqlx::query_as::<_, Place>(
        r#"
        INSERT INTO places (
            id, user_id, name, address, latitude, longitude,
            external_place_id, url, notes, rating, collection_id,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(new_id())
    .bind(user_id)
    .bind(&input.name)
    .bind(&input.address)
    .bind(input.latitude)
    .bind(input.longitude)
    .bind(&input.external_place_id)
    .bind(&input.url)
    .bind(&input.notes)
    .bind(input.rating)
    .bind(&input.collection_id)
    .bind(timestamp)
    .bind(timestamp)
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// Get a place by ID, scoped to its owner.
pub async fn get_place(pool: &DbPool, user_id: &str, id: &str) -> Result<Place> {
    sqlx::query_as::<_, Place>("SELECT * FROM places WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Place not found: {}", id)))
}

/// Get a place together with its tag set.
pub async fn get_place_with_tags(pool: &DbPool, user_id: &str, id: &str) -> Result<PlaceWithTags> {
    let place = get_place(pool, user_id, id).await?;
    let tags = sqlx::query_as::<_, Tag>(
        r#"
        SELECT t.* FROM tags t
        INNER JOIN place_tags pt ON pt.tag_id = t.id
        WHERE pt.place_id = ?
        ORDER BY t.name ASC
        "#,
    )
    .bind(&place.id)
    .fetch_all(pool)
    .await?;

    Ok(PlaceWithTags { place, tags })
}

/// List all of a user's places, newest first.
pub async fn list_places(pool: &DbPool, user_id: &str) -> Result<Vec<Place>> {
    sqlx::query_as::<_, Place>(
        r#"
        SELECT * FROM places
        WHERE user_id = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

/// Attach a tag to a place. Idempotent: re-linking an existing pair is a
/// no-op. Both the place and the tag must belong to the user.
pub async fn link_tag(pool: &DbPool, user_id: &str, place_id: &str, tag_id: &str) -> Result<()> {
    ensure_place_owned(pool, user_id, place_id).await?;
    ensure_tag_owned(pool, user_id, tag_id).await?;

    sqlx::query("INSERT OR IGNORE INTO place_tags (place_id, tag_id) VALUES (?, ?)")
        .bind(place_id)
        .bind(tag_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Detach a tag from a place. Returns whether a membership row existed.
pub async fn unlink_tag(
    pool: &DbPool,
    user_id: &str,
    place_id: &str,
    tag_id: &str,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM place_tags
        WHERE place_id = ? AND tag_id = ?
          AND place_id IN (SELECT id FROM places WHERE user_id = ?)
        "#,
    )
    .bind(place_id)
    .bind(tag_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Move a place into a collection, or unassign it with `None`.
/// The target collection must belong to the same user.
pub async fn move_to_collection(
    pool: &DbPool,
    user_id: &str,
    place_id: &str,
    collection_id: Option<&str>,
) -> Result<Place> {
    if let Some(collection_id) = collection_id {
        ensure_collection_owned(pool, user_id, collection_id).await?;
    }

    sqlx::query_as::<_, Place>(
        r#"
        UPDATE places
        SET collection_id = ?, updated_at = ?
        WHERE id = ? AND user_id = ?
        RETURNING *
        "#,
    )
    .bind(collection_id)
    .bind(now())
    .bind(place_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Place not found: {}", place_id)))
}

/// Delete a single place. Membership rows cascade away.
pub async fn delete_place(pool: &DbPool, user_id: &str, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM places WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Place not found: {}", id)));
    }

    Ok(())
}

/// Delete all of a user's places, returning how many were removed.
pub async fn delete_all_places(pool: &DbPool, user_id: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM places WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Count a user's places.
pub async fn count_places(pool: &DbPool, user_id: &str) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM places WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

#[derive(Debug, FromRow)]
struct PlaceTagRow {
    place_id: String,
    tag_id: String,
    user_id: String,
    name: String,
    color: String,
    created_at: DateTime<Utc>,
}

/// Fetch the tag sets for a batch of places in one query, grouped by
/// place id. Places with no tags are absent from the map.
pub async fn list_tags_for_places(
    pool: &DbPool,
    place_ids: &[String],
) -> Result<HashMap<String, Vec<Tag>>> {
    if place_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders = vec!["?"; place_ids.len()].join(", ");
    let sql = format!(
        r#"
        SELECT pt.place_id, t.id AS tag_id, t.user_id, t.name, t.color, t.created_at
        FROM place_tags pt
        INNER JOIN tags t ON t.id = pt.tag_id
        WHERE pt.place_id IN ({})
        ORDER BY t.name ASC
        "#,
        placeholders
    );

    let mut query = sqlx::query_as::<_, PlaceTagRow>(&sql);
    for place_id in place_ids {
        query = query.bind(place_id);
    }

    let rows = query.fetch_all(pool).await?;

    let mut grouped: HashMap<String, Vec<Tag>> = HashMap::new();
    for row in rows {
        grouped.entry(row.place_id).or_default().push(Tag {
            id: row.tag_id,
            user_id: row.user_id,
            name: row.name,
            color: row.color,
            created_at: row.created_at,
        });
    }

    Ok(grouped)
}

async fn ensure_place_owned(pool: &DbPool, user_id: &str, place_id: &str) -> Result<()> {
    let exists: Option<(i64,)> =
        sqlx::query_as("SELECT 1 FROM places WHERE id = ? AND user_id = ?")
            .bind(place_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    exists
        .map(|_| ())
        .ok_or_else(|| Error::NotFound(format!("Place not found: {}", place_id)))
}

async fn ensure_tag_owned(pool: &DbPool, user_id: &str, tag_id: &str) -> Result<()> {
    let exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM tags WHERE id = ? AND user_id = ?")
        .bind(tag_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    exists
        .map(|_| ())
        .ok_or_else(|| Error::NotFound(format!("Tag not found: {}", tag_id)))
}

async fn ensure_collection_owned(pool: &DbPool, user_id: &str, collection_id: &str) -> Result<()> {
    let exists: Option<(i64,)> =
        sqlx::query_as("SELECT 1 FROM collections WHERE id = ? AND user_id = ?")
            .bind(collection_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    exists
        .map(|_| ())
        .ok_or_else(|| Error::NotFound(format!("Collection not found: {}", collection_id)))
}
