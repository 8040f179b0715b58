//! Collection database queries.
//!
//! Collections group places. Deleting one unassigns its members (the
//! schema clears `places.collection_id`); it never deletes places.

use crate::models::{new_id, now, Collection, CollectionWithCount};
use crate::{Error, Result};

use super::DbPool;

/// Color assigned when a collection is created without one.
const DEFAULT_COLLECTION_COLOR: &str = "#3B82F6";

/// Input for creating a new collection.
#[derive(Debug, Clone)]
pub struct CreateCollection {
    pub user_id: String,
    pub name: String,
    pub color: Option<String>,
}

/// Create a new collection.
pub async fn create_collection(pool: &DbPool, input: CreateCollection) -> Result<Collection> {
    if input.name.trim().is_empty() {
        return Err(Error::InvalidInput("collection name must not be empty".to_string()));
    }

    sqlx::query_as::<_, Collection>(
        r#"
        INSERT INTO collections (id, user_id, name, color, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(new_id())
    .bind(&input.user_id)
    .bind(&input.name)
    .bind(input.color.as_deref().unwrap_or(DEFAULT_COLLECTION_COLOR))
    .bind(now())
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// Get a collection by ID, scoped to its owner.
pub async fn get_collection(pool: &DbPool, user_id: &str, id: &str) -> Result<Collection> {
    sqlx::query_as::<_, Collection>("SELECT * FROM collections WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Collection not found: {}", id)))
}

/// List a user's collections with their computed member counts, newest first.
pub async fn list_collections(pool: &DbPool, user_id: &str) -> Result<Vec<CollectionWithCount>> {
    sqlx::query_as::<_, CollectionWithCount>(
        r#"
        SELECT c.id, c.user_id, c.name, c.color, c.created_at, COUNT(p.id) AS place_count
        FROM collections c
        LEFT JOIN places p ON p.collection_id = c.id
        WHERE c.user_id = ?
        GROUP BY c.id
        ORDER BY c.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

/// Update a collection's name and color.
pub async fn rename_collection(
    pool: &DbPool,
    user_id: &str,
    id: &str,
    name: &str,
    color: Option<&str>,
) -> Result<Collection> {
    if name.trim().is_empty() {
        return Err(Error::InvalidInput("collection name must not be empty".to_string()));
    }

    sqlx::query_as::<_, Collection>(
        r#"
        UPDATE collections
        SET name = ?, color = ?
        WHERE id = ? AND user_id = ?
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(color.unwrap_or(DEFAULT_COLLECTION_COLOR))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Collection not found: {}", id)))
}

/// Delete a collection. Member places become unassigned, not deleted.
pub async fn delete_collection(pool: &DbPool, user_id: &str, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM collections WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Collection not found: {}", id)));
    }

    Ok(())
}

/// Count the places currently assigned to a collection.
///
/// An unknown (e.g. already deleted) collection simply counts zero.
pub async fn collection_place_count(pool: &DbPool, user_id: &str, id: &str) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM places WHERE collection_id = ? AND user_id = ?",
    )
    .bind(id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}
