//! Tag database queries.
//!
//! Tag names are unique per owner (case-sensitive). The find-or-create
//! path is a single upsert statement so concurrent resolutions of the
//! same name can never create two rows.

use crate::models::{new_id, now, Tag};
use crate::{Error, Result};

use super::DbPool;

/// Input for creating a tag explicitly (as opposed to find-or-create
/// during import, where the color is defaulted).
#[derive(Debug, Clone)]
pub struct CreateTag {
    pub user_id: String,
    pub name: String,
    pub color: String,
}

/// Create a new tag. Fails with `AlreadyExists` if the owner already has
/// a tag with this exact name.
pub async fn create_tag(pool: &DbPool, input: CreateTag) -> Result<Tag> {
    sqlx::query_as::<_, Tag>(
        r#"
        INSERT INTO tags (id, user_id, name, color, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(new_id())
    .bind(&input.user_id)
    .bind(&input.name)
    .bind(&input.color)
    .bind(now())
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            Error::AlreadyExists(format!("Tag '{}' already exists", input.name))
        }
        _ => Error::Database(e),
    })
}

/// Find the owner's tag with this exact name, creating it if absent.
///
/// Insert-if-absent and the re-read of the surviving row happen in one
/// statement against the (user_id, name) unique constraint: on conflict
/// the no-op update makes RETURNING yield the existing row. Two
/// concurrent calls therefore always agree on a single tag id.
pub async fn find_or_create_tag(
    pool: &DbPool,
    user_id: &str,
    name: &str,
    color: &str,
) -> Result<Tag> {
    sqlx::query_as::<_, Tag>(
        r#"
        INSERT INTO tags (id, user_id, name, color, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (user_id, name) DO UPDATE SET name = excluded.name
        RETURNING *
        "#,
    )
    .bind(new_id())
    .bind(user_id)
    .bind(name)
    .bind(color)
    .bind(now())
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// Get a tag by ID, scoped to its owner.
pub async fn get_tag(pool: &DbPool, user_id: &str, id: &str) -> Result<Tag> {
    sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Tag not found: {}", id)))
}

/// List all of a user's tags, newest first.
pub async fn list_tags(pool: &DbPool, user_id: &str) -> Result<Vec<Tag>> {
    sqlx::query_as::<_, Tag>(
        r#"
        SELECT * FROM tags
        WHERE user_id = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

/// Delete a tag. Membership rows cascade away; places keep existing.
pub async fn delete_tag(pool: &DbPool, user_id: &str, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM tags WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Tag not found: {}", id)));
    }

    Ok(())
}
