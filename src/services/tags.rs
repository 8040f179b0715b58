//! Tag resolution service.
//!
//! Resolves a free-text tag name to the owner's tag row, creating it on
//! first use. Backed by a single-statement upsert in the store, so the
//! same name resolved concurrently always lands on one tag id.

use crate::db::{self, DbPool};
use crate::models::{Tag, DEFAULT_TAG_COLOR};
use crate::{Error, Result};

/// Service for find-or-create tag resolution.
#[derive(Clone)]
pub struct TagResolver {
    db: DbPool,
    default_color: String,
}

impl TagResolver {
    /// Create a resolver that colors new tags with the built-in default.
    pub fn new(db: DbPool) -> Self {
        Self::with_default_color(db, DEFAULT_TAG_COLOR.to_string())
    }

    /// Create a resolver with a custom color for implicitly created tags.
    pub fn with_default_color(db: DbPool, default_color: String) -> Self {
        Self { db, default_color }
    }

    /// Resolve a tag name to the owner's tag, creating it if absent.
    ///
    /// The name is trimmed of surrounding whitespace first; an empty name
    /// is rejected without touching the store. Matching is exact and
    /// case-sensitive. An existing tag keeps its color.
    pub async fn resolve(&self, user_id: &str, name: &str) -> Result<Tag> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("tag name must not be empty".to_string()));
        }

        db::find_or_create_tag(&self.db, user_id, name, &self.default_color).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_user, init_pool, initialize_schema, CreateUser};

    async fn setup() -> (DbPool, String) {
        let pool = init_pool(":memory:").await.unwrap();
        initialize_schema(&pool).await.unwrap();
        let user = create_user(&pool, CreateUser {
            email: "ada@example.com".to_string(),
            display_name: "Ada".to_string(),
        }).await.unwrap();
        (pool, user.id)
    }

    #[tokio::test]
    async fn test_resolve_trims_whitespace() {
        let (pool, user_id) = setup().await;
        let resolver = TagResolver::new(pool);

        let padded = resolver.resolve(&user_id, "  Coffee  ").await.unwrap();
        let bare = resolver.resolve(&user_id, "Coffee").await.unwrap();

        assert_eq!(padded.id, bare.id);
        assert_eq!(padded.name, "Coffee");
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let (pool, user_id) = setup().await;
        let resolver = TagResolver::new(pool);

        let result = resolver.resolve(&user_id, "   ").await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));

        assert!(crate::db::list_tags(&resolver.db, &user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_default_color_applied_to_new_tags() {
        let (pool, user_id) = setup().await;
        let resolver = TagResolver::with_default_color(pool, "☕".to_string());

        let tag = resolver.resolve(&user_id, "Coffee").await.unwrap();
        assert_eq!(tag.color, "☕");
    }
}
