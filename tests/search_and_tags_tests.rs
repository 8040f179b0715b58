//! Integration tests for filtered search and tag resolution.

use futures::future;
use tempfile::TempDir;
use waymark::db;
use waymark::models::CreatePlace;
use waymark::services::{CollectionScope, SearchFilters, SearchService, TagResolver};

async fn setup() -> (db::DbPool, String) {
    let pool = db::init_pool(":memory:").await.unwrap();
    db::initialize_schema(&pool).await.unwrap();
    let user = db::create_user(&pool, db::CreateUser {
        email: "ada@example.com".to_string(),
        display_name: "Ada".to_string(),
    })
    .await
    .unwrap();
    (pool, user.id)
}

fn place(name: &str) -> CreatePlace {
    CreatePlace {
        name: name.to_string(),
        address: "1 Main St".to_string(),
        ..Default::default()
    }
}

// ============================================================================
// Search semantics
// ============================================================================

/// Places A{x}, B{y}, C{x,y}: tag filtering is OR across the provided
/// set, and adding a text predicate narrows with AND.
#[tokio::test]
async fn tag_or_semantics_and_predicate_and_semantics() {
    let (pool, user_id) = setup().await;
    let search = SearchService::new(pool.clone());
    let resolver = TagResolver::new(pool.clone());

    let a = db::create_place(&pool, &user_id, place("Alpha")).await.unwrap();
    let b = db::create_place(&pool, &user_id, place("Beta")).await.unwrap();
    let c = db::create_place(&pool, &user_id, place("Corner Cafe")).await.unwrap();

    let x = resolver.resolve(&user_id, "x").await.unwrap();
    let y = resolver.resolve(&user_id, "y").await.unwrap();

    db::link_tag(&pool, &user_id, &a.id, &x.id).await.unwrap();
    db::link_tag(&pool, &user_id, &b.id, &y.id).await.unwrap();
    db::link_tag(&pool, &user_id, &c.id, &x.id).await.unwrap();
    db::link_tag(&pool, &user_id, &c.id, &y.id).await.unwrap();

    let by_tags = search
        .search(&user_id, &SearchFilters {
            tag_ids: vec![x.id.clone(), y.id.clone()],
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_tags.len(), 3);

    let narrowed = search
        .search(&user_id, &SearchFilters {
            text: Some("corner".to_string()),
            tag_ids: vec![x.id.clone(), y.id.clone()],
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(narrowed.len(), 1);
    assert_eq!(narrowed[0].name, "Corner Cafe");
}

/// Text matches case-insensitively across name, address, and notes.
#[tokio::test]
async fn text_matches_name_address_and_notes() {
    let (pool, user_id) = setup().await;
    let search = SearchService::new(pool.clone());

    db::create_place(&pool, &user_id, place("Espresso Bar")).await.unwrap();
    db::create_place(&pool, &user_id, CreatePlace {
        address: "12 Espresso Lane".to_string(),
        ..place("Second")
    })
    .await
    .unwrap();
    db::create_place(&pool, &user_id, CreatePlace {
        notes: Some("the espresso here is great".to_string()),
        ..place("Third")
    })
    .await
    .unwrap();
    db::create_place(&pool, &user_id, place("Unrelated")).await.unwrap();

    let found = search
        .search(&user_id, &SearchFilters {
            text: Some("ESPRESSO".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 3);
}

/// No predicates returns all of the user's places, newest first.
#[tokio::test]
async fn empty_filter_lists_everything_newest_first() {
    let (pool, user_id) = setup().await;
    let search = SearchService::new(pool.clone());

    for name in ["First", "Second", "Third"] {
        db::create_place(&pool, &user_id, place(name)).await.unwrap();
    }

    let all = search.search(&user_id, &SearchFilters::default()).await.unwrap();
    let names: Vec<&str> = all.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Third", "Second", "First"]);
}

/// Collection scoping: exact collection, and the unassigned sentinel.
#[tokio::test]
async fn collection_scope_filters_membership() {
    let (pool, user_id) = setup().await;
    let search = SearchService::new(pool.clone());

    let collection = db::create_collection(&pool, db::CreateCollection {
        user_id: user_id.clone(),
        name: "Weekend".to_string(),
        color: None,
    })
    .await
    .unwrap();

    db::create_place(&pool, &user_id, CreatePlace {
        collection_id: Some(collection.id.clone()),
        ..place("Assigned")
    })
    .await
    .unwrap();
    db::create_place(&pool, &user_id, place("Loose")).await.unwrap();

    let in_collection = search
        .search(&user_id, &SearchFilters {
            collection: Some(CollectionScope::Collection(collection.id.clone())),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(in_collection.len(), 1);
    assert_eq!(in_collection[0].name, "Assigned");

    let unassigned = search
        .search(&user_id, &SearchFilters {
            collection: Some(CollectionScope::Unassigned),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(unassigned.len(), 1);
    assert_eq!(unassigned[0].name, "Loose");
}

/// Another user's places never appear, whatever the filters.
#[tokio::test]
async fn search_never_crosses_users() {
    let (pool, user_id) = setup().await;
    let search = SearchService::new(pool.clone());
    let other = db::create_user(&pool, db::CreateUser {
        email: "bob@example.com".to_string(),
        display_name: "Bob".to_string(),
    })
    .await
    .unwrap();

    db::create_place(&pool, &other.id, place("Bob's Cafe")).await.unwrap();

    let found = search.search(&user_id, &SearchFilters::default()).await.unwrap();
    assert!(found.is_empty());
}

/// LIKE wildcards in the query text match literally, not as wildcards.
#[tokio::test]
async fn wildcard_input_matches_literally() {
    let (pool, user_id) = setup().await;
    let search = SearchService::new(pool.clone());

    db::create_place(&pool, &user_id, place("100% Pizza")).await.unwrap();
    db::create_place(&pool, &user_id, place("100 Pizzas")).await.unwrap();

    let found = search
        .search(&user_id, &SearchFilters {
            text: Some("100%".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "100% Pizza");
}

/// Tag hydration returns each matching place with its own tag set.
#[tokio::test]
async fn search_with_tags_hydrates_memberships() {
    let (pool, user_id) = setup().await;
    let search = SearchService::new(pool.clone());
    let resolver = TagResolver::new(pool.clone());

    let a = db::create_place(&pool, &user_id, place("Alpha")).await.unwrap();
    db::create_place(&pool, &user_id, place("Bare")).await.unwrap();
    let coffee = resolver.resolve(&user_id, "Coffee").await.unwrap();
    db::link_tag(&pool, &user_id, &a.id, &coffee.id).await.unwrap();

    let results = search
        .search_with_tags(&user_id, &SearchFilters::default())
        .await
        .unwrap();
    assert_eq!(results.len(), 2);

    let alpha = results.iter().find(|p| p.place.name == "Alpha").unwrap();
    let bare = results.iter().find(|p| p.place.name == "Bare").unwrap();
    assert_eq!(alpha.tags.len(), 1);
    assert_eq!(alpha.tags[0].name, "Coffee");
    assert!(bare.tags.is_empty());
}

// ============================================================================
// Tag resolution under concurrency
// ============================================================================

/// N concurrent resolutions of the same (user, name) agree on one tag id
/// and leave exactly one row behind. Uses a file-backed database so the
/// resolutions really race across separate connections.
#[tokio::test]
async fn concurrent_resolution_yields_one_tag() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("waymark.sqlite");
    let pool = db::init_pool(path.to_str().unwrap()).await.unwrap();
    db::initialize_schema(&pool).await.unwrap();

    let user = db::create_user(&pool, db::CreateUser {
        email: "ada@example.com".to_string(),
        display_name: "Ada".to_string(),
    })
    .await
    .unwrap();

    let resolver = TagResolver::new(pool.clone());
    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let resolver = resolver.clone();
            let user_id = user.id.clone();
            tokio::spawn(async move { resolver.resolve(&user_id, "Coffee").await })
        })
        .collect();

    let ids: Vec<String> = future::join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap().id)
        .collect();

    assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(db::list_tags(&pool, &user.id).await.unwrap().len(), 1);
}
