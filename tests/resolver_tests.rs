mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{comments_json, mock_get, mock_user, posts_json, todos_json, users_json};
use graphcache::cache::{CacheBackend, CacheError, CacheStore, MemoryStore};
use graphcache::clients::PlaceholderClient;
use graphcache::domain::{PostId, UserId};
use graphcache::models::{Post, Todo};
use graphcache::services::{CacheAsideGraphService, CachePolicy, GraphService, ResolveError};
use httpmock::prelude::*;
use serde_json::json;

/// A store whose every operation fails.
struct FailingStore;

#[async_trait::async_trait]
impl CacheStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn set_with_expiry(&self, _key: &str, _value: &str, _ttl: u64) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    fn backend(&self) -> CacheBackend {
        CacheBackend::Redis
    }
}

fn service_with(
    server: &MockServer,
    store: Arc<dyn CacheStore>,
    policy: CachePolicy,
) -> CacheAsideGraphService {
    let upstream = Arc::new(PlaceholderClient::new(&server.base_url()));
    CacheAsideGraphService::new(upstream, store, policy)
}

fn service(server: &MockServer, store: Arc<MemoryStore>) -> CacheAsideGraphService {
    service_with(server, store, CachePolicy::default())
}

#[tokio::test]
async fn get_todos_joins_users_and_marks_orphans_null() {
    let server = MockServer::start_async().await;
    let todos_mock = mock_get(&server, "/todos", todos_json()).await;
    let users_mock = mock_get(&server, "/users", users_json()).await;

    let svc = service(&server, Arc::new(MemoryStore::new()));
    let todos = svc.get_todos().await.unwrap();

    assert_eq!(todos.len(), 3);
    assert_eq!(todos[0].user.clone().flatten().unwrap().username, "Bret");
    assert_eq!(todos[1].user.clone().flatten().unwrap().id, UserId::new(2));
    assert_eq!(todos[2].user, Some(None));

    todos_mock.assert_hits_async(1).await;
    users_mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn get_todos_is_served_from_cache_on_second_call() {
    let server = MockServer::start_async().await;
    let todos_mock = mock_get(&server, "/todos", todos_json()).await;
    let users_mock = mock_get(&server, "/users", users_json()).await;

    let store = Arc::new(MemoryStore::new());
    let svc = service(&server, store.clone());

    let first = svc.get_todos().await.unwrap();
    let second = svc.get_todos().await.unwrap();

    assert_eq!(first, second);
    todos_mock.assert_hits_async(1).await;
    users_mock.assert_hits_async(1).await;

    let raw = store.get("todos").await.unwrap().unwrap();
    let cached: Vec<Todo> = serde_json::from_str(&raw).unwrap();
    assert_eq!(cached, first);
}

#[tokio::test]
async fn get_todos_propagates_when_either_fetch_fails() {
    let server = MockServer::start_async().await;
    mock_get(&server, "/todos", todos_json()).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/users");
            then.status(500);
        })
        .await;

    let store = Arc::new(MemoryStore::new());
    let svc = service(&server, store.clone());

    let err = svc.get_todos().await.unwrap_err();
    assert!(matches!(err, ResolveError::Upstream(_)));
    assert_eq!(err.kind(), "UPSTREAM_ERROR");
    assert!(!err.to_string().contains("127.0.0.1"));

    // Failures are never cached.
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn prepopulated_key_means_zero_upstream_calls() {
    let server = MockServer::start_async().await;
    let users_mock = mock_get(&server, "/users", users_json()).await;

    let store = Arc::new(MemoryStore::new());
    store
        .set_with_expiry("users", &users_json().to_string(), 600)
        .await
        .unwrap();

    let svc = service(&server, store);
    let users = svc.get_all_users().await.unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users_mock.hits_async().await, 0);
}

#[tokio::test]
async fn get_user_caches_under_keyed_entry_with_ttl() {
    let server = MockServer::start_async().await;
    let user_mock = mock_user(&server, 1).await;

    let store = Arc::new(MemoryStore::new());
    let svc = service(&server, store.clone());

    let user = svc.get_user(UserId::new(1)).await.unwrap();
    assert_eq!(user.name, "Leanne Graham");

    let entry = store.entry("user:1").await.unwrap();
    let remaining = entry.expires_at - tokio::time::Instant::now();
    assert!(remaining <= Duration::from_secs(600));
    assert!(remaining > Duration::from_secs(590));

    svc.get_user(UserId::new(1)).await.unwrap();
    user_mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn get_user_missing_is_not_found_and_not_cached() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/users/42");
            then.status(404).json_body(json!({}));
        })
        .await;

    let store = Arc::new(MemoryStore::new());
    let svc = service(&server, store.clone());

    let err = svc.get_user(UserId::new(42)).await.unwrap_err();
    assert!(matches!(err, ResolveError::NotFound { resource: "User", .. }));
    assert_eq!(err.kind(), "NOT_FOUND");
    assert!(store.get("user:42").await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_misses_both_resolve_and_leave_one_entry() {
    let server = MockServer::start_async().await;
    let user_mock = mock_user(&server, 1).await;

    let store = Arc::new(MemoryStore::new());
    let svc = service(&server, store.clone());

    let (a, b) = tokio::join!(svc.get_user(UserId::new(1)), svc.get_user(UserId::new(1)));
    assert_eq!(a.unwrap(), b.unwrap());

    let hits = user_mock.hits_async().await;
    assert!((1..=2).contains(&hits));
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn entries_expire_after_ttl() {
    let server = MockServer::start_async().await;
    let posts_mock = mock_get(&server, "/posts", posts_json()).await;

    let store = Arc::new(MemoryStore::new());
    let policy = CachePolicy {
        ttl_seconds: 1,
        cache_relationships: false,
    };
    let svc = service_with(&server, store, policy);

    svc.get_posts().await.unwrap();
    svc.get_posts().await.unwrap();
    posts_mock.assert_hits_async(1).await;

    tokio::time::sleep(Duration::from_millis(1100)).await;

    svc.get_posts().await.unwrap();
    posts_mock.assert_hits_async(2).await;
}

#[tokio::test]
async fn failing_store_degrades_to_uncached_reads() {
    let server = MockServer::start_async().await;
    let comments_mock = mock_get(&server, "/comments", comments_json()).await;

    let svc = service_with(&server, Arc::new(FailingStore), CachePolicy::default());

    let first = svc.get_comments().await.unwrap();
    let second = svc.get_comments().await.unwrap();

    assert_eq!(first.len(), 1);
    assert_eq!(first, second);
    comments_mock.assert_hits_async(2).await;
}

#[tokio::test]
async fn undecodable_cache_entry_is_treated_as_miss() {
    let server = MockServer::start_async().await;
    let posts_mock = mock_get(&server, "/posts", posts_json()).await;

    let store = Arc::new(MemoryStore::new());
    store.set_with_expiry("posts", "not json", 600).await.unwrap();

    let svc = service(&server, store.clone());
    let posts = svc.get_posts().await.unwrap();

    assert_eq!(posts.len(), 2);
    posts_mock.assert_hits_async(1).await;
    let raw = store.get("posts").await.unwrap().unwrap();
    assert!(serde_json::from_str::<Vec<Post>>(&raw).is_ok());
}

#[tokio::test]
async fn relationship_fields_are_uncached_by_default() {
    let server = MockServer::start_async().await;
    let user_mock = mock_user(&server, 1).await;
    let by_user_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/posts").query_param("userId", "1");
            then.status(200).json_body(json!([posts_json()[0].clone()]));
        })
        .await;

    let store = Arc::new(MemoryStore::new());
    let svc = service(&server, store.clone());
    let posts: Vec<Post> = serde_json::from_value(posts_json()).unwrap();

    svc.post_user(&posts[0]).await.unwrap();
    svc.post_user(&posts[0]).await.unwrap();
    user_mock.assert_hits_async(2).await;

    let user = svc.get_user(UserId::new(1)).await.unwrap();
    let owned = svc.user_posts(&user).await.unwrap();
    assert_eq!(owned.len(), 1);
    svc.user_posts(&user).await.unwrap();
    by_user_mock.assert_hits_async(2).await;

    assert!(store.get("posts:user:1").await.unwrap().is_none());
}

#[tokio::test]
async fn relationship_fields_use_keyed_cache_when_enabled() {
    let server = MockServer::start_async().await;
    let post_mock = mock_get(&server, "/posts/1", posts_json()[0].clone()).await;

    let store = Arc::new(MemoryStore::new());
    let policy = CachePolicy {
        cache_relationships: true,
        ..CachePolicy::default()
    };
    let svc = service_with(&server, store.clone(), policy);
    let comments: Vec<graphcache::models::Comment> =
        serde_json::from_value(comments_json()).unwrap();

    let post = svc.comment_post(&comments[0]).await.unwrap();
    assert_eq!(post.id, PostId::new(1));
    svc.comment_post(&comments[0]).await.unwrap();

    post_mock.assert_hits_async(1).await;
    assert!(store.get("post:1").await.unwrap().is_some());
}

#[tokio::test]
async fn joined_todo_user_needs_no_fetch() {
    let server = MockServer::start_async().await;
    mock_get(&server, "/todos", todos_json()).await;
    mock_get(&server, "/users", users_json()).await;
    let user_mock = mock_user(&server, 1).await;
    let orphan_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/users/99");
            then.status(404);
        })
        .await;

    let svc = service(&server, Arc::new(MemoryStore::new()));
    let todos = svc.get_todos().await.unwrap();

    let user = svc.todo_user(&todos[0]).await.unwrap().unwrap();
    assert_eq!(user.id, UserId::new(1));

    // No match in the join is a null owner, not a lookup.
    assert_eq!(svc.todo_user(&todos[2]).await.unwrap(), None);

    assert_eq!(user_mock.hits_async().await, 0);
    assert_eq!(orphan_mock.hits_async().await, 0);
}

#[tokio::test]
async fn cached_orphan_todo_still_needs_no_fetch() {
    let server = MockServer::start_async().await;
    let todos_mock = mock_get(&server, "/todos", todos_json()).await;
    mock_get(&server, "/users", users_json()).await;
    let orphan_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/users/99");
            then.status(404);
        })
        .await;

    let svc = service(&server, Arc::new(MemoryStore::new()));
    svc.get_todos().await.unwrap();
    let cached = svc.get_todos().await.unwrap();

    assert_eq!(cached[2].user, Some(None));
    assert_eq!(svc.todo_user(&cached[2]).await.unwrap(), None);
    todos_mock.assert_hits_async(1).await;
    assert_eq!(orphan_mock.hits_async().await, 0);
}

#[tokio::test]
async fn unjoined_todo_fetches_its_owner() {
    let server = MockServer::start_async().await;
    let user_mock = mock_user(&server, 1).await;

    let svc = service(&server, Arc::new(MemoryStore::new()));
    let todo: Todo = serde_json::from_value(todos_json()[0].clone()).unwrap();

    let user = svc.todo_user(&todo).await.unwrap().unwrap();
    assert_eq!(user.username, "Bret");
    user_mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn create_post_sends_payload_and_leaves_cache_alone() {
    let server = MockServer::start_async().await;
    let todos_mock = mock_get(&server, "/todos", todos_json()).await;
    mock_get(&server, "/users", users_json()).await;
    let create_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/posts")
                .json_body(json!({ "userId": 1, "title": "hello", "body": "world" }));
            then.status(201)
                .json_body(json!({ "userId": 1, "id": 101, "title": "hello", "body": "world" }));
        })
        .await;

    let store = Arc::new(MemoryStore::new());
    let svc = service(&server, store.clone());

    let before = svc.get_todos().await.unwrap();
    let post = svc.create_post(UserId::new(1), "hello", "world").await.unwrap();
    let after = svc.get_todos().await.unwrap();

    assert_eq!(post.id, PostId::new(101));
    assert_eq!(post.user_id, Some(UserId::new(1)));
    assert_eq!(before, after);
    create_mock.assert_hits_async(1).await;
    todos_mock.assert_hits_async(1).await;
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn create_post_rejects_blank_fields_without_calling_upstream() {
    let server = MockServer::start_async().await;
    let create_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/posts");
            then.status(201).json_body(json!({ "id": 101 }));
        })
        .await;

    let svc = service(&server, Arc::new(MemoryStore::new()));

    let err = svc.create_post(UserId::new(1), "  ", "body").await.unwrap_err();
    assert_eq!(err.kind(), "VALIDATION_ERROR");
    assert_eq!(err.to_string(), "Validation error: title is required");

    let err = svc.update_post(PostId::new(1), "title", "").await.unwrap_err();
    assert_eq!(err.to_string(), "Validation error: body is required");

    assert_eq!(create_mock.hits_async().await, 0);
}

#[tokio::test]
async fn update_post_replaces_and_maps_missing_post() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/posts/1")
                .json_body(json!({ "title": "new", "body": "text" }));
            then.status(200)
                .json_body(json!({ "id": 1, "title": "new", "body": "text" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/posts/500");
            then.status(404);
        })
        .await;

    let svc = service(&server, Arc::new(MemoryStore::new()));

    let post = svc.update_post(PostId::new(1), "new", "text").await.unwrap();
    assert_eq!(post.title, "new");
    assert_eq!(post.user_id, None);

    let err = svc.update_post(PostId::new(500), "new", "text").await.unwrap_err();
    assert!(matches!(err, ResolveError::NotFound { resource: "Post", .. }));
}

#[tokio::test]
async fn patch_sends_only_supplied_fields() {
    let server = MockServer::start_async().await;
    let patch_mock = server
        .mock_async(|when, then| {
            when.method(PATCH).path("/posts/1").json_body(json!({ "title": "T" }));
            then.status(200).json_body(
                json!({ "userId": 1, "id": 1, "title": "T", "body": "quia et suscipit" }),
            );
        })
        .await;

    let svc = service(&server, Arc::new(MemoryStore::new()));
    let post = svc
        .update_post_using_patch(PostId::new(1), Some("T".to_string()), None)
        .await
        .unwrap();

    assert_eq!(post.title, "T");
    assert_eq!(post.body, "quia et suscipit");
    patch_mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn delete_acknowledges_even_when_upstream_has_no_post() {
    let server = MockServer::start_async().await;
    let delete_mock = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/posts/999");
            then.status(404);
        })
        .await;

    let svc = service(&server, Arc::new(MemoryStore::new()));
    let ack = svc.delete_post(PostId::new(999)).await.unwrap();

    assert!(ack.success);
    assert_eq!(ack.message, "Post with ID 999 has been deleted");
    delete_mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn delete_propagates_server_errors() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/posts/1");
            then.status(503);
        })
        .await;

    let svc = service(&server, Arc::new(MemoryStore::new()));
    let err = svc.delete_post(PostId::new(1)).await.unwrap_err();

    assert!(matches!(err, ResolveError::Upstream(_)));
}
