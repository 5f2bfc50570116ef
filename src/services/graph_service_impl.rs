//! Cache-aside implementation of [`GraphService`].
//!
//! Root queries are read-through: look the key up, return on a hit, otherwise
//! compute from upstream, store the serialized result with the configured
//! expiry and return it. The store is an optimization only; any store failure
//! is logged and the query carries on as a miss.
//!
//! There is no per-key guard. Concurrent misses on one key each compute and
//! each write; the last write wins. Mutations go straight to upstream and
//! leave every cached key untouched, so cached listings can lag behind
//! writes for up to one TTL.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::clients::PlaceholderClient;
use crate::config::CacheConfig;
use crate::constants::cache::{
    COMMENTS_KEY, POSTS_KEY, TODOS_KEY, USERS_KEY, key_family, post_key, user_key, user_posts_key,
};
use crate::domain::{PostId, UserId};
use crate::models::{Comment, DeleteResponse, NewPost, Post, PostPatch, PostReplace, Todo, User};
use crate::services::graph_service::{
    GraphService, ResolveError, attach_users, require_field,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub ttl_seconds: u64,

    /// Route relationship fields through the keyed caches.
    pub cache_relationships: bool,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl_seconds: crate::constants::cache::DEFAULT_TTL_SECONDS,
            cache_relationships: false,
        }
    }
}

impl From<&CacheConfig> for CachePolicy {
    fn from(config: &CacheConfig) -> Self {
        Self {
            ttl_seconds: config.ttl_seconds,
            cache_relationships: config.cache_relationships,
        }
    }
}

pub struct CacheAsideGraphService {
    upstream: Arc<PlaceholderClient>,
    cache: Arc<dyn CacheStore>,
    policy: CachePolicy,
}

impl CacheAsideGraphService {
    #[must_use]
    pub fn new(
        upstream: Arc<PlaceholderClient>,
        cache: Arc<dyn CacheStore>,
        policy: CachePolicy,
    ) -> Self {
        Self {
            upstream,
            cache,
            policy,
        }
    }

    async fn cached_value<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.cache.get(key).await.map_err(ResolveError::from) {
            Ok(raw) => raw?,
            Err(e) => {
                metrics::counter!("cache_errors_total", "op" => "get").increment(1);
                warn!(key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    async fn store_value<T: Serialize + Sync>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize value for cache");
                return;
            }
        };

        if let Err(e) = self
            .cache
            .set_with_expiry(key, &raw, self.policy.ttl_seconds)
            .await
            .map_err(ResolveError::from)
        {
            metrics::counter!("cache_errors_total", "op" => "set").increment(1);
            warn!(key, error = %e, "Cache write failed, result not cached");
        }
    }

    /// Read-through: serve `key` from the store or compute, store and return.
    async fn read_through<T, F, Fut>(&self, key: &str, compute: F) -> Result<T, ResolveError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, ResolveError>> + Send,
    {
        let family = key_family(key).to_string();

        if let Some(value) = self.cached_value::<T>(key).await {
            metrics::counter!("cache_hits_total", "key" => family).increment(1);
            debug!(key, "Serving from cache");
            return Ok(value);
        }

        metrics::counter!("cache_misses_total", "key" => family).increment(1);
        let value = compute().await?;
        self.store_value(key, &value).await;
        debug!(key, "Serving fresh data");
        Ok(value)
    }

    async fn fetch_user(&self, id: UserId) -> Result<User, ResolveError> {
        self.upstream
            .user(id)
            .await
            .map_err(ResolveError::lookup("User", id))
    }

    async fn fetch_post(&self, id: PostId) -> Result<Post, ResolveError> {
        self.upstream
            .post(id)
            .await
            .map_err(ResolveError::lookup("Post", id))
    }

    async fn fetch_user_posts(&self, user_id: UserId) -> Result<Vec<Post>, ResolveError> {
        Ok(self.upstream.posts_by_user(user_id).await?)
    }

    async fn relationship_user(&self, user_id: UserId) -> Result<User, ResolveError> {
        if self.policy.cache_relationships {
            self.get_user(user_id).await
        } else {
            self.fetch_user(user_id).await
        }
    }
}

#[async_trait::async_trait]
impl GraphService for CacheAsideGraphService {
    async fn get_todos(&self) -> Result<Vec<Todo>, ResolveError> {
        self.read_through(TODOS_KEY, || async {
            let (todos, users) = tokio::try_join!(self.upstream.todos(), self.upstream.users())?;
            info!(todos = todos.len(), users = users.len(), "Joining todos with users");
            Ok::<_, ResolveError>(attach_users(todos, users))
        })
        .await
    }

    async fn get_all_users(&self) -> Result<Vec<User>, ResolveError> {
        self.read_through(USERS_KEY, || async {
            Ok::<_, ResolveError>(self.upstream.users().await?)
        })
        .await
    }

    async fn get_user(&self, id: UserId) -> Result<User, ResolveError> {
        self.read_through(&user_key(id), || self.fetch_user(id)).await
    }

    async fn get_posts(&self) -> Result<Vec<Post>, ResolveError> {
        self.read_through(POSTS_KEY, || async {
            Ok::<_, ResolveError>(self.upstream.posts().await?)
        })
        .await
    }

    async fn get_comments(&self) -> Result<Vec<Comment>, ResolveError> {
        self.read_through(COMMENTS_KEY, || async {
            Ok::<_, ResolveError>(self.upstream.comments().await?)
        })
        .await
    }

    async fn todo_user(&self, todo: &Todo) -> Result<Option<User>, ResolveError> {
        if todo.is_joined() {
            return Ok(todo.user.clone().flatten());
        }
        self.relationship_user(todo.user_id).await.map(Some)
    }

    async fn post_user(&self, post: &Post) -> Result<User, ResolveError> {
        if let Some(user) = &post.user {
            return Ok(user.clone());
        }
        let user_id = post.user_id.ok_or_else(|| ResolveError::NotFound {
            resource: "User",
            id: format!("for post {}", post.id),
        })?;
        self.relationship_user(user_id).await
    }

    async fn user_posts(&self, user: &User) -> Result<Vec<Post>, ResolveError> {
        if self.policy.cache_relationships {
            self.read_through(&user_posts_key(user.id), || self.fetch_user_posts(user.id))
                .await
        } else {
            self.fetch_user_posts(user.id).await
        }
    }

    async fn comment_post(&self, comment: &Comment) -> Result<Post, ResolveError> {
        if let Some(post) = &comment.post {
            return Ok(post.clone());
        }
        if self.policy.cache_relationships {
            self.read_through(&post_key(comment.post_id), || self.fetch_post(comment.post_id))
                .await
        } else {
            self.fetch_post(comment.post_id).await
        }
    }

    async fn create_post(
        &self,
        user_id: UserId,
        title: &str,
        body: &str,
    ) -> Result<Post, ResolveError> {
        require_field("title", title)?;
        require_field("body", body)?;

        let payload = NewPost {
            user_id,
            title: title.to_string(),
            body: body.to_string(),
        };
        let post = self.upstream.create_post(&payload).await?;
        info!(post_id = %post.id, user_id = %user_id, "Created post");
        Ok(post)
    }

    async fn update_post(
        &self,
        id: PostId,
        title: &str,
        body: &str,
    ) -> Result<Post, ResolveError> {
        require_field("title", title)?;
        require_field("body", body)?;

        let payload = PostReplace {
            title: title.to_string(),
            body: body.to_string(),
        };
        let post = self
            .upstream
            .replace_post(id, &payload)
            .await
            .map_err(ResolveError::lookup("Post", id))?;
        info!(post_id = %id, "Replaced post");
        Ok(post)
    }

    async fn update_post_using_patch(
        &self,
        id: PostId,
        title: Option<String>,
        body: Option<String>,
    ) -> Result<Post, ResolveError> {
        let patch = PostPatch::from_optional(title, body);
        if patch.is_empty() {
            debug!(post_id = %id, "Patching post with no fields");
        }

        let post = self
            .upstream
            .patch_post(id, &patch)
            .await
            .map_err(ResolveError::lookup("Post", id))?;
        info!(post_id = %id, "Patched post");
        Ok(post)
    }

    async fn delete_post(&self, id: PostId) -> Result<DeleteResponse, ResolveError> {
        match self.upstream.delete_post(id).await {
            Ok(()) => info!(post_id = %id, "Deleted post"),
            Err(crate::clients::UpstreamError::NotFound) => {
                debug!(post_id = %id, "Upstream had no post to delete");
            }
            Err(e) => return Err(e.into()),
        }
        Ok(DeleteResponse::deleted(id))
    }
}
