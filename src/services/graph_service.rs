//! Domain service behind the graph query boundary.
//!
//! The gateway calls root operations (queries and mutations) once per
//! request and relationship operations once per parent object per request,
//! handing in the parent it has already resolved.

use std::collections::HashMap;

use thiserror::Error;

use crate::cache::CacheError;
use crate::clients::UpstreamError;
use crate::domain::{PostId, UserId};
use crate::models::{Comment, DeleteResponse, Post, Todo, User};

/// Errors surfaced to the gateway.
///
/// Every variant renders a message that is safe to show to a client: no
/// upstream URLs, no backtraces.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: String },

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ResolveError {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::CacheUnavailable(_) => "CACHE_UNAVAILABLE",
            Self::Validation(_) => "VALIDATION_ERROR",
        }
    }

    /// Maps an upstream failure for a keyed lookup, keeping 404 as `NotFound`.
    pub fn lookup(
        resource: &'static str,
        id: impl ToString,
    ) -> impl FnOnce(UpstreamError) -> Self {
        let id = id.to_string();
        move |err| match err {
            UpstreamError::NotFound => Self::NotFound { resource, id },
            other => Self::from(other),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<UpstreamError> for ResolveError {
    fn from(err: UpstreamError) -> Self {
        Self::Upstream(err.to_string())
    }
}

impl From<CacheError> for ResolveError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Unavailable(msg) => Self::CacheUnavailable(msg),
        }
    }
}

#[async_trait::async_trait]
pub trait GraphService: Send + Sync {
    /// All todos, each with its owner attached. Cached under `todos`.
    async fn get_todos(&self) -> Result<Vec<Todo>, ResolveError>;

    /// All users. Cached under `users`.
    async fn get_all_users(&self) -> Result<Vec<User>, ResolveError>;

    /// One user. Cached under `user:<id>`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NotFound`] when upstream has no such user.
    async fn get_user(&self, id: UserId) -> Result<User, ResolveError>;

    /// All posts. Cached under `posts`.
    async fn get_posts(&self) -> Result<Vec<Post>, ResolveError>;

    /// All comments. Cached under `comments`.
    async fn get_comments(&self) -> Result<Vec<Comment>, ResolveError>;

    /// Owner of a todo. A joined todo answers from its embedded owner, which
    /// may be `None`; only an unjoined todo fetches.
    async fn todo_user(&self, todo: &Todo) -> Result<Option<User>, ResolveError>;

    async fn post_user(&self, post: &Post) -> Result<User, ResolveError>;

    async fn user_posts(&self, user: &User) -> Result<Vec<Post>, ResolveError>;

    async fn comment_post(&self, comment: &Comment) -> Result<Post, ResolveError>;

    async fn create_post(
        &self,
        user_id: UserId,
        title: &str,
        body: &str,
    ) -> Result<Post, ResolveError>;

    async fn update_post(
        &self,
        id: PostId,
        title: &str,
        body: &str,
    ) -> Result<Post, ResolveError>;

    /// Partial update; only the supplied fields are sent upstream.
    async fn update_post_using_patch(
        &self,
        id: PostId,
        title: Option<String>,
        body: Option<String>,
    ) -> Result<Post, ResolveError>;

    /// Always acknowledges once upstream answers, including for unknown ids.
    async fn delete_post(&self, id: PostId) -> Result<DeleteResponse, ResolveError>;
}

/// Attaches to each todo the user whose id matches its `user_id`.
///
/// A todo with no matching user gets `user: Some(None)`, which marks it as
/// joined. Pure; no I/O.
#[must_use]
pub fn attach_users(todos: Vec<Todo>, users: Vec<User>) -> Vec<Todo> {
    let by_id: HashMap<UserId, User> = users.into_iter().map(|u| (u.id, u)).collect();

    todos
        .into_iter()
        .map(|mut todo| {
            todo.user = Some(by_id.get(&todo.user_id).cloned());
            todo
        })
        .collect()
}

pub(crate) fn require_field(name: &str, value: &str) -> Result<(), ResolveError> {
    if value.trim().is_empty() {
        return Err(ResolveError::validation(format!("{name} is required")));
    }
    Ok(())
}
