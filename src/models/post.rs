use serde::{Deserialize, Serialize};

use crate::domain::{PostId, UserId};
use crate::models::User;

/// A post record.
///
/// `user_id` is optional because a full replace (`PUT`) only echoes the
/// fields that were sent, and the replace payload carries no owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// Payload for `POST /posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub user_id: UserId,
    pub title: String,
    pub body: String,
}

/// Payload for `PUT /posts/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostReplace {
    pub title: String,
    pub body: String,
}

/// Payload for `PATCH /posts/{id}`.
///
/// Starts empty; only fields that were set end up in the serialized body.
/// Unset fields are omitted, never sent as `null`.
///
/// ```rust
/// use graphcache::models::PostPatch;
///
/// let patch = PostPatch::new().title("T");
/// assert_eq!(serde_json::to_string(&patch).unwrap(), r#"{"title":"T"}"#);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PostPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
}

impl PostPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets each field only when a value was supplied.
    #[must_use]
    pub fn from_optional(title: Option<String>, body: Option<String>) -> Self {
        let mut patch = Self::new();
        if let Some(title) = title {
            patch = patch.title(title);
        }
        if let Some(body) = body {
            patch = patch.body(body);
        }
        patch
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none()
    }
}

/// Acknowledgement returned by `deletePost`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

impl DeleteResponse {
    #[must_use]
    pub fn deleted(id: PostId) -> Self {
        Self {
            success: true,
            message: format!("Post with ID {id} has been deleted"),
        }
    }
}
