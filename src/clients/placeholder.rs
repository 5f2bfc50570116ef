use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{PostId, UserId};
use crate::models::{Comment, NewPost, Post, PostPatch, PostReplace, Todo, User};

pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

/// Failures talking to the upstream REST source.
///
/// Messages never carry the request URL.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("resource not found upstream")]
    NotFound,

    #[error("upstream responded with status {0}")]
    Status(StatusCode),

    #[error("upstream request timed out")]
    Timeout,

    #[error("upstream request failed: {0}")]
    Transport(String),

    #[error("invalid upstream response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Client for the fake-data REST source (users, todos, posts, comments).
///
/// Has no caching awareness; every call goes over the wire.
#[derive(Clone)]
pub struct PlaceholderClient {
    client: Client,
    base_url: String,
}

impl PlaceholderClient {
    /// Creates a client that shares an already configured HTTP client
    /// (timeouts, pooling, user agent).
    #[must_use]
    pub fn with_shared_client(base_url: &str, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self::with_shared_client(base_url, Client::new())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(
        &self,
        method: &'static str,
        request: RequestBuilder,
    ) -> Result<reqwest::Response, UpstreamError> {
        let response = request.send().await.map_err(|e| {
            metrics::counter!("upstream_requests_total", "method" => method, "status" => "error")
                .increment(1);
            let err = UpstreamError::from(e);
            warn!(method, error = %err, "Upstream request failed");
            err
        })?;

        let status = response.status();
        metrics::counter!(
            "upstream_requests_total",
            "method" => method,
            "status" => status.as_u16().to_string()
        )
        .increment(1);

        if status == StatusCode::NOT_FOUND {
            return Err(UpstreamError::NotFound);
        }

        if !status.is_success() {
            warn!(method, status = status.as_u16(), "Upstream returned an error status");
            return Err(UpstreamError::Status(status));
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, UpstreamError> {
        response.json::<T>().await.map_err(UpstreamError::from)
    }

    /// `GET` a listing. Query parameters may be part of `path`.
    pub async fn fetch_collection<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Vec<T>, UpstreamError> {
        debug!(path, "Fetching upstream collection");
        let response = self.send("GET", self.client.get(self.url(path))).await?;
        Self::decode(response).await
    }

    /// `GET` a single resource. A 404 maps to [`UpstreamError::NotFound`].
    pub async fn fetch_one<T: DeserializeOwned>(&self, path: &str) -> Result<T, UpstreamError> {
        debug!(path, "Fetching upstream resource");
        let response = self.send("GET", self.client.get(self.url(path))).await?;
        Self::decode(response).await
    }

    pub async fn create<P, T>(&self, path: &str, payload: &P) -> Result<T, UpstreamError>
    where
        P: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .send("POST", self.client.post(self.url(path)).json(payload))
            .await?;
        Self::decode(response).await
    }

    pub async fn replace<P, T>(&self, path: &str, payload: &P) -> Result<T, UpstreamError>
    where
        P: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .send("PUT", self.client.put(self.url(path)).json(payload))
            .await?;
        Self::decode(response).await
    }

    pub async fn patch<P, T>(&self, path: &str, payload: &P) -> Result<T, UpstreamError>
    where
        P: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .send("PATCH", self.client.patch(self.url(path)).json(payload))
            .await?;
        Self::decode(response).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), UpstreamError> {
        self.send("DELETE", self.client.delete(self.url(path))).await?;
        Ok(())
    }

    pub async fn todos(&self) -> Result<Vec<Todo>, UpstreamError> {
        self.fetch_collection("/todos").await
    }

    pub async fn users(&self) -> Result<Vec<User>, UpstreamError> {
        self.fetch_collection("/users").await
    }

    pub async fn user(&self, id: UserId) -> Result<User, UpstreamError> {
        self.fetch_one(&format!("/users/{id}")).await
    }

    pub async fn posts(&self) -> Result<Vec<Post>, UpstreamError> {
        self.fetch_collection("/posts").await
    }

    pub async fn posts_by_user(&self, user_id: UserId) -> Result<Vec<Post>, UpstreamError> {
        self.fetch_collection(&format!("/posts?userId={user_id}")).await
    }

    pub async fn post(&self, id: PostId) -> Result<Post, UpstreamError> {
        self.fetch_one(&format!("/posts/{id}")).await
    }

    pub async fn comments(&self) -> Result<Vec<Comment>, UpstreamError> {
        self.fetch_collection("/comments").await
    }

    pub async fn create_post(&self, payload: &NewPost) -> Result<Post, UpstreamError> {
        self.create("/posts", payload).await
    }

    pub async fn replace_post(
        &self,
        id: PostId,
        payload: &PostReplace,
    ) -> Result<Post, UpstreamError> {
        self.replace(&format!("/posts/{id}"), payload).await
    }

    pub async fn patch_post(&self, id: PostId, patch: &PostPatch) -> Result<Post, UpstreamError> {
        self.patch(&format!("/posts/{id}"), patch).await
    }

    pub async fn delete_post(&self, id: PostId) -> Result<(), UpstreamError> {
        self.delete(&format!("/posts/{id}")).await
    }
}
