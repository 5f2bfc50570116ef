//! GraphQL gateway.
//!
//! Parses incoming queries and dispatches field resolution to the
//! [`GraphService`]. Root fields are nullable: a failing root yields `null`
//! plus an error entry. Relationship fields fail on their own and leave the
//! rest of the response intact.
//!
//! Endpoints:
//! - POST /graphql - Execute queries and mutations
//! - GET /graphql - GraphiQL explorer (when enabled)

use async_graphql::{
    Context, EmptySubscription, ErrorExtensions, ID, Object, Result as GqlResult, Schema,
};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use std::str::FromStr;
use std::sync::Arc;

use super::AppState;
use crate::constants;
use crate::domain::{PostId, UserId};
use crate::models::{Comment, DeleteResponse, Post, Todo, User};
use crate::services::{GraphService, ResolveError};

pub type GraphSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

#[must_use]
pub fn build_schema(graph: Arc<dyn GraphService>) -> GraphSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(graph)
        .limit_depth(constants::graphql::MAX_DEPTH)
        .finish()
}

fn service<'a>(ctx: &Context<'a>) -> GqlResult<&'a Arc<dyn GraphService>> {
    ctx.data::<Arc<dyn GraphService>>()
}

fn parse_id<T: FromStr>(id: &ID, resource: &str) -> GqlResult<T> {
    id.parse::<T>().map_err(|_| {
        ResolveError::validation(format!(
            "{resource} id must be a non-negative integer, got '{}'",
            id.as_str()
        ))
        .extend()
    })
}

fn id_of(value: impl ToString) -> ID {
    ID(value.to_string())
}

pub struct GqlUser(User);

#[Object(name = "User")]
impl GqlUser {
    async fn id(&self) -> ID {
        id_of(self.0.id)
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn username(&self) -> &str {
        &self.0.username
    }

    async fn email(&self) -> &str {
        &self.0.email
    }

    async fn phone(&self) -> Option<&str> {
        self.0.phone.as_deref()
    }

    async fn website(&self) -> &str {
        &self.0.website
    }

    /// Posts written by this user.
    async fn post(&self, ctx: &Context<'_>) -> GqlResult<Option<Vec<GqlPost>>> {
        let posts = service(ctx)?
            .user_posts(&self.0)
            .await
            .map_err(|e| e.extend())?;
        Ok(Some(posts.into_iter().map(GqlPost).collect()))
    }
}

pub struct GqlTodo(Todo);

#[Object(name = "Todo")]
impl GqlTodo {
    async fn id(&self) -> ID {
        id_of(self.0.id)
    }

    async fn user_id(&self) -> ID {
        id_of(self.0.user_id)
    }

    async fn title(&self) -> &str {
        &self.0.title
    }

    async fn completed(&self) -> Option<bool> {
        Some(self.0.completed)
    }

    async fn user(&self, ctx: &Context<'_>) -> GqlResult<Option<GqlUser>> {
        let user = service(ctx)?
            .todo_user(&self.0)
            .await
            .map_err(|e| e.extend())?;
        Ok(user.map(GqlUser))
    }
}

pub struct GqlPost(Post);

#[Object(name = "Post")]
impl GqlPost {
    async fn user_id(&self) -> Option<ID> {
        self.0.user_id.map(id_of)
    }

    async fn id(&self) -> ID {
        id_of(self.0.id)
    }

    async fn title(&self) -> &str {
        &self.0.title
    }

    async fn body(&self) -> &str {
        &self.0.body
    }

    async fn user(&self, ctx: &Context<'_>) -> GqlResult<Option<GqlUser>> {
        let user = service(ctx)?
            .post_user(&self.0)
            .await
            .map_err(|e| e.extend())?;
        Ok(Some(GqlUser(user)))
    }
}

pub struct GqlComment(Comment);

#[Object(name = "Comments")]
impl GqlComment {
    async fn post_id(&self) -> ID {
        id_of(self.0.post_id)
    }

    async fn id(&self) -> ID {
        id_of(self.0.id)
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn email(&self) -> &str {
        &self.0.email
    }

    async fn body(&self) -> &str {
        &self.0.body
    }

    async fn post(&self, ctx: &Context<'_>) -> GqlResult<Option<GqlPost>> {
        let post = service(ctx)?
            .comment_post(&self.0)
            .await
            .map_err(|e| e.extend())?;
        Ok(Some(GqlPost(post)))
    }
}

pub struct GqlDeleteResponse(DeleteResponse);

#[Object(name = "DeleteResponse")]
impl GqlDeleteResponse {
    async fn success(&self) -> bool {
        self.0.success
    }

    async fn message(&self) -> &str {
        &self.0.message
    }
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn get_todos(&self, ctx: &Context<'_>) -> GqlResult<Option<Vec<GqlTodo>>> {
        let todos = service(ctx)?.get_todos().await.map_err(|e| e.extend())?;
        Ok(Some(todos.into_iter().map(GqlTodo).collect()))
    }

    async fn get_all_users(&self, ctx: &Context<'_>) -> GqlResult<Option<Vec<GqlUser>>> {
        let users = service(ctx)?.get_all_users().await.map_err(|e| e.extend())?;
        Ok(Some(users.into_iter().map(GqlUser).collect()))
    }

    async fn get_comments(&self, ctx: &Context<'_>) -> GqlResult<Option<Vec<GqlComment>>> {
        let comments = service(ctx)?.get_comments().await.map_err(|e| e.extend())?;
        Ok(Some(comments.into_iter().map(GqlComment).collect()))
    }

    async fn get_post(&self, ctx: &Context<'_>) -> GqlResult<Option<Vec<GqlPost>>> {
        let posts = service(ctx)?.get_posts().await.map_err(|e| e.extend())?;
        Ok(Some(posts.into_iter().map(GqlPost).collect()))
    }

    async fn get_user(&self, ctx: &Context<'_>, id: ID) -> GqlResult<Option<GqlUser>> {
        let id: UserId = parse_id(&id, "User")?;
        let user = service(ctx)?.get_user(id).await.map_err(|e| e.extend())?;
        Ok(Some(GqlUser(user)))
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_post(
        &self,
        ctx: &Context<'_>,
        user_id: ID,
        title: String,
        body: String,
    ) -> GqlResult<Option<GqlPost>> {
        let user_id: UserId = parse_id(&user_id, "User")?;
        let post = service(ctx)?
            .create_post(user_id, &title, &body)
            .await
            .map_err(|e| e.extend())?;
        Ok(Some(GqlPost(post)))
    }

    async fn update_post(
        &self,
        ctx: &Context<'_>,
        id: ID,
        title: String,
        body: String,
    ) -> GqlResult<Option<GqlPost>> {
        let id: PostId = parse_id(&id, "Post")?;
        let post = service(ctx)?
            .update_post(id, &title, &body)
            .await
            .map_err(|e| e.extend())?;
        Ok(Some(GqlPost(post)))
    }

    async fn update_post_using_patch(
        &self,
        ctx: &Context<'_>,
        id: ID,
        title: Option<String>,
        body: Option<String>,
    ) -> GqlResult<Option<GqlPost>> {
        let id: PostId = parse_id(&id, "Post")?;
        let post = service(ctx)?
            .update_post_using_patch(id, title, body)
            .await
            .map_err(|e| e.extend())?;
        Ok(Some(GqlPost(post)))
    }

    async fn delete_post(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> GqlResult<Option<GqlDeleteResponse>> {
        let id: PostId = parse_id(&id, "Post")?;
        let ack = service(ctx)?.delete_post(id).await.map_err(|e| e.extend())?;
        Ok(Some(GqlDeleteResponse(ack)))
    }
}

pub async fn graphql_handler(
    State(state): State<Arc<AppState>>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    state.schema.execute(req.into_inner()).await.into()
}

pub async fn graphiql() -> impl IntoResponse {
    Html(
        async_graphql::http::GraphiQLSource::build()
            .endpoint(constants::graphql::PATH)
            .finish(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_numeric_ids() {
        let id: UserId = parse_id(&ID::from("12"), "User").unwrap();
        assert_eq!(id, UserId::new(12));
    }

    #[test]
    fn parse_id_rejects_garbage_with_validation_code() {
        let err = parse_id::<PostId>(&ID::from("abc"), "Post").unwrap_err();
        assert!(err.message.contains("Post id must be a non-negative integer"));
        let code = err.extensions.as_ref().and_then(|ext| ext.get("code")).cloned();
        assert_eq!(code, Some(async_graphql::Value::from("VALIDATION_ERROR")));
    }
}
