use serde::{Deserialize, Serialize};

use crate::domain::{CommentId, PostId};
use crate::models::Post;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub name: String,
    pub email: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Post>,
}
