pub mod comment;
pub mod post;
pub mod todo;
pub mod user;

pub use comment::Comment;
pub use post::{DeleteResponse, NewPost, Post, PostPatch, PostReplace};
pub use todo::Todo;
pub use user::User;
