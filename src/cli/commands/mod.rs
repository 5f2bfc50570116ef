mod check;
mod query;

pub use check::cmd_check;
pub use query::{cmd_todos, cmd_user};
