use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{TodoId, UserId};
use crate::models::User;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub user_id: UserId,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    /// Owner attached by the todos/users join.
    ///
    /// `None` until the join has run. `Some(None)` means the join ran and no
    /// user matched; it serializes as `null` so a cached listing keeps that
    /// distinction.
    #[serde(
        default,
        deserialize_with = "joined_user",
        skip_serializing_if = "Option::is_none"
    )]
    pub user: Option<Option<User>>,
}

impl Todo {
    #[must_use]
    pub const fn is_joined(&self) -> bool {
        self.user.is_some()
    }
}

// A present field, `null` included, marks a joined todo.
fn joined_user<'de, D>(deserializer: D) -> Result<Option<Option<User>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<User>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_todo_is_not_joined() {
        let todo: Todo =
            serde_json::from_str(r#"{"userId":1,"id":1,"title":"a","completed":true}"#).unwrap();
        assert!(!todo.is_joined());
        assert!(todo.completed);
    }

    #[test]
    fn null_owner_survives_a_cache_round_trip() {
        let todo: Todo =
            serde_json::from_str(r#"{"userId":99,"id":3,"title":"c","user":null}"#).unwrap();
        assert_eq!(todo.user, Some(None));

        let json = serde_json::to_value(&todo).unwrap();
        assert!(json["user"].is_null());
        assert!(json.as_object().unwrap().contains_key("user"));

        let again: Todo = serde_json::from_value(json).unwrap();
        assert!(again.is_joined());
    }
}
