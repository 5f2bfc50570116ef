#![allow(dead_code)]

use httpmock::prelude::*;
use httpmock::Mock;
use serde_json::{Value, json};

pub fn users_json() -> Value {
    json!([
        {
            "id": 1,
            "name": "Leanne Graham",
            "username": "Bret",
            "email": "Sincere@april.biz",
            "phone": "1-770-736-8031 x56442",
            "website": "hildegard.org",
            "address": { "city": "Gwenborough" }
        },
        {
            "id": 2,
            "name": "Ervin Howell",
            "username": "Antonette",
            "email": "Shanna@melissa.tv",
            "phone": "010-692-6593 x09125",
            "website": "anastasia.net"
        }
    ])
}

pub fn todos_json() -> Value {
    json!([
        { "userId": 1, "id": 1, "title": "delectus aut autem", "completed": false },
        { "userId": 2, "id": 2, "title": "quis ut nam facilis", "completed": true },
        { "userId": 99, "id": 3, "title": "orphaned todo", "completed": false }
    ])
}

pub fn posts_json() -> Value {
    json!([
        { "userId": 1, "id": 1, "title": "sunt aut facere", "body": "quia et suscipit" },
        { "userId": 2, "id": 2, "title": "qui est esse", "body": "est rerum tempore" }
    ])
}

pub fn comments_json() -> Value {
    json!([
        {
            "postId": 1,
            "id": 1,
            "name": "id labore ex",
            "email": "Eliseo@gardner.biz",
            "body": "laudantium"
        }
    ])
}

pub async fn mock_get<'a>(server: &'a MockServer, path: &str, body: Value) -> Mock<'a> {
    let path = path.to_string();
    server
        .mock_async(|when, then| {
            when.method(GET).path(path);
            then.status(200).json_body(body);
        })
        .await
}

pub async fn mock_user(server: &MockServer, id: i64) -> Mock<'_> {
    let user = users_json()
        .as_array()
        .and_then(|users| users.iter().find(|u| u["id"] == id).cloned())
        .unwrap_or(Value::Null);
    mock_get(server, &format!("/users/{id}"), user).await
}
