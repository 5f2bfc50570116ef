pub mod cache {

    pub const DEFAULT_TTL_SECONDS: u64 = 600;

    pub const TODOS_KEY: &str = "todos";

    pub const USERS_KEY: &str = "users";

    pub const POSTS_KEY: &str = "posts";

    pub const COMMENTS_KEY: &str = "comments";

    #[must_use]
    pub fn user_key(id: impl std::fmt::Display) -> String {
        format!("user:{id}")
    }

    #[must_use]
    pub fn post_key(id: impl std::fmt::Display) -> String {
        format!("post:{id}")
    }

    #[must_use]
    pub fn user_posts_key(user_id: impl std::fmt::Display) -> String {
        format!("posts:user:{user_id}")
    }

    /// Metric label for a key: the literal before the first `:`.
    #[must_use]
    pub fn key_family(key: &str) -> &str {
        key.split(':').next().unwrap_or(key)
    }
}

pub mod graphql {

    pub const PATH: &str = "/graphql";

    /// Upper bound on selection depth; the graph is cyclic (user → posts → user).
    pub const MAX_DEPTH: usize = 16;
}
