//! One-shot resolver commands. They go through the same cache as the gateway.

use anyhow::Context;

use crate::config::Config;
use crate::domain::UserId;
use crate::state::SharedState;

pub async fn cmd_todos(config: Config) -> anyhow::Result<()> {
    let shared = SharedState::new(config).await?;
    let todos = shared.graph.get_todos().await?;

    println!("{}", serde_json::to_string_pretty(&todos)?);
    Ok(())
}

pub async fn cmd_user(config: Config, id_str: &str) -> anyhow::Result<()> {
    let id: UserId = id_str
        .parse()
        .with_context(|| format!("Invalid user id '{id_str}'"))?;

    let shared = SharedState::new(config).await?;
    let user = shared.graph.get_user(id).await?;

    println!("{}", serde_json::to_string_pretty(&user)?);
    Ok(())
}
