//! Connectivity check command handler

use crate::api::system::run_checks;
use crate::config::Config;
use crate::state::SharedState;

pub async fn cmd_check(config: Config) -> anyhow::Result<()> {
    let upstream_url = config.upstream.base_url.clone();
    let backend = config.cache.backend;
    let shared = SharedState::new(config).await?;

    let checks = run_checks(&shared).await;

    let mark = |ok: bool| if ok { "✓" } else { "✗" };
    println!("{} Upstream  {}", mark(checks.upstream), upstream_url);
    println!("{} Cache     {}", mark(checks.cache), backend);

    if !checks.upstream {
        anyhow::bail!("Upstream API is unreachable");
    }

    Ok(())
}
