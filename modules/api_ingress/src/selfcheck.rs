use anyhow::{bail, Result};
use std::time::Duration;
use tracing::{debug, info};

/// Poll `{base_url}/sd/health` until it answers 2xx, at most `max_attempts`
/// times with `interval` between attempts.
pub async fn ping_until_healthy(base_url: &str, max_attempts: u32, interval: Duration) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;
    let url = format!("{}/sd/health", base_url.trim_end_matches('/'));

    for attempt in 1..=max_attempts {
        match client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!(attempt, "health endpoint answered");
                return Ok(());
            }
            Ok(resp) => debug!(attempt, status = %resp.status(), "health endpoint not ready"),
            Err(e) => debug!(attempt, error = %e, "health endpoint unreachable"),
        }
        if attempt < max_attempts {
            info!("Waiting for the router, retry in {:?}", interval);
            tokio::time::sleep(interval).await;
        }
    }

    bail!("cannot connect to the router at {url} after {max_attempts} attempts")
}
