use anyhow::Result;
use std::time::{Duration, Instant};

/// Timeout for signal exchange operations (ms).
pub const SIGNAL_TIMEOUT_MS: u64 = 2000;

/// How long to let in-flight events land before asserting absence (ms).
pub const SETTLE_MS: u64 = 100;

/// Poll `condition` until it holds or the timeout expires.
pub async fn wait_until<F>(condition: F, timeout_ms: u64) -> Result<()>
where
    F: Fn() -> bool,
{
    let start = Instant::now();
    loop {
        if condition() {
            return Ok(());
        }
        if start.elapsed() > Duration::from_millis(timeout_ms) {
            anyhow::bail!("timeout waiting for condition");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Give the session loop a moment to process whatever is queued; used
/// before asserting that something did NOT happen.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(SETTLE_MS)).await;
}
