//! Retry of transient Google API failures.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;

pub const MAX_RETRIES: u32 = 5;
pub const RETRY_DELAY: Duration = Duration::from_millis(600);

/// Run `op` until it succeeds, fails permanently, or `MAX_RETRIES` retries
/// have been used up.
pub async fn with_retry<T, F, Fut>(what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < MAX_RETRIES && is_transient(&e) => {
                attempt += 1;
                tracing::warn!(attempt, error = %format!("{:#}", e), "{} failed, retrying", what);
                tokio::time::sleep(RETRY_DELAY).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Client errors other than rate limiting won't go away on their own.
fn is_transient(err: &anyhow::Error) -> bool {
    let message = format!("{:#}", err);
    const PERMANENT: [&str; 6] = ["400", "401", "403", "404", "409", "410"];
    !PERMANENT.iter().any(|code| message.contains(code))
}
