use std::future::Future;
use std::time::Duration;

/// Shared retry driver for the reward claimer and the turnstile poller.
///
/// `op` receives the 1-based attempt number. After a retryable failure the
/// backoff for that attempt number is awaited before the next call; a
/// non-retryable error or an exhausted budget surfaces the last error as-is.
pub async fn retry_with_backoff<T, E, F, Fut>(
    max_attempts: u32,
    backoff: impl Fn(u32) -> Duration,
    is_retryable: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts && is_retryable(&err) => {
                tokio::time::sleep(backoff(attempt)).await;
            }
            Err(err) => return Err(err),
        }
    }
}
