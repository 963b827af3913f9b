//! Built-in functions every node advertises, and the probe that calls them.

use std::time::Duration;

use herald_core::Message;
use herald_services::Discovery;

/// Metadata key naming the namespace that answered an echo.
pub const ANSWERED_BY: &str = "answered-by";

/// Echo worker: returns the request body unchanged, tagged with the
/// answering node's namespace.
pub fn echo(namespace: String) -> impl Fn(Message) -> Message + Send + Sync + 'static {
    move |request| {
        Message::from_bytes(request.body).with_header(ANSWERED_BY, namespace.clone())
    }
}

/// Call `fqn` through discovery on a fixed interval and log the outcome.
///
/// Runs forever. Cancel by dropping the task handle.
pub async fn probe_loop(discovery: Discovery, fqn: String, timeout_secs: u64, every: Duration) {
    let mut interval = tokio::time::interval(every);
    let mut sent: u64 = 0;

    loop {
        interval.tick().await;
        sent += 1;

        let ping = Message::text(format!("probe {sent}"));
        match discovery.request(&fqn, "", ping, timeout_secs).await {
            Ok(reply) => tracing::info!(
                fqn = %fqn,
                answered_by = reply.header(ANSWERED_BY).unwrap_or("?"),
                "probe answered"
            ),
            Err(e) if e.is_timeout() => tracing::warn!(fqn = %fqn, timeout_secs, "probe timed out"),
            Err(e) => tracing::info!(fqn = %fqn, error = %e, "probe failed"),
        }
    }
}
