use std::time::Duration;

use backon::{ConstantBuilder, Retryable};
use serde::Deserialize;

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// The subset of Chrome's `/json/version` document we show.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DebuggerVersion {
    #[serde(rename = "Browser", default)]
    pub browser: String,
    #[serde(rename = "webSocketDebuggerUrl", default)]
    pub websocket_url: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("debugging endpoint unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),
    #[error("debugging endpoint answered with status {0}")]
    Status(reqwest::StatusCode),
}

fn version_url(port: u16) -> String {
    format!("http://127.0.0.1:{}/json/version", port)
}

fn client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(PROBE_TIMEOUT).build()
}

/// `GET /json/version` on the debugging port, expecting a 2xx answer.
pub async fn check(port: u16) -> Result<(), ProbeError> {
    let response = client()?.get(version_url(port)).send().await?;
    if response.status().is_success() {
        Ok(())
    } else {
        Err(ProbeError::Status(response.status()))
    }
}

/// Poll [`check`] up to `attempts` times, `interval` apart, returning the
/// last failure if the endpoint never answers.
pub async fn wait_until_available(
    port: u16,
    interval: Duration,
    attempts: usize,
) -> Result<(), ProbeError> {
    // backon counts retries after the first call
    (|| check(port))
        .retry(
            ConstantBuilder::default()
                .with_delay(interval)
                .with_max_times(attempts.saturating_sub(1)),
        )
        .await
}

pub async fn available(port: u16) -> bool {
    check(port).await.is_ok()
}

/// The browser's self-description, if the endpoint answers with JSON.
pub async fn version(port: u16) -> Option<DebuggerVersion> {
    let response = client().ok()?.get(version_url(port)).send().await.ok()?;
    if !response.status().is_success() {
        return None;
    }
    response.json().await.ok()
}


#[cfg(test)]
mod tests {
    use super::test_server::{closed_port, serve, serve_counted, VERSION_BODY};
    use super::*;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn answering_endpoint_is_available() {
        let (port, server) = serve(200, VERSION_BODY).await;
        assert!(available(port).await);

        let version = version(port).await.unwrap();
        assert_eq!(version.browser, "Chrome/126.0.6478.126");
        assert_eq!(
            version.websocket_url.as_deref(),
            Some("ws://127.0.0.1/devtools/browser/abc")
        );
        server.abort();
    }

    #[tokio::test]
    async fn error_status_is_not_available() {
        let (port, server) = serve(500, "{}").await;
        assert!(matches!(check(port).await, Err(ProbeError::Status(s)) if s.as_u16() == 500));
        assert_eq!(version(port).await, None);
        server.abort();
    }

    #[tokio::test]
    async fn closed_port_is_not_available() {
        assert!(!available(closed_port()).await);
    }

    #[tokio::test]
    async fn polling_makes_exactly_the_requested_attempts() {
        let (port, hits, server) = serve_counted(503).await;
        let result = wait_until_available(port, Duration::from_millis(10), 3).await;
        assert!(matches!(result, Err(ProbeError::Status(s)) if s.as_u16() == 503));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        server.abort();
    }

    #[tokio::test]
    async fn polling_stops_at_first_answer() {
        let (port, hits, server) = serve_counted(200).await;
        wait_until_available(port, Duration::from_millis(10), 10)
            .await
            .unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        server.abort();
    }
}
