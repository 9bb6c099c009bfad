//! # Error Reporting
//!
//! Sinks for `RelayError`s. Reporting is best-effort: nothing here ever fails or
//! blocks the caller.

use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::domain::error::RelayError;
use crate::domain::traits::ErrorReporter;

/// Used when no sink is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl ErrorReporter for NullReporter {
    fn capture(&self, _error: &RelayError, _context: &str) {}
}

#[derive(Debug, Serialize, PartialEq)]
struct Report {
    kind: &'static str,
    message: String,
    context: String,
    timestamp: String,
}

impl Report {
    fn new(error: &RelayError, context: &str) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
            context: context.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// POSTs each error as JSON to a webhook, on a spawned task.
#[derive(Clone)]
pub struct WebhookReporter {
    client: Client,
    url: String,
}

impl WebhookReporter {
    pub fn new(url: impl Into<String>) -> Result<Self, RelayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RelayError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client, url: url.into() })
    }
}

impl ErrorReporter for WebhookReporter {
    fn capture(&self, error: &RelayError, context: &str) {
        // capture can be called outside a runtime (e.g. from a sync test); drop the report then
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let report = Report::new(error, context);
        let client = self.client.clone();
        let url = self.url.clone();
        handle.spawn(async move {
            match client.post(&url).json(&report).send().await {
                Ok(resp) if !resp.status().is_success() => {
                    tracing::debug!(status = %resp.status(), "Error webhook rejected report");
                }
                Ok(_) => {}
                Err(e) => tracing::debug!("Error webhook unreachable: {e}"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_payload() {
        let report = Report::new(&RelayError::fetch("news", "HTTP 503"), "polling feed");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["kind"], "fetch");
        assert_eq!(json["message"], "feed fetch failed for news: HTTP 503");
        assert_eq!(json["context"], "polling feed");
        assert!(json["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_capture_without_runtime_is_noop() {
        let reporter = WebhookReporter::new("http://127.0.0.1:9/hook").unwrap();
        reporter.capture(&RelayError::Config("x".into()), "test");
    }

    #[tokio::test]
    async fn test_capture_never_fails_caller() {
        let reporter = WebhookReporter::new("http://127.0.0.1:9/hook").unwrap();
        reporter.capture(&RelayError::send("!room:x", "gone"), "test");
        NullReporter.capture(&RelayError::send("!room:x", "gone"), "test");
    }
}
