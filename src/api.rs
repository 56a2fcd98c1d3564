//! Practicum homework status API client.

use crate::error::BotError;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client as HttpClient, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};

/// Source of raw homework status payloads
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch statuses changed since `from_date` (Unix seconds).
    ///
    /// The decoded JSON is returned untouched; shape checks happen later.
    async fn fetch(&self, from_date: i64) -> Result<Value, BotError>;
}

/// HTTP client for the homework statuses endpoint
pub struct PracticumClient {
    http: HttpClient,
    endpoint: String,
    auth_header: String,
}

impl PracticumClient {
    /// Create a client for `endpoint` authorized with `token`.
    ///
    /// No timeout is applied unless `timeout` is given.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, token: &str, timeout: Option<Duration>) -> Self {
        let mut builder = HttpClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            http: builder.build().unwrap_or_else(|_| HttpClient::new()),
            endpoint: endpoint.into(),
            auth_header: format!("OAuth {token}"),
        }
    }
}

#[async_trait]
impl StatusSource for PracticumClient {
    async fn fetch(&self, from_date: i64) -> Result<Value, BotError> {
        info!(endpoint = %self.endpoint, from_date, "Requesting homework statuses");

        let response = self
            .http
            .get(&self.endpoint)
            .header(AUTHORIZATION, &self.auth_header)
            .query(&[("from_date", from_date)])
            .send()
            .await
            .map_err(|e| {
                let cause = error_chain(&e);
                error!("Status API request failed: {cause}");
                BotError::Request(cause)
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(BotError::UnexpectedStatus(status.as_u16()));
        }
        info!("Status API request succeeded");

        response
            .json::<Value>()
            .await
            .map_err(|e| BotError::InvalidJson(e.to_string()))
    }
}

/// Top-level message followed by every distinct `source()` below it.
///
/// reqwest keeps the interesting part (refused connection, DNS, TLS) in the
/// source chain, not in its own `Display`.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> PracticumClient {
        PracticumClient::new(format!("{}/homework_statuses/", server.uri()), "secret", None)
    }

    #[tokio::test]
    async fn test_fetch_sends_token_and_cursor() -> Result<(), BotError> {
        let server = MockServer::start().await;
        let body = json!({"homeworks": [], "current_date": 1000});
        Mock::given(method("GET"))
            .and(path("/homework_statuses/"))
            .and(header("Authorization", "OAuth secret"))
            .and(query_param("from_date", "500"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let value = client_for(&server).fetch(500).await?;
        assert_eq!(value, body);
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_non_200_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = client_for(&server).fetch(0).await;
        assert_eq!(result, Err(BotError::UnexpectedStatus(503)));
    }

    #[tokio::test]
    async fn test_fetch_invalid_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let result = client_for(&server).fetch(0).await;
        assert!(matches!(result, Err(BotError::InvalidJson(_))), "{result:?}");
    }

    #[tokio::test]
    async fn test_fetch_connection_failure_is_transport() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .and_then(|listener| listener.local_addr())
            .expect("ephemeral port")
            .port();
        // Listener is dropped, nothing accepts on this port any more
        let client = PracticumClient::new(format!("http://127.0.0.1:{port}/"), "secret", None);

        let err = client.fetch(0).await.expect_err("server is gone");
        assert!(matches!(err, BotError::Request(_)), "{err:?}");
        let text = err.to_string();
        assert!(text.starts_with("Ошибка запроса: "), "{text}");
        assert!(
            text.to_lowercase().contains("connection refused"),
            "cause missing: {text}"
        );
    }

    #[derive(Debug, thiserror::Error)]
    #[error("error sending request")]
    struct SendFailed(#[source] Connect);

    #[derive(Debug, thiserror::Error)]
    #[error("tcp connect error")]
    struct Connect(#[source] std::io::Error);

    #[test]
    fn test_error_chain_appends_causes() {
        let err = SendFailed(Connect(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "Connection refused",
        )));
        assert_eq!(
            error_chain(&err),
            "error sending request: tcp connect error: Connection refused"
        );
    }

    #[test]
    fn test_error_chain_skips_repeated_text() {
        #[derive(Debug, thiserror::Error)]
        #[error("tcp connect error: {0}")]
        struct Verbose(#[source] std::io::Error);

        let err = Verbose(std::io::Error::other("timed out"));
        assert_eq!(error_chain(&err), "tcp connect error: timed out");
    }
}
