//! `reqwest`-backed [`Transport`] with bounded retry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tvrank_core::HttpConfig;

use crate::error::TransportError;
use crate::retry::retry_with_backoff;
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// Error bodies are kept for diagnostics but capped at this many characters.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Production transport.
///
/// Every request carries the configured timeout (overridable per request).
/// Transient failures (500/502/503/504, connect errors, timeouts) are retried
/// up to `max_retries` additional times with a linear back-off of
/// `backoff_base_ms * attempt`.
pub struct HttpClient {
    client: Client,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl HttpClient {
    /// Creates an `HttpClient` with the given timeout, `User-Agent`, and
    /// retry policy. Set `max_retries` to `0` to disable retries.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Client`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()
            .map_err(TransportError::Client)?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Builds a client from the `TVRANK_HTTP_*` settings.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::new`].
    pub fn from_config(config: &HttpConfig) -> Result<Self, TransportError> {
        Self::new(
            config.timeout_secs,
            &config.user_agent,
            config.max_retries,
            config.backoff_base_ms,
        )
    }

    async fn send_once(
        &self,
        request: &HttpRequest,
        url: &Url,
    ) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.request(request.method.clone(), url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| classify(e, &request.url))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify(e, &request.url))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                url: request.url.clone(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = Url::parse(&request.url).map_err(|e| TransportError::InvalidUrl {
            url: request.url.clone(),
            reason: e.to_string(),
        })?;

        tracing::debug!(method = %request.method, %url, "sending request");
        let request = &request;
        let url = &url;
        retry_with_backoff(self.max_retries, self.backoff_base_ms, move || {
            self.send_once(request, url)
        })
        .await
    }
}

fn classify(err: reqwest::Error, url: &str) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            url: url.to_owned(),
            source: err,
        }
    } else {
        TransportError::Network {
            url: url.to_owned(),
            source: err,
        }
    }
}
