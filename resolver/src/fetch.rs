//! HTTP capability used by the lookup adapters.
//!
//! Adapters only see the [`HttpFetch`] trait, so the transport can be
//! swapped for an in-memory double in tests. [`ReqwestFetcher`] is the
//! production implementation: a `reqwest` client with a request timeout and
//! a small number of transport-level retries.

use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;

use crate::config::ResolverConfig;
use crate::error::{ConfigError, FetchError};

/// Status and text body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }

    /// First `max` characters of the body, for error messages.
    pub fn snippet(&self, max: usize) -> String {
        self.body.trim().chars().take(max).collect()
    }
}

/// Something that can GET a URL.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get(&self, url: &Url) -> Result<HttpResponse, FetchError>;
}

/// `reqwest`-backed fetcher.
pub struct ReqwestFetcher {
    client: Client,
    timeout: Duration,
    retries: u32,
    retry_delay: Duration,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration, retries: u32, retry_delay: Duration) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("inchi-resolver/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            timeout,
            retries,
            retry_delay,
        })
    }

    pub fn from_config(config: &ResolverConfig) -> Result<Self, ConfigError> {
        Self::new(config.timeout, config.retries, config.retry_delay)
    }

    /// Single attempt
    async fn try_get(&self, url: &Url) -> Result<HttpResponse, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout.as_millis() as u64)
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    /// GET with retries on transport failures. HTTP error statuses are
    /// returned as responses, not retried.
    async fn get(&self, url: &Url) -> Result<HttpResponse, FetchError> {
        let attempts = self.retries.saturating_add(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.try_get(url).await {
                Ok(response) => return Ok(response),
                Err(FetchError::Body(e)) => return Err(FetchError::Body(e)),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| FetchError::Transport("no attempt made".to_string())))
    }
}

/// Worst-case duration of one adapter call: every transport attempt timing
/// out, the retry delays between them, and the single acid-suffix reattempt.
pub fn call_timeout(config: &ResolverConfig) -> Duration {
    let attempts = config.retries.saturating_add(1);
    let one_lookup = config
        .timeout
        .saturating_mul(attempts)
        .saturating_add(config.retry_delay.saturating_mul(config.retries));
    one_lookup.saturating_mul(2)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted in-memory fetcher.

    use super::*;
    use std::sync::Mutex;

    /// What the fake answers for a matching URL.
    #[derive(Debug, Clone)]
    pub enum Reply {
        Respond(u16, String),
        Fail(String),
        Timeout,
        Panic,
        Hang,
    }

    /// Answers by the first rule whose pattern is a substring of the
    /// requested URL; unmatched URLs get CACTUS-style 404 pages.
    #[derive(Default)]
    pub struct ScriptedFetcher {
        rules: Vec<(String, Reply)>,
        requests: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn on(mut self, pattern: &str, reply: Reply) -> Self {
            self.rules.push((pattern.to_string(), reply));
            self
        }

        pub fn ok(self, pattern: &str, body: &str) -> Self {
            self.on(pattern, Reply::Respond(200, body.to_string()))
        }

        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl HttpFetch for ScriptedFetcher {
        async fn get(&self, url: &Url) -> Result<HttpResponse, FetchError> {
            let url = url.to_string();
            self.requests.lock().unwrap().push(url.clone());

            let reply = self
                .rules
                .iter()
                .find(|(pattern, _)| url.contains(pattern.as_str()))
                .map(|(_, reply)| reply.clone())
                .unwrap_or_else(|| Reply::Respond(404, "<h1>Page not found (404)</h1>".to_string()));

            match reply {
                Reply::Respond(status, body) => Ok(HttpResponse::new(status, body)),
                Reply::Fail(msg) => Err(FetchError::Transport(msg)),
                Reply::Timeout => Err(FetchError::Timeout(5000)),
                Reply::Panic => panic!("scripted panic for {}", url),
                Reply::Hang => {
                    futures::future::pending::<()>().await;
                    unreachable!()
                }
            }
        }
    }
}
