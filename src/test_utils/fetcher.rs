//! Scripted [`Fetcher`] for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::fetch::{FetchError, FetchFuture, Fetcher};

#[derive(Debug, Clone)]
enum Scripted {
    Body(Vec<u8>),
    Error(FetchError),
    Delayed(Duration, Vec<u8>),
}

/// Returns scripted responses per endpoint and records every call.
///
/// Endpoints without a script fail with a transport error.
#[derive(Debug, Default)]
pub struct MockFetcher {
    responses: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    /// Fetcher with no scripted endpoints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `endpoint` with `body`.
    #[must_use]
    pub fn with_json(self, endpoint: &str, body: &str) -> Self {
        self.set_json(endpoint, body);
        self
    }

    /// Fail `endpoint` with `error`.
    #[must_use]
    pub fn with_error(self, endpoint: &str, error: FetchError) -> Self {
        self.script(endpoint, Scripted::Error(error));
        self
    }

    /// Answer `endpoint` with `body` after sleeping for `delay`.
    #[must_use]
    pub fn with_delay(self, endpoint: &str, delay: Duration, body: &str) -> Self {
        self.script(endpoint, Scripted::Delayed(delay, body.as_bytes().to_vec()));
        self
    }

    /// Replace the response for `endpoint`.
    pub fn set_json(&self, endpoint: &str, body: &str) {
        self.script(endpoint, Scripted::Body(body.as_bytes().to_vec()));
    }

    fn script(&self, endpoint: &str, response: Scripted) {
        self.responses
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(endpoint.to_string(), response);
    }

    /// Every endpoint fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    /// Number of fetches so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }
}

impl Fetcher for MockFetcher {
    fn fetch<'a>(&'a self, endpoint: &'a str, _timeout: Duration) -> FetchFuture<'a> {
        self.calls.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(endpoint.to_string());
        let scripted =
            self.responses.lock().unwrap_or_else(std::sync::PoisonError::into_inner).get(endpoint).cloned();

        Box::pin(async move {
            match scripted {
                Some(Scripted::Body(body)) => Ok(body),
                Some(Scripted::Error(error)) => Err(error),
                Some(Scripted::Delayed(delay, body)) => {
                    tokio::time::sleep(delay).await;
                    Ok(body)
                }
                None => Err(FetchError::Transport {
                    endpoint: endpoint.to_string(),
                    reason: "no scripted response".to_string(),
                }),
            }
        })
    }
}
