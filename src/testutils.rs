//! Test utilities for `gh_oauth_helper`.
//!
//! This module centralises the helpers used by the unit and integration
//! tests: a scripted HTTP transport that records what the engine sends, plus
//! small bits of boiler-plate (placeholder configuration, tracing setup).
//! Keeping them behind `testutils` leaves the public API surface clean while
//! still making the helpers available to *external* test crates via
//! `use gh_oauth_helper::testutils::*`.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use http::{HeaderMap, StatusCode};

use crate::{
    error::{Error, Result},
    flow::{GitHubOAuth, OAuthConfig},
    transport::{HttpRequest, HttpResponse, HttpTransport},
};

/// Scripted HTTP transport.
///
/// Queued responses are handed out in order and every request is recorded,
/// so tests can assert both on what the engine sent and on how many round
/// trips it made. Clones share the same script and record, which lets a test
/// keep a handle after moving the transport into an engine.
#[derive(Clone, Default)]
pub struct StubTransport {
    responses: Arc<Mutex<VecDeque<Result<HttpResponse>>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with the given status and body.
    pub fn push_response(&self, status: StatusCode, body: impl Into<String>) {
        self.responses
            .lock()
            .expect("stub transport lock poisoned")
            .push_back(Ok(HttpResponse {
                status,
                headers: HeaderMap::new(),
                body: body.into(),
            }));
    }

    /// Queue a transport-level failure.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.responses
            .lock()
            .expect("stub transport lock poisoned")
            .push_back(Err(Error::Network(message.into())));
    }

    /// Requests the engine has issued so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .expect("stub transport lock poisoned")
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .expect("stub transport lock poisoned")
            .len()
    }
}

#[async_trait]
impl HttpTransport for StubTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests
            .lock()
            .expect("stub transport lock poisoned")
            .push(request);
        self.responses
            .lock()
            .expect("stub transport lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(Error::Network("stub transport script exhausted".to_string())))
    }
}

/// Configuration with placeholder credentials for tests.
pub fn test_config() -> OAuthConfig {
    OAuthConfig {
        client_id: "test-client-id".to_string(),
        client_secret: "test-client-secret".to_string(),
        redirect_uri: Some("http://localhost:8080/callback".to_string()),
        secure_mode: false,
    }
}

/// Build an engine wired to a fresh [`StubTransport`], returning both
/// halves so the test can script responses and inspect requests.
pub fn engine_with_stub(config: OAuthConfig) -> Result<(GitHubOAuth, StubTransport)> {
    let stub = StubTransport::new();
    let engine = GitHubOAuth::with_transport(config, Box::new(stub.clone()))?;
    Ok((engine, stub))
}

/// Initialize a tracing subscriber for tests.
/// It is safe to call this multiple times.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}
