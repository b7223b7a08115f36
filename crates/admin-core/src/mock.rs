//! # Mock Transport
//!
//! An in-memory [`Transport`] with expectation tracking for fluent testing.
//! It lets you script responses (including failures and delayed arrivals that
//! are hard to reproduce against a real backend) and assert exactly which
//! requests were issued.
//!
//! # Example
//! ```ignore
//! let mock = MockTransport::new();
//! mock.expect(Method::Post, "/billings").return_ok(json!({ ... }));
//! mock.expect(Method::Get, "/billings/billings_1")
//!     .return_err(ApiError::not_found("billings", "billings_1"));
//!
//! let client = ResourceClient::<Billing>::new(Arc::new(mock.clone()));
//! // drive the client...
//! mock.verify(); // all expectations consumed
//! assert_eq!(mock.calls(Method::Post, "/billings"), 1);
//! ```

use crate::error::ApiError;
use crate::transport::{ApiRequest, Method, Transport};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

struct Expectation {
    method: Method,
    path: String,
    delay: Option<Duration>,
    response: Result<Value, ApiError>,
}

#[derive(Default)]
struct Inner {
    expectations: Mutex<VecDeque<Expectation>>,
    log: Mutex<Vec<ApiRequest>>,
}

/// A scripted transport. Cheap to clone; clones share the expectation queue
/// and request log.
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Inner>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an expectation for the next request with this method and path.
    pub fn expect(&self, method: Method, path: impl Into<String>) -> ExpectationBuilder {
        ExpectationBuilder {
            method,
            path: path.into(),
            delay: None,
            inner: Arc::clone(&self.inner),
        }
    }

    /// Every request issued so far, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.inner.log.lock().unwrap().clone()
    }

    /// How many requests matched this method and path.
    pub fn calls(&self, method: Method, path: &str) -> usize {
        self.inner
            .log
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    /// Panics if any queued expectation was not consumed.
    pub fn verify(&self) {
        let expectations = self.inner.expectations.lock().unwrap();
        if !expectations.is_empty() {
            panic!(
                "Not all expectations were met. {} remaining",
                expectations.len()
            );
        }
    }
}

/// Builder for one scripted response.
pub struct ExpectationBuilder {
    method: Method,
    path: String,
    delay: Option<Duration>,
    inner: Arc<Inner>,
}

impl ExpectationBuilder {
    /// Delays the response, for testing out-of-order arrival.
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn return_ok(self, body: Value) {
        self.push(Ok(body));
    }

    pub fn return_err(self, error: ApiError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<Value, ApiError>) {
        self.inner
            .expectations
            .lock()
            .unwrap()
            .push_back(Expectation {
                method: self.method,
                path: self.path,
                delay: self.delay,
                response,
            });
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let expectation = {
            let mut log = self.inner.log.lock().unwrap();
            log.push(request.clone());
            self.inner.expectations.lock().unwrap().pop_front()
        };
        let expectation = match expectation {
            Some(expectation) => expectation,
            None => panic!(
                "Unexpected request with no expectation: {} {}",
                request.method, request.path
            ),
        };
        assert_eq!(
            (expectation.method, expectation.path.as_str()),
            (request.method, request.path.as_str()),
            "Expectation mismatch"
        );
        if let Some(delay) = expectation.delay {
            sleep(delay).await;
        }
        expectation.response
    }
}
