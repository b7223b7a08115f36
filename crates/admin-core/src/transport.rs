//! # Transport Seam
//!
//! The HTTP-shaped boundary between the toolkit and whatever actually moves
//! bytes. The real transport library is an external collaborator; everything
//! in this crate talks to it through the [`Transport`] trait, which is also
//! what the in-memory backend and the mock implement.
//!
//! Timeouts are the transport's own concern; the core enforces none.

use crate::error::ApiError;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Patch => write!(f, "PATCH"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

/// One request: method, path, query parameters, optional JSON body.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub params: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            body: None,
        }
    }

    pub fn with_params(mut self, params: Vec<(String, String)>) -> Self {
        self.params = params;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Executes one request for one response, with no implicit retry.
///
/// Implementations must pass errors through as the [`ApiError`] taxonomy and
/// never translate them further; presentation is the controller's job.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<Value, ApiError>;
}
