//! # Resource Client
//!
//! The typed CRUD interface over the transport seam. Each operation is a
//! single network round trip with no implicit retry and no local cache —
//! caching, if any, is a concern of the caller.
//!
//! Failures propagate unmodified: this layer performs no error translation
//! and never swallows a server rejection.

use crate::error::ApiError;
use crate::query::{Page, Query};
use crate::resource::Resource;
use crate::transport::{ApiRequest, Method, Transport};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, instrument};

/// A type-safe client for one resource endpoint.
///
/// Cheap to clone — holds only the shared transport handle.
pub struct ResourceClient<T: Resource> {
    transport: Arc<dyn Transport>,
    _resource: PhantomData<fn() -> T>,
}

impl<T: Resource> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            _resource: PhantomData,
        }
    }
}

impl<T: Resource> ResourceClient<T> {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            _resource: PhantomData,
        }
    }

    fn collection_path() -> String {
        format!("/{}", T::ENDPOINT)
    }

    fn record_path(id: &T::Id) -> String {
        format!("/{}/{}", T::ENDPOINT, id)
    }

    /// `POST /{entity}` — submits a validated draft, returns the stored
    /// record with its server-assigned identifier and timestamps.
    #[instrument(skip(self, draft), fields(entity = T::ENDPOINT))]
    pub async fn create(&self, draft: &T::Draft) -> Result<T, ApiError> {
        debug!("Sending request");
        let request =
            ApiRequest::new(Method::Post, Self::collection_path()).with_body(encode(draft)?);
        let response = self.transport.execute(request).await?;
        decode(response)
    }

    /// `GET /{entity}/{id}`.
    #[instrument(skip(self), fields(entity = T::ENDPOINT, %id))]
    pub async fn get(&self, id: &T::Id) -> Result<T, ApiError> {
        debug!("Sending request");
        let request = ApiRequest::new(Method::Get, Self::record_path(id));
        let response = self.transport.execute(request).await?;
        decode(response)
    }

    /// `PATCH /{entity}/{id}` — partial update, returns the updated record.
    #[instrument(skip(self, patch), fields(entity = T::ENDPOINT, %id))]
    pub async fn update(&self, id: &T::Id, patch: &T::Patch) -> Result<T, ApiError> {
        debug!("Sending request");
        let request =
            ApiRequest::new(Method::Patch, Self::record_path(id)).with_body(encode(patch)?);
        let response = self.transport.execute(request).await?;
        decode(response)
    }

    /// `DELETE /{entity}/{id}` — fails with `NotFound` for a missing id.
    #[instrument(skip(self), fields(entity = T::ENDPOINT, %id))]
    pub async fn remove(&self, id: &T::Id) -> Result<(), ApiError> {
        debug!("Sending request");
        let request = ApiRequest::new(Method::Delete, Self::record_path(id));
        self.transport.execute(request).await?;
        Ok(())
    }

    /// `GET /{entity}?filters` — stable ordering by the requested sort field,
    /// ties broken by identifier ascending.
    #[instrument(skip(self, query), fields(entity = T::ENDPOINT))]
    pub async fn list(&self, query: &Query<T::Filter>) -> Result<Page<T>, ApiError> {
        debug!("Sending request");
        let request =
            ApiRequest::new(Method::Get, Self::collection_path()).with_params(query.to_params());
        let response = self.transport.execute(request).await?;
        decode(response)
    }
}

fn encode<B: Serialize>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::Network(format!("encode error: {e}")))
}

fn decode<R: DeserializeOwned>(value: Value) -> Result<R, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Network(format!("decode error: {e}")))
}
