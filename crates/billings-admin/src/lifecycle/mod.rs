//! # System Lifecycle & Orchestration
//!
//! Wires the whole admin together: registers each entity's endpoint on the
//! in-memory backend, spawns the backend task, hands out typed clients, and
//! coordinates graceful shutdown.
//!
//! ## Shutdown
//!
//! 1. Send the backend an explicit close over the request channel. Clients
//!    handed out by the system may still be alive (a mounted form holds
//!    one), so waiting for every sender to drop would never finish.
//! 2. The backend serves everything queued before the close, then stops.
//! 3. Await the backend task. Surviving clients get a network error on
//!    their next request.

use crate::model::{Billing, Restaurant};
use admin_core::{
    AccessContext, AccessService, ApiServer, ChannelTransport, CountRelation, EndpointSpec,
    IncludeRelation, LinkedRecordResolver, ResourceClient, Transport,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

const REQUEST_BUFFER: usize = 32;

/// Backend metadata for the billings collection.
pub fn billing_endpoint() -> EndpointSpec {
    EndpointSpec {
        endpoint: "billings",
        filter_fields: &["id", "order_summary", "table_number", "restaurant_id"],
        text_filter_fields: &["order_summary", "table_number"],
        counts: &[],
        includes: &[IncludeRelation {
            name: "restaurant",
            endpoint: "restaurants",
            local_key: "restaurant_id",
        }],
    }
}

/// Backend metadata for the restaurants collection.
pub fn restaurant_endpoint() -> EndpointSpec {
    EndpointSpec {
        endpoint: "restaurants",
        filter_fields: &["id", "name"],
        text_filter_fields: &["name"],
        counts: &[CountRelation {
            endpoint: "billings",
            foreign_key: "restaurant_id",
        }],
        includes: &[],
    }
}

/// The complete running system: backend task plus one client per entity.
pub struct AdminSystem {
    pub billing_client: ResourceClient<Billing>,
    pub restaurant_client: ResourceClient<Restaurant>,
    /// Search-as-you-type resolution of restaurant references.
    pub restaurant_resolver: LinkedRecordResolver<Restaurant>,
    /// The signed-in principal's capabilities.
    pub access: AccessContext,
    transport: ChannelTransport,
    handle: JoinHandle<()>,
}

impl AdminSystem {
    /// Starts the backend with both endpoints registered and full access
    /// granted to both entities.
    pub fn new() -> Self {
        let (server, transport) = ApiServer::new(REQUEST_BUFFER);
        let server = server.serve(billing_endpoint()).serve(restaurant_endpoint());
        let handle = tokio::spawn(server.run());

        let shared: Arc<dyn Transport> = Arc::new(transport.clone());
        let billing_client = ResourceClient::new(Arc::clone(&shared));
        let restaurant_client: ResourceClient<Restaurant> = ResourceClient::new(shared);
        let restaurant_resolver = LinkedRecordResolver::new(restaurant_client.clone());

        let access = AccessContext::new()
            .with_full_access(AccessService::Project, "billings")
            .with_full_access(AccessService::Project, "restaurants");

        info!("Admin system started");
        Self {
            billing_client,
            restaurant_client,
            restaurant_resolver,
            access,
            transport,
            handle,
        }
    }

    /// Closes the backend, then awaits its task. Already-queued requests are
    /// still served; clients cloned out of the system (a mounted form, say)
    /// may outlive the shutdown and will fail on their next request.
    pub async fn shutdown(self) -> Result<(), String> {
        self.transport.close().await;
        self.handle.await.map_err(|e| e.to_string())?;
        info!("Admin system shut down");
        Ok(())
    }
}

impl Default for AdminSystem {
    fn default() -> Self {
        Self::new()
    }
}
