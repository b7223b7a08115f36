//! Demo walkthrough of the billings admin: creates a restaurant, drives a
//! billing create form end to end (including linked-record search), lists the
//! result with its embedded restaurant, then shuts the system down.

use admin_core::tracing::setup_tracing;
use admin_core::{FormController, FormMode, Query, SortDirection};
use billings_admin::lifecycle::AdminSystem;
use billings_admin::model::{Billing, BillingFilter, RestaurantDraft};
use tracing::{info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    // Setup tracing once for the entire application
    setup_tracing();

    info!("Starting billings admin");

    let system = AdminSystem::new();

    let restaurant = system
        .restaurant_client
        .create(&RestaurantDraft {
            name: "Chez Mario".to_string(),
        })
        .await
        .map_err(|e| e.to_string())?;
    info!(restaurant_id = %restaurant.id, "Restaurant created");

    let span = tracing::info_span!("billing_form");
    let navigation = async {
        let mut form = FormController::<Billing>::mount(
            system.billing_client.clone(),
            &system.access,
            admin_core::AccessService::Project,
            FormMode::Create,
        )
        .await
        .map_err(|e| e.to_string())?;

        form.edit(|draft| {
            draft.order_summary = "Table 5 dinner".to_string();
            draft.total_value = 84.50;
            draft.table_number = "5".to_string();
        });

        // Resolve the restaurant link the way the form's select would.
        let options = system
            .restaurant_resolver
            .search("chez")
            .await
            .map_err(|e| e.to_string())?
            .unwrap_or_default();
        info!(matches = options.len(), "Restaurant search resolved");
        if let Some(option) = options.into_iter().next() {
            form.edit(|draft| draft.restaurant_id.select(option));
        }

        form.submit()
            .await
            .ok_or_else(|| format!("submission failed: {:?}", form.state()))
    }
    .instrument(span)
    .await?;
    info!(route = %navigation.route, "Billing submitted");

    let page = system
        .billing_client
        .list(
            &Query::filtered(BillingFilter::default())
                .sort("order_summary", SortDirection::Asc)
                .include("restaurant"),
        )
        .await
        .map_err(|e| e.to_string())?;
    for billing in &page.items {
        let linked = billing
            .restaurant
            .as_ref()
            .map(|r| r.name.as_str())
            .unwrap_or("none");
        info!(id = %billing.id, total = billing.total_value, restaurant = linked, "Billing");
    }

    let counted = system
        .restaurant_client
        .get(&restaurant.id)
        .await
        .map_err(|e| e.to_string())?;
    if let Some(counts) = counted.counts {
        info!(restaurant = %counted.name, billings = counts.billings, "Aggregate");
    }

    system.shutdown().await?;

    info!("Billings admin completed");
    Ok(())
}
