use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::services::shopify::ShopifyService;

/// Events emitted by the service layer.
///
/// Product events carry everything the background processor needs to
/// mirror the change into the external catalog without re-reading
/// deleted rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Account events
    UserRegistered(Uuid),
    DeletionRequested(Uuid),
    DeletionApproved(Uuid),

    // Vendor events
    VendorRegistered(Uuid),
    VendorUpdated(Uuid),
    VendorStatusChanged {
        vendor_id: Uuid,
        status: String,
    },

    // Catalog events; these drive the Shopify push sync
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted {
        product_id: Uuid,
        shopify_id: Option<String>,
    },

    // Order events
    OrderCreated(Uuid),
    OrderCancelled(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },

    // Cart events
    CartConverted(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is
    /// closed. Event delivery is best-effort; domain writes must not
    /// roll back because the processor is gone.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event.clone()).await {
            warn!("Dropping event {:?}: {}", event, e);
        }
    }
}

/// Background event processing loop.
///
/// Catalog events are mirrored into Shopify when a sync service is
/// configured; everything else is logged for observability.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, shopify: Option<Arc<ShopifyService>>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        info!("Received event: {:?}", event);

        match event {
            Event::ProductCreated(product_id) | Event::ProductUpdated(product_id) => {
                if let Some(shopify) = shopify.as_ref() {
                    if let Err(e) = shopify.sync_product(product_id).await {
                        error!(
                            "Failed to sync product to Shopify: product_id={}, error={}",
                            product_id, e
                        );
                    }
                }
            }
            Event::ProductDeleted {
                product_id,
                shopify_id,
            } => {
                if let (Some(shopify), Some(shopify_id)) = (shopify.as_ref(), shopify_id) {
                    if let Err(e) = shopify.delete_product(&shopify_id).await {
                        error!(
                            "Failed to delete product from Shopify: product_id={}, shopify_id={}, error={}",
                            product_id, shopify_id, e
                        );
                    }
                }
            }
            Event::OrderCreated(order_id) => {
                info!("Order created: {}", order_id);
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(
                    "Order {} status changed: {} -> {}",
                    order_id, old_status, new_status
                );
            }
            other => {
                info!("Event processed: {:?}", other);
            }
        }
    }

    info!("Event processing loop terminated");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        // Must not panic or error out
        sender.send_or_log(Event::UserRegistered(Uuid::new_v4())).await;
    }

    #[tokio::test]
    async fn events_round_trip_through_the_channel() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        let id = Uuid::new_v4();

        sender.send(Event::ProductCreated(id)).await.unwrap();

        match rx.recv().await {
            Some(Event::ProductCreated(got)) => assert_eq!(got, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
