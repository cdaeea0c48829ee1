pub mod admin;
pub mod carts;
pub mod common;
pub mod orders;
pub mod products;
pub mod public;
pub mod shopify;
pub mod users;
pub mod vendors;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    CartService, DeletionService, OrderService, PostcodeClient, ProductService, ShopifyService,
    VendorService,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub vendors: Arc<VendorService>,
    pub products: Arc<ProductService>,
    pub carts: Arc<CartService>,
    pub orders: Arc<OrderService>,
    pub deletion: Arc<DeletionService>,
    /// Absent when the Shopify integration is not configured
    pub shopify: Option<Arc<ShopifyService>>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        geocoder: PostcodeClient,
        shopify: Option<Arc<ShopifyService>>,
    ) -> Self {
        let vendors = Arc::new(VendorService::new(
            db_pool.clone(),
            geocoder,
            event_sender.clone(),
        ));
        let products = Arc::new(ProductService::new(db_pool.clone(), event_sender.clone()));
        let carts = Arc::new(CartService::new(db_pool.clone()));
        let orders = Arc::new(OrderService::new(db_pool.clone(), event_sender.clone()));
        let deletion = Arc::new(DeletionService::new(db_pool, event_sender));

        Self {
            vendors,
            products,
            carts,
            orders,
            deletion,
            shopify,
        }
    }
}
