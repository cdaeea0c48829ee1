pub mod carts;
pub mod deletion;
pub mod geocoding;
pub mod orders;
pub mod products;
pub mod shopify;
pub mod vendors;

pub use carts::CartService;
pub use deletion::DeletionService;
pub use geocoding::PostcodeClient;
pub use orders::OrderService;
pub use products::ProductService;
pub use shopify::ShopifyService;
pub use vendors::VendorService;
