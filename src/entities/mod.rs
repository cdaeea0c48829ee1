pub mod cart;
pub mod cart_item;
pub mod deletion_request;
pub mod order;
pub mod order_item;
pub mod product;
pub mod product_image;
pub mod product_variant;
pub mod user;
pub mod vendor;

// Re-export entities
pub use cart::{CartStatus, Entity as Cart, Model as CartModel};
pub use cart_item::{Entity as CartItem, Model as CartItemModel};
pub use deletion_request::{
    DeletionRequestStatus, Entity as DeletionRequest, Model as DeletionRequestModel,
};
pub use order::{Entity as Order, Model as OrderModel, OrderStatus};
pub use order_item::{Entity as OrderItem, Model as OrderItemModel};
pub use product::{Entity as Product, Model as ProductModel, ProductStatus};
pub use product_image::{Entity as ProductImage, Model as ProductImageModel};
pub use product_variant::{Entity as ProductVariant, Model as ProductVariantModel};
pub use user::{Entity as User, Model as UserModel, UserRole};
pub use vendor::{Entity as Vendor, Model as VendorModel, VendorStatus};
