use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Marketplace API",
        version = "1.0.0",
        description = r#"
# Multi-Vendor Marketplace API

Vendors register with a geocoded UK postcode, list products, and
receive orders; customers browse vendors by proximity and check out.
Product records mirror one-way into a Shopify catalog.

## Authentication

Log in at `/auth/login` to receive a JWT and a session cookie. Send
either on subsequent requests:

```
Authorization: Bearer <your-jwt-token>
```

## Pagination

List endpoints accept `page` and `per_page` query parameters.
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    paths(
        // Public
        crate::handlers::public::list_vendors,
        crate::handlers::public::search_vendors,
        crate::handlers::public::get_vendor,
        crate::handlers::public::vendor_products,
        crate::handlers::public::get_product,
        crate::handlers::public::search_products,

        // Vendor
        crate::handlers::vendors::register_vendor,
        crate::handlers::vendors::update_vendor,
        crate::handlers::vendors::my_vendor,

        // User
        crate::handlers::users::vendors_nearby,
        crate::handlers::users::vendor_products,
        crate::handlers::users::request_deletion,

        // Products
        crate::handlers::products::list_products,
        crate::handlers::products::create_product,
        crate::handlers::products::get_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        crate::handlers::products::get_product_variants,
        crate::handlers::products::get_variant,
        crate::handlers::products::create_variant,
        crate::handlers::products::update_variant,
        crate::handlers::products::delete_variant,
        crate::handlers::products::get_product_images,
        crate::handlers::products::add_image,
        crate::handlers::products::delete_image,

        // Carts
        crate::handlers::carts::create_cart,
        crate::handlers::carts::get_cart,
        crate::handlers::carts::add_item,
        crate::handlers::carts::remove_item,
        crate::handlers::carts::checkout,

        // Orders
        crate::handlers::orders::list_orders,
        crate::handlers::orders::create_order,
        crate::handlers::orders::get_order,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::cancel_order,

        // Admin
        crate::handlers::admin::approve_vendor,
        crate::handlers::admin::list_deletion_requests,
        crate::handlers::admin::approve_deletion,
        crate::handlers::admin::reject_deletion,
        crate::handlers::admin::trigger_shopify_sync,

        // Shopify checkout
        crate::handlers::shopify::create_checkout,
        crate::handlers::shopify::add_line_items,
    ),
    components(
        schemas(
            crate::handlers::vendors::RegisterVendorRequest,
            crate::handlers::vendors::UpdateVendorRequest,
            crate::handlers::users::DeletionRequestBody,
            crate::handlers::products::CreateProductRequest,
            crate::handlers::products::UpdateProductRequest,
            crate::handlers::products::CreateVariantRequest,
            crate::handlers::products::UpdateVariantRequest,
            crate::handlers::products::AddImageRequest,
            crate::handlers::carts::CreateCartRequest,
            crate::handlers::carts::AddItemRequest,
            crate::handlers::orders::CreateOrderRequest,
            crate::handlers::orders::OrderItemRequest,
            crate::handlers::orders::UpdateOrderStatusRequest,
            crate::handlers::admin::ApproveVendorRequest,
            crate::handlers::shopify::CheckoutRequest,
            crate::handlers::shopify::LineItemRequest,
            crate::errors::ErrorResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Public", description = "Unauthenticated browse and search"),
        (name = "Vendor", description = "Vendor self-service"),
        (name = "User", description = "Customer endpoints"),
        (name = "Products", description = "Catalog management"),
        (name = "Carts", description = "Shopping carts"),
        (name = "Orders", description = "Order management"),
        (name = "Admin", description = "Administrative actions"),
        (name = "Shopify", description = "External checkout integration")
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_generates() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string(&openapi).unwrap();
        assert!(json.contains("Marketplace API"));
        assert!(json.contains("/api/v1/public/vendors"));
        assert!(json.contains("/api/v1/shopify/checkout"));
    }
}
