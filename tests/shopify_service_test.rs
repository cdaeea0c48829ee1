mod common;

use common::TestApp;
use marketplace_api::entities::{product, VendorStatus};
use marketplace_api::services::shopify::{CheckoutLineItem, ShopifyClient, ShopifyService};
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Service wired to a wiremock double standing in for the Shopify
/// Admin and Storefront APIs.
fn shopify_service(app: &TestApp, server: &MockServer, publication: Option<&str>) -> ShopifyService {
    let client = ShopifyClient::new(
        server.uri(),
        server.uri(),
        "shpat_test_token",
        Some("storefront_test_token".to_string()),
    );
    ShopifyService::new(
        app.state.db.clone(),
        client,
        publication.map(String::from),
    )
}

#[tokio::test]
async fn sync_creates_a_product_and_stores_the_remote_id() {
    let app = TestApp::new().await;
    let server = MockServer::start().await;

    let (user, _) = app.create_user("owner@example.com", marketplace_api::entities::UserRole::Vendor).await;
    let vendor = app
        .create_vendor_record(
            user.id,
            "Corner Bakery",
            "bakery@example.com",
            51.5,
            -0.12,
            VendorStatus::Approved,
        )
        .await;
    let local = app
        .create_product_record(vendor.id, "Sourdough Loaf", dec!(4.50), 12)
        .await;

    Mock::given(method("POST"))
        .and(path("/products.json"))
        .and(header("X-Shopify-Access-Token", "shpat_test_token"))
        .and(body_partial_json(json!({
            "product": {
                "title": "Sourdough Loaf",
                "vendor": "Corner Bakery",
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "product": {
                "id": 632910392,
                "title": "Sourdough Loaf",
                "variants": [{ "id": 808950810, "sku": "" }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = shopify_service(&app, &server, None);
    service.sync_product(local.id).await.expect("sync failed");

    let synced = product::Entity::find_by_id(local.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(synced.shopify_id.as_deref(), Some("632910392"));
}

#[tokio::test]
async fn sync_publishes_to_the_sales_channel_after_create() {
    let app = TestApp::new().await;
    let server = MockServer::start().await;

    let (user, _) = app.create_user("owner@example.com", marketplace_api::entities::UserRole::Vendor).await;
    let vendor = app
        .create_vendor_record(
            user.id,
            "Corner Bakery",
            "bakery@example.com",
            51.5,
            -0.12,
            VendorStatus::Approved,
        )
        .await;
    let local = app
        .create_product_record(vendor.id, "Rye Loaf", dec!(5.00), 6)
        .await;

    Mock::given(method("POST"))
        .and(path("/products.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "product": { "id": 77, "variants": [] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/graphql.json"))
        .and(body_partial_json(json!({
            "variables": { "id": "gid://shopify/Product/77" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "publishablePublish": { "userErrors": [] } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = shopify_service(&app, &server, Some("gid://shopify/Publication/1"));
    service.sync_product(local.id).await.expect("sync failed");
}

#[tokio::test]
async fn sync_updates_an_existing_product_in_place() {
    let app = TestApp::new().await;
    let server = MockServer::start().await;

    let (user, _) = app.create_user("owner@example.com", marketplace_api::entities::UserRole::Vendor).await;
    let vendor = app
        .create_vendor_record(
            user.id,
            "Corner Bakery",
            "bakery@example.com",
            51.5,
            -0.12,
            VendorStatus::Approved,
        )
        .await;
    let local = app
        .create_product_record(vendor.id, "Baguette", dec!(2.20), 30)
        .await;

    // Mark the product as already synced
    use sea_orm::{ActiveModelTrait, Set};
    let mut active: product::ActiveModel = local.clone().into();
    active.shopify_id = Set(Some("445566".to_string()));
    active.update(&*app.state.db).await.unwrap();

    Mock::given(method("PUT"))
        .and(path("/products/445566.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "product": { "id": 445566 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = shopify_service(&app, &server, None);
    service.sync_product(local.id).await.expect("update failed");
}

#[tokio::test]
async fn delete_retries_with_backoff_then_succeeds() {
    let app = TestApp::new().await;
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/products/999.json"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/products/999.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let service = shopify_service(&app, &server, None);
    service
        .delete_product("999")
        .await
        .expect("delete should succeed on the third attempt");
}

#[tokio::test]
async fn delete_gives_up_after_three_attempts() {
    let app = TestApp::new().await;
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/products/404404.json"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let service = shopify_service(&app, &server, None);
    let err = service.delete_product("404404").await.unwrap_err();
    assert!(err.to_string().contains("Shopify API error"));
}

#[tokio::test]
async fn checkout_create_returns_id_and_web_url() {
    let app = TestApp::new().await;
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql.json"))
        .and(header(
            "X-Shopify-Storefront-Access-Token",
            "storefront_test_token",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "checkoutCreate": {
                    "checkout": {
                        "id": "gid://shopify/Checkout/abc",
                        "webUrl": "https://demo.myshopify.com/checkout/abc"
                    },
                    "checkoutUserErrors": []
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = shopify_service(&app, &server, None);
    let checkout = service
        .create_checkout(&[CheckoutLineItem {
            variant_id: "gid://shopify/ProductVariant/1".to_string(),
            quantity: 2,
        }])
        .await
        .expect("checkout failed");

    assert_eq!(checkout.id, "gid://shopify/Checkout/abc");
    assert!(checkout.web_url.ends_with("/checkout/abc"));
}

#[tokio::test]
async fn checkout_user_errors_surface_as_failures() {
    let app = TestApp::new().await;
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "checkoutCreate": {
                    "checkout": null,
                    "checkoutUserErrors": [
                        { "code": "INVALID", "field": ["lineItems"], "message": "Variant is unavailable" }
                    ]
                }
            }
        })))
        .mount(&server)
        .await;

    let service = shopify_service(&app, &server, None);
    let err = service
        .create_checkout(&[CheckoutLineItem {
            variant_id: "gid://shopify/ProductVariant/1".to_string(),
            quantity: 1,
        }])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Variant is unavailable"));
}

#[tokio::test]
async fn pull_sync_updates_matched_products_and_applies_inventory() {
    let app = TestApp::new().await;
    let server = MockServer::start().await;

    let (user, _) = app.create_user("owner@example.com", marketplace_api::entities::UserRole::Vendor).await;
    let vendor = app
        .create_vendor_record(
            user.id,
            "Corner Bakery",
            "bakery@example.com",
            51.5,
            -0.12,
            VendorStatus::Approved,
        )
        .await;
    let local = app
        .create_product_record(vendor.id, "Old Title", dec!(1.00), 1)
        .await;

    use sea_orm::{ActiveModelTrait, Set};
    let mut active: product::ActiveModel = local.clone().into();
    active.shopify_id = Set(Some("1111".to_string()));
    active.update(&*app.state.db).await.unwrap();

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [
                {
                    "id": 1111,
                    "title": "Fresh Title",
                    "body_html": "Updated remotely",
                    "vendor": "Corner Bakery",
                    "variants": [{ "price": "3.75", "inventory_quantity": 9 }]
                },
                {
                    "id": 2222,
                    "title": "New Remote Product",
                    "body_html": "Created remotely",
                    "vendor": "Corner Bakery",
                    "variants": [{ "price": "8.00", "inventory_quantity": 4 }]
                },
                {
                    "id": 3333,
                    "title": "Orphan",
                    "body_html": "No matching vendor",
                    "vendor": "Unknown Vendor Ltd",
                    "variants": [{ "price": "1.00", "inventory_quantity": 1 }]
                }
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/inventory_levels.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "inventory_levels": [
                { "inventory_item_id": 1111, "available": 2 }
            ]
        })))
        .mount(&server)
        .await;

    let service = shopify_service(&app, &server, None);
    let summary = service.pull_catalog().await.expect("pull failed");

    assert_eq!(summary.products_updated, 1);
    assert_eq!(summary.products_created, 1);
    assert_eq!(summary.products_skipped, 1);
    assert_eq!(summary.inventory_updates, 1);

    let refreshed = product::Entity::find_by_id(local.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed.title, "Fresh Title");
    // Inventory levels overwrite the product payload quantity
    assert_eq!(refreshed.stock, 2);
}
