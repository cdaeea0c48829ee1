mod common;

use axum::http::StatusCode;
use common::{get_request, json_request, response_json, TestApp};
use marketplace_api::entities::{DeletionRequestStatus, UserRole, VendorStatus};
use rust_decimal_macros::dec;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn status_endpoint_reports_ok() {
    let app = TestApp::new().await;
    let response = app
        .router()
        .oneshot(get_request("/api/v1/status", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["service"], "marketplace-api");
}

#[tokio::test]
async fn public_vendor_listing_shows_only_approved_vendors() {
    let app = TestApp::new().await;
    let (u1, _) = app.create_user("a@example.com", UserRole::Vendor).await;
    let (u2, _) = app.create_user("b@example.com", UserRole::Vendor).await;
    app.create_vendor_record(u1.id, "Approved Shop", "a-shop@example.com", 51.5, -0.1, VendorStatus::Approved)
        .await;
    app.create_vendor_record(u2.id, "Pending Shop", "b-shop@example.com", 51.5, -0.1, VendorStatus::Pending)
        .await;

    let response = app
        .router()
        .oneshot(get_request("/api/v1/public/vendors", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    let names: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Approved Shop"]);
}

#[tokio::test]
async fn missing_product_returns_404() {
    let app = TestApp::new().await;
    let response = app
        .router()
        .oneshot(get_request(
            "/api/v1/public/product/3f3ea1a0-0000-0000-0000-000000000000",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn protected_routes_require_authentication() {
    let app = TestApp::new().await;

    let unauthenticated = app
        .router()
        .oneshot(get_request("/api/v1/orders", None))
        .await
        .unwrap();
    assert_eq!(unauthenticated.status(), StatusCode::UNAUTHORIZED);

    let garbage_token = app
        .router()
        .oneshot(get_request("/api/v1/orders", Some("not-a-jwt")))
        .await
        .unwrap();
    assert_eq!(garbage_token.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_reject_non_admin_roles() {
    let app = TestApp::new().await;
    let (_, customer_token) = app.create_user("buyer@example.com", UserRole::Customer).await;
    let (_, admin_token) = app.create_user("root@example.com", UserRole::Admin).await;

    let forbidden = app
        .router()
        .oneshot(get_request(
            "/api/v1/admin/deletion-requests",
            Some(&customer_token),
        ))
        .await
        .unwrap();
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let allowed = app
        .router()
        .oneshot(get_request(
            "/api/v1/admin/deletion-requests",
            Some(&admin_token),
        ))
        .await
        .unwrap();
    assert_eq!(allowed.status(), StatusCode::OK);
}

#[tokio::test]
async fn vendor_approval_flow_via_admin_endpoint() {
    let app = TestApp::new().await;
    let (owner, _) = app.create_user("owner@example.com", UserRole::Vendor).await;
    let (_, admin_token) = app.create_user("root@example.com", UserRole::Admin).await;
    let vendor = app
        .create_vendor_record(owner.id, "Shop", "shop@example.com", 51.5, -0.1, VendorStatus::Pending)
        .await;

    let response = app
        .router()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/admin/approve-vendor/{}", vendor.id),
            Some(&admin_token),
            json!({ "status": "approved" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["vendor"]["status"], "approved");
}

#[tokio::test]
async fn deletion_request_lifecycle() {
    let app = TestApp::new().await;
    let (user, user_token) = app.create_user("leaver@example.com", UserRole::Customer).await;
    let (_, admin_token) = app.create_user("root@example.com", UserRole::Admin).await;

    // User files the request
    let filed = app
        .router()
        .oneshot(json_request(
            "POST",
            "/api/v1/user/deletion-request",
            Some(&user_token),
            json!({ "reason": "Moving away" }),
        ))
        .await
        .unwrap();
    assert_eq!(filed.status(), StatusCode::CREATED);
    let body = response_json(filed).await;
    let request_id = body["id"].as_str().unwrap().to_string();
    assert_eq!(body["status"], "pending");

    // A second request conflicts
    let duplicate = app
        .router()
        .oneshot(json_request(
            "POST",
            "/api/v1/user/deletion-request",
            Some(&user_token),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    // Admin approves; the account disappears
    let approved = app
        .router()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/admin/deletion-requests/{}/approve", request_id),
            Some(&admin_token),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(approved.status(), StatusCode::OK);

    let pending = app
        .state
        .services
        .deletion
        .list_requests(Some(DeletionRequestStatus::Pending))
        .await
        .unwrap();
    assert!(pending.is_empty());

    // The processed request survives as the audit record
    let processed = app
        .state
        .services
        .deletion
        .list_requests(Some(DeletionRequestStatus::Approved))
        .await
        .unwrap();
    assert_eq!(processed.len(), 1);
    assert!(processed[0].processed_at.is_some());

    // The deleted user's token no longer names a user, but the JWT is
    // still structurally valid; profile lookups now 404 at the data
    // layer. Verify the user row is gone.
    use marketplace_api::entities::user;
    use sea_orm::EntityTrait;
    let found = user::Entity::find_by_id(user.id)
        .one(&*app.state.db)
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn vendors_can_create_products_over_http() {
    let app = TestApp::new().await;
    let (owner, owner_token) = app.create_user("owner@example.com", UserRole::Vendor).await;
    app.create_vendor_record(owner.id, "Shop", "shop@example.com", 51.5, -0.1, VendorStatus::Approved)
        .await;

    let response = app
        .router()
        .oneshot(json_request(
            "POST",
            "/api/v1/products",
            Some(&owner_token),
            json!({
                "title": "Focaccia",
                "description": "Olive oil bread",
                "price": "6.00",
                "stock": 8
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_json(response).await;
    assert_eq!(body["title"], "Focaccia");
    assert_eq!(body["stock"], 8);

    // Customers cannot create products
    let (_, customer_token) = app.create_user("buyer@example.com", UserRole::Customer).await;
    let forbidden = app
        .router()
        .oneshot(json_request(
            "POST",
            "/api/v1/products",
            Some(&customer_token),
            json!({
                "title": "Nope",
                "description": "",
                "price": "1.00",
                "stock": 1
            }),
        ))
        .await
        .unwrap();
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn graphql_queries_and_auth_gated_mutations() {
    let app = TestApp::new().await;
    let (owner, owner_token) = app.create_user("owner@example.com", UserRole::Vendor).await;
    let vendor = app
        .create_vendor_record(owner.id, "Shop", "shop@example.com", 51.5, -0.1, VendorStatus::Approved)
        .await;
    app.create_product_record(vendor.id, "Loaf", dec!(3.00), 5)
        .await;

    // Public query
    let query = app
        .router()
        .oneshot(json_request(
            "POST",
            "/graphql",
            None,
            json!({ "query": "{ vendors { id name products { title stock } } }" }),
        ))
        .await
        .unwrap();
    assert_eq!(query.status(), StatusCode::OK);
    let body = response_json(query).await;
    assert_eq!(body["data"]["vendors"][0]["name"], "Shop");
    assert_eq!(body["data"]["vendors"][0]["products"][0]["title"], "Loaf");

    // Mutation without auth fails
    let denied = app
        .router()
        .oneshot(json_request(
            "POST",
            "/graphql",
            None,
            json!({
                "query": format!(
                    "mutation {{ createProduct(title: \"X\", description: \"d\", price: \"1.00\", stock: 1, vendorId: \"{}\") {{ id }} }}",
                    vendor.id
                )
            }),
        ))
        .await
        .unwrap();
    let denied_body = response_json(denied).await;
    assert!(denied_body["errors"][0]["message"]
        .as_str()
        .unwrap()
        .contains("Not authenticated"));

    // Mutation with a bearer token succeeds
    let allowed = app
        .router()
        .oneshot(json_request(
            "POST",
            "/graphql",
            Some(&owner_token),
            json!({
                "query": format!(
                    "mutation {{ createProduct(title: \"Bagel\", description: \"ring\", price: \"2.00\", stock: 12, vendorId: \"{}\") {{ id title stock }} }}",
                    vendor.id
                )
            }),
        ))
        .await
        .unwrap();
    let allowed_body = response_json(allowed).await;
    assert_eq!(allowed_body["data"]["createProduct"]["title"], "Bagel");
    assert_eq!(allowed_body["data"]["createProduct"]["stock"], 12);
}
