mod common;

use common::TestApp;
use marketplace_api::entities::{UserRole, VendorStatus};
use marketplace_api::errors::ServiceError;
use marketplace_api::services::vendors::{RegisterVendorInput, UpdateVendorInput};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn lookup_response(latitude: f64, longitude: f64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "status": 200,
        "result": { "latitude": latitude, "longitude": longitude }
    }))
}

#[tokio::test]
async fn registration_geocodes_the_postcode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/postcodes/SW1A1AA"))
        .respond_with(lookup_response(51.501, -0.1425))
        .expect(1)
        .mount(&server)
        .await;

    let app = TestApp::with_geocoder(&server.uri()).await;
    let (user, _) = app.create_user("owner@example.com", UserRole::Customer).await;

    let vendor = app
        .state
        .services
        .vendors
        .register_vendor(RegisterVendorInput {
            user_id: user.id,
            name: "Corner Bakery".into(),
            email: "bakery@example.com".into(),
            postcode: "SW1A1AA".into(),
            location: Some("Westminster".into()),
            opening_times: None,
            contact_info: None,
        })
        .await
        .expect("registration failed");

    assert_eq!(vendor.latitude, 51.501);
    assert_eq!(vendor.longitude, -0.1425);
    assert_eq!(vendor.status, VendorStatus::Pending);

    // The owning account is promoted to the vendor role
    let refreshed = app
        .state
        .services
        .vendors
        .get_vendor_for_user(user.id)
        .await
        .unwrap();
    assert!(refreshed.is_some());
}

#[tokio::test]
async fn registration_rejects_unknown_postcodes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/postcodes/ZZ999ZZ"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "status": 404,
            "error": "Postcode not found"
        })))
        .mount(&server)
        .await;

    let app = TestApp::with_geocoder(&server.uri()).await;
    let (user, _) = app.create_user("owner@example.com", UserRole::Customer).await;

    let err = app
        .state
        .services
        .vendors
        .register_vendor(RegisterVendorInput {
            user_id: user.id,
            name: "Nowhere Shop".into(),
            email: "nowhere@example.com".into(),
            postcode: "ZZ999ZZ".into(),
            location: None,
            opening_times: None,
            contact_info: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::InvalidPostcode(_)));
}

#[tokio::test]
async fn registration_rejects_duplicate_vendor_emails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/postcodes/SW1A1AA"))
        .respond_with(lookup_response(51.5, -0.14))
        .mount(&server)
        .await;

    let app = TestApp::with_geocoder(&server.uri()).await;
    let (first, _) = app.create_user("one@example.com", UserRole::Customer).await;
    let (second, _) = app.create_user("two@example.com", UserRole::Customer).await;

    let input = |user_id| RegisterVendorInput {
        user_id,
        name: "Bakery".into(),
        email: "shared@example.com".into(),
        postcode: "SW1A1AA".into(),
        location: None,
        opening_times: None,
        contact_info: None,
    };

    app.state
        .services
        .vendors
        .register_vendor(input(first.id))
        .await
        .expect("first registration failed");

    let err = app
        .state
        .services
        .vendors
        .register_vendor(input(second.id))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn updating_the_postcode_refreshes_coordinates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/postcodes/M11AE"))
        .respond_with(lookup_response(53.477, -2.239))
        .expect(1)
        .mount(&server)
        .await;

    let app = TestApp::with_geocoder(&server.uri()).await;
    let (user, _) = app.create_user("owner@example.com", UserRole::Vendor).await;
    let vendor = app
        .create_vendor_record(
            user.id,
            "Bakery",
            "bakery@example.com",
            51.5,
            -0.14,
            VendorStatus::Approved,
        )
        .await;

    let updated = app
        .state
        .services
        .vendors
        .update_vendor(
            vendor.id,
            UpdateVendorInput {
                postcode: Some("M11AE".into()),
                ..Default::default()
            },
        )
        .await
        .expect("update failed");

    assert_eq!(updated.postcode, "M11AE");
    assert_eq!(updated.latitude, 53.477);
    assert_eq!(updated.longitude, -2.239);
}

#[tokio::test]
async fn nearby_search_filters_by_distance_and_approval() {
    let server = MockServer::start().await;
    // Query point: central London
    Mock::given(method("GET"))
        .and(path("/postcodes/SW1A1AA"))
        .respond_with(lookup_response(51.5074, -0.1278))
        .mount(&server)
        .await;

    let app = TestApp::with_geocoder(&server.uri()).await;
    let (u1, _) = app.create_user("a@example.com", UserRole::Vendor).await;
    let (u2, _) = app.create_user("b@example.com", UserRole::Vendor).await;
    let (u3, _) = app.create_user("c@example.com", UserRole::Vendor).await;

    // ~1 mile away, approved
    app.create_vendor_record(u1.id, "Near", "near@example.com", 51.52, -0.13, VendorStatus::Approved)
        .await;
    // Manchester, approved (far outside ten miles)
    app.create_vendor_record(u2.id, "Far", "far@example.com", 53.48, -2.24, VendorStatus::Approved)
        .await;
    // Nearby but still pending approval
    app.create_vendor_record(
        u3.id,
        "Pending",
        "pending@example.com",
        51.51,
        -0.12,
        VendorStatus::Pending,
    )
    .await;

    let nearby = app
        .state
        .services
        .vendors
        .find_nearby("SW1A1AA", 10.0)
        .await
        .expect("search failed");

    assert_eq!(nearby.len(), 1);
    assert_eq!(nearby[0].vendor.name, "Near");
    assert!(nearby[0].distance_miles < 2.0);
}
