#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::Request, Router};
use chrono::Utc;
use marketplace_api::{
    auth::{AuthConfig, AuthService, SessionStore},
    config::AppConfig,
    db,
    entities::{user, vendor, UserModel, UserRole, VendorModel, VendorStatus},
    events::EventSender,
    handlers::AppServices,
    services::{shopify::ShopifyService, PostcodeClient},
    AppState,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_purposes_only_0123456789";

/// Application harness over an in-memory SQLite database.
///
/// The event channel is captured rather than processed so tests can
/// assert on emitted events; Shopify tests construct their service
/// directly against a wiremock server.
pub struct TestApp {
    pub state: AppState,
    pub auth_service: Arc<AuthService>,
    pub events: mpsc::Receiver<marketplace_api::events::Event>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_options(None, None).await
    }

    /// Point the geocoder at a wiremock base URL.
    pub async fn with_geocoder(base_url: &str) -> Self {
        Self::with_options(Some(base_url), None).await
    }

    pub async fn with_options(
        geocoder_base: Option<&str>,
        shopify: Option<Arc<ShopifyService>>,
    ) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "redis://127.0.0.1:6379".to_string(),
            TEST_JWT_SECRET.to_string(),
            3600,
            86_400,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        // A single connection keeps the in-memory database shared
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations");
        let db_arc = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);

        let redis_client =
            Arc::new(redis::Client::open(cfg.redis_url.clone()).expect("redis client"));
        let sessions = SessionStore::new(redis_client.clone(), Duration::from_secs(3600));
        let auth_service = Arc::new(AuthService::new(
            AuthConfig::new(TEST_JWT_SECRET.to_string(), Duration::from_secs(3600)),
            db_arc.clone(),
            sessions,
        ));

        let geocoder = PostcodeClient::new(
            geocoder_base.unwrap_or("http://127.0.0.1:1/postcodes-disabled"),
        );
        let services = AppServices::new(
            db_arc.clone(),
            Arc::new(event_sender.clone()),
            geocoder,
            shopify,
        );
        let graphql_schema =
            marketplace_api::graphql::build_schema(services.clone(), auth_service.clone());

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
            auth_service: auth_service.clone(),
            redis: redis_client,
            graphql_schema,
        };

        Self {
            state,
            auth_service,
            events: event_rx,
        }
    }

    /// The full application router, layered the way the binary builds
    /// it (minus CORS and compression).
    pub fn router(&self) -> Router {
        let auth_service = self.auth_service.clone();
        Router::new()
            .nest("/api/v1", marketplace_api::api_v1_routes())
            .nest(
                "/auth",
                marketplace_api::auth::auth_routes().with_state(auth_service.clone()),
            )
            .merge(marketplace_api::graphql::graphql_routes())
            .layer(axum::middleware::from_fn_with_state(
                auth_service,
                |axum::extract::State(auth): axum::extract::State<Arc<AuthService>>,
                 mut req: axum::extract::Request,
                 next: axum::middleware::Next| async move {
                    req.extensions_mut().insert(auth);
                    next.run(req).await
                },
            ))
            .layer(axum::middleware::from_fn(
                marketplace_api::middleware_helpers::request_id::request_id_middleware,
            ))
            .with_state(self.state.clone())
    }

    /// Insert a user directly and mint a JWT for it.
    pub async fn create_user(&self, email: &str, role: UserRole) -> (UserModel, String) {
        let now = Utc::now();
        let new_user = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_string()),
            password_hash: Set(marketplace_api::auth::hash_password("password123").unwrap()),
            role: Set(role),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = new_user
            .insert(&*self.state.db)
            .await
            .expect("failed to insert user");

        let token = self
            .auth_service
            .generate_token(&created)
            .expect("failed to mint token")
            .access_token;

        (created, token)
    }

    /// Insert a vendor row directly, bypassing geocoding.
    pub async fn create_vendor_record(
        &self,
        user_id: Uuid,
        name: &str,
        email: &str,
        latitude: f64,
        longitude: f64,
        status: VendorStatus,
    ) -> VendorModel {
        let now = Utc::now();
        let new_vendor = vendor::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            postcode: Set("SW1A 1AA".to_string()),
            latitude: Set(latitude),
            longitude: Set(longitude),
            location: Set(None),
            opening_times: Set(None),
            contact_info: Set(None),
            status: Set(status),
            created_at: Set(now),
            updated_at: Set(now),
        };
        new_vendor
            .insert(&*self.state.db)
            .await
            .expect("failed to insert vendor")
    }

    /// Insert a product directly.
    pub async fn create_product_record(
        &self,
        vendor_id: Uuid,
        title: &str,
        price: Decimal,
        stock: i32,
    ) -> marketplace_api::entities::ProductModel {
        use marketplace_api::entities::{product, ProductStatus};

        let now = Utc::now();
        let new_product = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            vendor_id: Set(vendor_id),
            title: Set(title.to_string()),
            description: Set(format!("{title} description")),
            price: Set(price),
            stock: Set(stock),
            product_type: Set(None),
            tags: Set(None),
            status: Set(ProductStatus::Active),
            shopify_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        new_product
            .insert(&*self.state.db)
            .await
            .expect("failed to insert product")
    }
}

/// Build a JSON request with an optional bearer token.
pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

/// Build a bodyless request with an optional bearer token.
pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// Read a JSON response body.
pub async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}
