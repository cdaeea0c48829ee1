use crate::handlers::common::{success_response, validate_input};
use crate::{
    errors::ApiError,
    services::shopify::CheckoutLineItem,
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Checkout endpoints proxied to the Shopify Storefront API.
pub fn shopify_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(create_checkout))
        .route("/checkout/:checkout_id/line_items", post(add_line_items))
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LineItemRequest {
    pub variant_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CheckoutRequest {
    #[validate(length(min = 1, message = "At least one line item is required"))]
    pub line_items: Vec<LineItemRequest>,
}

/// Create a new checkout
#[utoipa::path(
    post,
    path = "/api/v1/shopify/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Checkout created"),
        (status = 400, description = "Integration not configured", body = crate::errors::ErrorResponse),
        (status = 502, description = "Shopify API failure", body = crate::errors::ErrorResponse)
    ),
    tag = "Shopify"
)]
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    let shopify = require_shopify(&state)?;

    let line_items = to_line_items(payload.line_items);
    let checkout = shopify.create_checkout(&line_items).await?;
    Ok(success_response(checkout))
}

/// Add line items to an existing checkout
#[utoipa::path(
    post,
    path = "/api/v1/shopify/checkout/{checkout_id}/line_items",
    params(("checkout_id" = String, Path, description = "Checkout id")),
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Line items added"),
        (status = 400, description = "Integration not configured", body = crate::errors::ErrorResponse),
        (status = 502, description = "Shopify API failure", body = crate::errors::ErrorResponse)
    ),
    tag = "Shopify"
)]
pub async fn add_line_items(
    State(state): State<AppState>,
    Path(checkout_id): Path<String>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    let shopify = require_shopify(&state)?;

    let line_items = to_line_items(payload.line_items);
    let checkout = shopify.add_line_items(&checkout_id, &line_items).await?;
    Ok(success_response(checkout))
}

fn require_shopify(
    state: &AppState,
) -> Result<std::sync::Arc<crate::services::ShopifyService>, ApiError> {
    state
        .services
        .shopify
        .clone()
        .ok_or_else(|| ApiError::BadRequest("Shopify integration is not configured".into()))
}

fn to_line_items(items: Vec<LineItemRequest>) -> Vec<CheckoutLineItem> {
    items
        .into_iter()
        .map(|i| CheckoutLineItem {
            variant_id: i.variant_id,
            quantity: i.quantity,
        })
        .collect()
}
