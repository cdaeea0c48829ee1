use crate::handlers::common::{created_response, success_response, validate_input};
use crate::{
    errors::ApiError,
    services::carts::{AddToCartInput, CreateCartInput},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Cart endpoints. Carts work for anonymous sessions too, so no auth
/// gate here; checkout attaches the customer when one is known.
pub fn carts_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_cart))
        .route("/:id", get(get_cart))
        .route("/:id/items", post(add_item))
        .route("/:id/items/:item_id", delete(remove_item))
        .route("/:id/checkout", post(checkout))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCartRequest {
    pub customer_id: Option<Uuid>,
    pub session_id: Option<String>,
    #[validate(length(min = 3, max = 3, message = "Currency must be a 3-letter code"))]
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    #[serde(flatten)]
    pub cart: crate::entities::CartModel,
    pub items: Vec<crate::entities::CartItemModel>,
}

/// Create a cart
#[utoipa::path(
    post,
    path = "/api/v1/carts",
    request_body = CreateCartRequest,
    responses((status = 201, description = "Cart created")),
    tag = "Carts"
)]
pub async fn create_cart(
    State(state): State<AppState>,
    Json(payload): Json<CreateCartRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let cart = state
        .services
        .carts
        .create_cart(CreateCartInput {
            customer_id: payload.customer_id,
            session_id: payload.session_id,
            currency: payload.currency,
        })
        .await?;

    Ok(created_response(cart))
}

/// Fetch a cart with its items
#[utoipa::path(
    get,
    path = "/api/v1/carts/{id}",
    params(("id" = Uuid, Path, description = "Cart id")),
    responses(
        (status = 200, description = "Cart with items"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Carts"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let cart = state.services.carts.get_cart(id).await?;
    Ok(success_response(CartResponse {
        cart: cart.cart,
        items: cart.items,
    }))
}

/// Add a product to a cart
#[utoipa::path(
    post,
    path = "/api/v1/carts/{id}/items",
    params(("id" = Uuid, Path, description = "Cart id")),
    request_body = AddItemRequest,
    responses(
        (status = 200, description = "Cart updated"),
        (status = 404, description = "Cart or product not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "Carts"
)]
pub async fn add_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddItemRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let cart = state
        .services
        .carts
        .add_item(
            id,
            AddToCartInput {
                product_id: payload.product_id,
                quantity: payload.quantity,
            },
        )
        .await?;

    Ok(success_response(CartResponse {
        cart: cart.cart,
        items: cart.items,
    }))
}

/// Remove an item from a cart
#[utoipa::path(
    delete,
    path = "/api/v1/carts/{id}/items/{item_id}",
    params(
        ("id" = Uuid, Path, description = "Cart id"),
        ("item_id" = Uuid, Path, description = "Cart item id")
    ),
    responses(
        (status = 200, description = "Cart updated"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Carts"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let cart = state.services.carts.remove_item(id, item_id).await?;
    Ok(success_response(CartResponse {
        cart: cart.cart,
        items: cart.items,
    }))
}

/// Convert a cart into orders, one per vendor in the cart
#[utoipa::path(
    post,
    path = "/api/v1/carts/{id}/checkout",
    params(("id" = Uuid, Path, description = "Cart id")),
    responses(
        (status = 201, description = "Orders created"),
        (status = 400, description = "Cart empty or inactive", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "Carts"
)]
pub async fn checkout(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let cart = state.services.carts.get_cart(id).await?;
    let customer_id = cart.cart.customer_id;

    let orders = state
        .services
        .orders
        .checkout_cart(&state.services.carts, id, customer_id)
        .await?;

    let payload: Vec<_> = orders
        .into_iter()
        .map(|o| {
            serde_json::json!({
                "order": o.order,
                "items": o.items,
            })
        })
        .collect();

    Ok(created_response(payload))
}
