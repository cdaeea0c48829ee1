use crate::auth::{AuthRouterExt, AuthenticatedUser};
use crate::entities::OrderStatus;
use crate::handlers::common::{
    created_response, success_response, validate_input, PaginatedResponse, PaginationParams,
};
use crate::{
    errors::ApiError,
    services::orders::{CreateOrderInput, OrderItemInput},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Order endpoints; every route requires authentication.
pub fn orders_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/", post(create_order))
        .route("/:id", get(get_order))
        .route("/:id/status", put(update_order_status))
        .route("/:id/cancel", post(cancel_order))
        .with_auth()
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    pub vendor_id: Uuid,
    pub currency: Option<String>,
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

/// Orders visible to the caller: a vendor sees their own order book,
/// everyone sees the orders they placed.
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(PaginationParams),
    responses((status = 200, description = "Orders for the caller")),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let own_vendor = state
        .services
        .vendors
        .get_vendor_for_user(user.user_id)
        .await?;

    let (orders, total) = match own_vendor {
        Some(v) => {
            state
                .services
                .orders
                .list_for_vendor(v.id, pagination.page, pagination.per_page)
                .await?
        }
        None => {
            state
                .services
                .orders
                .list_for_customer(user.user_id, pagination.page, pagination.per_page)
                .await?
        }
    };

    Ok(success_response(PaginatedResponse::new(
        orders,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Place an order directly against a vendor
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created"),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let order = state
        .services
        .orders
        .create_order(CreateOrderInput {
            customer_id: Some(user.user_id),
            vendor_id: payload.vendor_id,
            currency: payload.currency,
            items: payload
                .items
                .into_iter()
                .map(|i| OrderItemInput {
                    product_id: i.product_id,
                    quantity: i.quantity,
                })
                .collect(),
        })
        .await?;

    Ok(created_response(serde_json::json!({
        "order": order.order,
        "items": order.items,
    })))
}

/// Fetch one order; only the vendor, the customer or an admin may see
/// it.
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with items"),
        (status = 403, description = "Not your order", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state.services.orders.get_order(id).await?;
    ensure_order_access(&state, &user, &order.order).await?;

    Ok(success_response(serde_json::json!({
        "order": order.order,
        "items": order.items,
    })))
}

/// Move an order to a new status (vendor or admin)
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order updated"),
        (status = 400, description = "Terminal order", body = crate::errors::ErrorResponse),
        (status = 403, description = "Not your order", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn update_order_status(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state.services.orders.get_order(id).await?;
    ensure_vendor_order_access(&state, &user, &order.order).await?;

    let updated = state
        .services
        .orders
        .update_status(id, payload.status)
        .await?;
    Ok(success_response(updated))
}

/// Cancel an order and restore stock
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order cancelled"),
        (status = 400, description = "Terminal order", body = crate::errors::ErrorResponse),
        (status = 403, description = "Not your order", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn cancel_order(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state.services.orders.get_order(id).await?;
    ensure_order_access(&state, &user, &order.order).await?;

    let cancelled = state.services.orders.cancel_order(id).await?;
    Ok(success_response(cancelled))
}

/// Vendor-of-record, customer-of-record or admin.
pub async fn ensure_order_access(
    state: &AppState,
    user: &AuthenticatedUser,
    order: &crate::entities::OrderModel,
) -> Result<(), ApiError> {
    if user.is_admin() || order.customer_id == Some(user.user_id) {
        return Ok(());
    }
    ensure_vendor_order_access(state, user, order).await
}

/// Vendor-of-record or admin only (status transitions).
pub async fn ensure_vendor_order_access(
    state: &AppState,
    user: &AuthenticatedUser,
    order: &crate::entities::OrderModel,
) -> Result<(), ApiError> {
    if user.is_admin() {
        return Ok(());
    }

    let own = state
        .services
        .vendors
        .get_vendor_for_user(user.user_id)
        .await?;
    if own.map(|v| v.id) == Some(order.vendor_id) {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Not your order".into()))
    }
}
