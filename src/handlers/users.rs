use crate::auth::{AuthRouterExt, AuthenticatedUser};
use crate::handlers::common::{created_response, success_response, PaginatedResponse, PaginationParams};
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Authenticated customer surface: proximity search with a caller
/// chosen radius, vendor catalogs, account deletion.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/vendors/nearby", get(vendors_nearby))
        .route("/vendor/:vendor_id/products", get(vendor_products))
        .route("/deletion-request", post(request_deletion))
        .with_auth()
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct NearbyQuery {
    pub postcode: String,
    /// Radius in miles; defaults to the configured search radius
    pub radius: Option<f64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeletionRequestBody {
    pub reason: Option<String>,
}

/// Vendors within a radius of a postcode
#[utoipa::path(
    get,
    path = "/api/v1/user/vendors/nearby",
    params(NearbyQuery),
    responses(
        (status = 200, description = "Vendors within the radius"),
        (status = 400, description = "Invalid postcode", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "User"
)]
pub async fn vendors_nearby(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let radius = query.radius.unwrap_or(state.config.search_radius_miles);
    if !(radius > 0.0) {
        return Err(ApiError::ValidationError("radius must be positive".into()));
    }

    let nearby = state
        .services
        .vendors
        .find_nearby(&query.postcode, radius)
        .await?;

    let payload: Vec<_> = nearby
        .into_iter()
        .map(|n| {
            serde_json::json!({
                "vendor": n.vendor,
                "distance_miles": (n.distance_miles * 100.0).round() / 100.0,
            })
        })
        .collect();

    Ok(success_response(payload))
}

/// Products of one vendor
#[utoipa::path(
    get,
    path = "/api/v1/user/vendor/{vendor_id}/products",
    operation_id = "user_vendor_products",
    params(("vendor_id" = Uuid, Path, description = "Vendor id"), PaginationParams),
    responses((status = 200, description = "A list of products")),
    security(("Bearer" = [])),
    tag = "User"
)]
pub async fn vendor_products(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let (products, total) = state
        .services
        .products
        .list_by_vendor(vendor_id, pagination.page, pagination.per_page)
        .await?;

    Ok(success_response(PaginatedResponse::new(
        products,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// File an account deletion request
#[utoipa::path(
    post,
    path = "/api/v1/user/deletion-request",
    request_body = DeletionRequestBody,
    responses(
        (status = 201, description = "Deletion request filed"),
        (status = 409, description = "A request is already pending", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "User"
)]
pub async fn request_deletion(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<DeletionRequestBody>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let request = state
        .services
        .deletion
        .request_deletion(user.user_id, payload.reason)
        .await?;

    Ok(created_response(request))
}
