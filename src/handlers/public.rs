use crate::handlers::common::{success_response, PaginatedResponse, PaginationParams};
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

/// Unauthenticated browse and search surface.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/vendors", get(list_vendors))
        .route("/vendors/search", get(search_vendors))
        .route("/vendor/:vendor_id", get(get_vendor))
        .route("/vendor/:vendor_id/products", get(vendor_products))
        .route("/product/:product_id", get(get_product))
        .route("/products/search", get(search_products))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PostcodeSearchQuery {
    pub postcode: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct KeywordSearchQuery {
    pub keyword: String,
}

/// List approved vendors
#[utoipa::path(
    get,
    path = "/api/v1/public/vendors",
    params(PaginationParams),
    responses((status = 200, description = "A list of vendors")),
    tag = "Public"
)]
pub async fn list_vendors(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let (vendors, total) = state
        .services
        .vendors
        .list_vendors(pagination.page, pagination.per_page, true)
        .await?;

    Ok(success_response(PaginatedResponse::new(
        vendors,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Vendors within ten miles of a postcode
#[utoipa::path(
    get,
    path = "/api/v1/public/vendors/search",
    params(PostcodeSearchQuery),
    responses(
        (status = 200, description = "Vendors near the postcode"),
        (status = 400, description = "Invalid postcode", body = crate::errors::ErrorResponse)
    ),
    tag = "Public"
)]
pub async fn search_vendors(
    State(state): State<AppState>,
    Query(query): Query<PostcodeSearchQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let radius = state.config.search_radius_miles;
    let nearby = state
        .services
        .vendors
        .find_nearby(&query.postcode, radius)
        .await?;

    let vendors: Vec<_> = nearby.into_iter().map(|n| n.vendor).collect();
    Ok(success_response(vendors))
}

/// Fetch one vendor
#[utoipa::path(
    get,
    path = "/api/v1/public/vendor/{vendor_id}",
    params(("vendor_id" = Uuid, Path, description = "Vendor id")),
    responses(
        (status = 200, description = "A vendor"),
        (status = 404, description = "Vendor not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Public"
)]
pub async fn get_vendor(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let vendor = state.services.vendors.get_vendor(vendor_id).await?;
    Ok(success_response(vendor))
}

/// Products of one vendor
#[utoipa::path(
    get,
    path = "/api/v1/public/vendor/{vendor_id}/products",
    params(
        ("vendor_id" = Uuid, Path, description = "Vendor id"),
        PaginationParams
    ),
    responses((status = 200, description = "A list of products")),
    tag = "Public"
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

/// Fetch one product
#[utoipa::path(
    get,
    path = "/api/v1/public/product/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "A product"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Public"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let product = state.services.products.get_product(product_id).await?;
    Ok(success_response(product))
}

/// Keyword search over active products
#[utoipa::path(
    get,
    path = "/api/v1/public/products/search",
    params(KeywordSearchQuery),
    responses((status = 200, description = "Matching products")),
    tag = "Public"
)]
pub async fn search_products(
    State(state): State<AppState>,
    Query(query): Query<KeywordSearchQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let products = state
        .services
        .products
        .search_by_keyword(&query.keyword)
        .await?;
    Ok(success_response(products))
}
