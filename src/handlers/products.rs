use crate::auth::{AuthRouterExt, AuthenticatedUser};
use crate::entities::ProductStatus;
use crate::handlers::common::{
    created_response, no_content_response, success_response, validate_input, PaginatedResponse,
    PaginationParams,
};
use crate::{
    errors::ApiError,
    services::products::{
        AddImageInput, CreateProductInput, CreateVariantInput, UpdateProductInput,
        UpdateVariantInput,
    },
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{delete, get, post, put},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for product endpoints. Reads are public; writes
/// require a vendor (or admin) account.
pub fn products_routes() -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_product))
        .route("/:id", put(update_product))
        .route("/:id", delete(delete_product))
        .route("/:id/variants", post(create_variant))
        .route("/variants/:variant_id", put(update_variant))
        .route("/variants/:variant_id", delete(delete_variant))
        .route("/:id/images", post(add_image))
        .route("/images/:image_id", delete(delete_image))
        .with_role("vendor");

    Router::new()
        .route("/", get(list_products))
        .route("/:id", get(get_product))
        .route("/:id/variants", get(get_product_variants))
        .route("/:id/images", get(get_product_images))
        .route("/variants/:variant_id", get(get_variant))
        .merge(protected)
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    /// Admins may create on behalf of any vendor
    pub vendor_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub product_type: Option<String>,
    pub tags: Option<String>,
    pub status: Option<ProductStatus>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub product_type: Option<String>,
    pub tags: Option<String>,
    pub status: Option<ProductStatus>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateVariantRequest {
    #[validate(length(min = 1, max = 64, message = "SKU is required"))]
    pub sku: String,
    pub option1: Option<String>,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub stock: i32,
    pub barcode: Option<String>,
    pub weight: Option<Decimal>,
    pub weight_unit: Option<String>,
    pub position: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddImageRequest {
    #[validate(url(message = "Image src must be a URL"))]
    pub src: String,
    pub alt_text: Option<String>,
    pub position: Option<i32>,
}

/// Storefront listing of active products
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(PaginationParams),
    responses((status = 200, description = "Active products")),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let (products, total) = state
        .services
        .products
        .list_storefront(pagination.page, pagination.per_page)
        .await?;

    Ok(success_response(PaginatedResponse::new(
        products,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Create a product for the caller's vendor
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created"),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn create_product(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let vendor_id =
        super::vendors::resolve_vendor_id(&state, &user, payload.vendor_id).await?;

    let product = state
        .services
        .products
        .create_product(CreateProductInput {
            vendor_id,
            title: payload.title,
            description: payload.description,
            price: payload.price,
            stock: payload.stock,
            product_type: payload.product_type,
            tags: payload.tags,
            status: payload.status,
        })
        .await?;

    Ok(created_response(product))
}

/// Fetch one product
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "A product"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let product = state.services.products.get_product(id).await?;
    Ok(success_response(product))
}

/// Update a product owned by the caller
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated"),
        (status = 403, description = "Not your product", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn update_product(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    ensure_product_access(&state, &user, id).await?;

    let product = state
        .services
        .products
        .update_product(
            id,
            UpdateProductInput {
                title: payload.title,
                description: payload.description,
                price: payload.price,
                stock: payload.stock,
                product_type: payload.product_type,
                tags: payload.tags,
                status: payload.status,
            },
        )
        .await?;

    Ok(success_response(product))
}

/// Delete a product owned by the caller
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 403, description = "Not your product", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn delete_product(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    ensure_product_access(&state, &user, id).await?;
    state.services.products.delete_product(id).await?;
    Ok(no_content_response())
}

/// List variants of a product
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/variants",
    params(("id" = Uuid, Path, description = "Product id")),
    responses((status = 200, description = "Product variants")),
    tag = "Products"
)]
pub async fn get_product_variants(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let variants = state.services.products.list_variants(id).await?;
    Ok(success_response(variants))
}

/// Fetch one variant
#[utoipa::path(
    get,
    path = "/api/v1/products/variants/{variant_id}",
    params(("variant_id" = Uuid, Path, description = "Variant id")),
    responses(
        (status = 200, description = "A variant"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn get_variant(
    State(state): State<AppState>,
    Path(variant_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let variant = state.services.products.get_variant(variant_id).await?;
    Ok(success_response(variant))
}

/// Add a variant to a product owned by the caller
#[utoipa::path(
    post,
    path = "/api/v1/products/{id}/variants",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = CreateVariantRequest,
    responses(
        (status = 201, description = "Variant created"),
        (status = 403, description = "Not your product", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn create_variant(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateVariantRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    ensure_product_access(&state, &user, id).await?;

    let variant = state
        .services
        .products
        .create_variant(CreateVariantInput {
            product_id: id,
            sku: payload.sku,
            option1: payload.option1,
            price: payload.price,
            compare_at_price: payload.compare_at_price,
            stock: payload.stock,
            barcode: payload.barcode,
            weight: payload.weight,
            weight_unit: payload.weight_unit,
            position: payload.position,
        })
        .await?;

    Ok(created_response(variant))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateVariantRequest {
    pub option1: Option<String>,
    pub price: Option<Decimal>,
    pub compare_at_price: Option<Decimal>,
    pub stock: Option<i32>,
    pub barcode: Option<String>,
    pub weight: Option<Decimal>,
    pub weight_unit: Option<String>,
    pub position: Option<i32>,
}

/// Update a variant on a product owned by the caller
#[utoipa::path(
    put,
    path = "/api/v1/products/variants/{variant_id}",
    params(("variant_id" = Uuid, Path, description = "Variant id")),
    request_body = UpdateVariantRequest,
    responses(
        (status = 200, description = "Variant updated"),
        (status = 403, description = "Not your product", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn update_variant(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(variant_id): Path<Uuid>,
    Json(payload): Json<UpdateVariantRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let variant = state.services.products.get_variant(variant_id).await?;
    ensure_product_access(&state, &user, variant.product_id).await?;

    let updated = state
        .services
        .products
        .update_variant(
            variant_id,
            UpdateVariantInput {
                option1: payload.option1,
                price: payload.price,
                compare_at_price: payload.compare_at_price,
                stock: payload.stock,
                barcode: payload.barcode,
                weight: payload.weight,
                weight_unit: payload.weight_unit,
                position: payload.position,
            },
        )
        .await?;

    Ok(success_response(updated))
}

/// Delete a variant from a product owned by the caller
#[utoipa::path(
    delete,
    path = "/api/v1/products/variants/{variant_id}",
    params(("variant_id" = Uuid, Path, description = "Variant id")),
    responses(
        (status = 204, description = "Variant deleted"),
        (status = 403, description = "Not your product", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn delete_variant(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(variant_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let variant = state.services.products.get_variant(variant_id).await?;
    ensure_product_access(&state, &user, variant.product_id).await?;

    state.services.products.delete_variant(variant_id).await?;
    Ok(no_content_response())
}

/// List images of a product
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/images",
    params(("id" = Uuid, Path, description = "Product id")),
    responses((status = 200, description = "Product images")),
    tag = "Products"
)]
pub async fn get_product_images(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let images = state.services.products.list_images(id).await?;
    Ok(success_response(images))
}

/// Attach an image to a product owned by the caller
#[utoipa::path(
    post,
    path = "/api/v1/products/{id}/images",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = AddImageRequest,
    responses(
        (status = 201, description = "Image added"),
        (status = 403, description = "Not your product", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn add_image(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddImageRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    ensure_product_access(&state, &user, id).await?;

    let image = state
        .services
        .products
        .add_image(AddImageInput {
            product_id: id,
            src: payload.src,
            alt_text: payload.alt_text,
            position: payload.position,
        })
        .await?;

    Ok(created_response(image))
}

/// Remove an image from a product owned by the caller
#[utoipa::path(
    delete,
    path = "/api/v1/products/images/{image_id}",
    params(("image_id" = Uuid, Path, description = "Image id")),
    responses(
        (status = 204, description = "Image deleted"),
        (status = 403, description = "Not your product", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn delete_image(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(image_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let image = state.services.products.get_image(image_id).await?;
    ensure_product_access(&state, &user, image.product_id).await?;

    state.services.products.delete_image(image_id).await?;
    Ok(no_content_response())
}

/// Vendors may touch only their own products; admins may touch any.
pub async fn ensure_product_access(
    state: &AppState,
    user: &AuthenticatedUser,
    product_id: Uuid,
) -> Result<(), ApiError> {
    if user.is_admin() {
        // Still confirm the product exists
        state.services.products.get_product(product_id).await?;
        return Ok(());
    }

    let own = state
        .services
        .vendors
        .get_vendor_for_user(user.user_id)
        .await?
        .ok_or_else(|| ApiError::Forbidden("No vendor registered for this account".into()))?;

    state
        .services
        .products
        .ensure_owned_by(product_id, own.id)
        .await?;
    Ok(())
}
