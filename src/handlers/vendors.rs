use crate::auth::{AuthRouterExt, AuthenticatedUser};
use crate::handlers::common::{created_response, success_response, validate_input};
use crate::{
    errors::ApiError,
    services::vendors::{RegisterVendorInput, UpdateVendorInput},
    AppState,
};
use axum::{
    extract::{Json, State},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Routes for vendor self-service; all require authentication.
pub fn vendor_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register_vendor))
        .route("/update", put(update_vendor))
        .route("/me", get(my_vendor))
        .with_auth()
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterVendorRequest {
    #[validate(length(min = 1, max = 120, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[validate(length(min = 2, max = 10, message = "Postcode is required"))]
    pub postcode: String,
    pub location: Option<String>,
    pub opening_times: Option<String>,
    pub contact_info: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateVendorRequest {
    /// Admins may update any vendor; vendors may omit this and update
    /// their own record.
    pub id: Option<Uuid>,
    pub name: Option<String>,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: Option<String>,
    pub postcode: Option<String>,
    pub location: Option<String>,
    pub opening_times: Option<String>,
    pub contact_info: Option<String>,
}

/// Register a vendor for the authenticated account
#[utoipa::path(
    post,
    path = "/api/v1/vendor/register",
    request_body = RegisterVendorRequest,
    responses(
        (status = 201, description = "Vendor registered"),
        (status = 400, description = "Invalid payload or postcode", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Vendor"
)]
pub async fn register_vendor(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<RegisterVendorRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let vendor = state
        .services
        .vendors
        .register_vendor(RegisterVendorInput {
            user_id: user.user_id,
            name: payload.name,
            email: payload.email,
            postcode: payload.postcode,
            location: payload.location,
            opening_times: payload.opening_times,
            contact_info: payload.contact_info,
        })
        .await?;

    Ok(created_response(vendor))
}

/// Update the vendor profile
#[utoipa::path(
    put,
    path = "/api/v1/vendor/update",
    request_body = UpdateVendorRequest,
    responses(
        (status = 200, description = "Vendor updated"),
        (status = 400, description = "Invalid payload or postcode", body = crate::errors::ErrorResponse),
        (status = 403, description = "Not your vendor record", body = crate::errors::ErrorResponse),
        (status = 404, description = "Vendor not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Vendor"
)]
pub async fn update_vendor(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateVendorRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let vendor_id = resolve_vendor_id(&state, &user, payload.id).await?;

    let vendor = state
        .services
        .vendors
        .update_vendor(
            vendor_id,
            UpdateVendorInput {
                name: payload.name,
                email: payload.email,
                postcode: payload.postcode,
                location: payload.location,
                opening_times: payload.opening_times,
                contact_info: payload.contact_info,
            },
        )
        .await?;

    Ok(success_response(vendor))
}

/// The authenticated user's vendor record
#[utoipa::path(
    get,
    path = "/api/v1/vendor/me",
    responses(
        (status = 200, description = "Vendor profile"),
        (status = 404, description = "No vendor registered for this account", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Vendor"
)]
pub async fn my_vendor(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let vendor = state
        .services
        .vendors
        .get_vendor_for_user(user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No vendor registered for this account".into()))?;

    Ok(success_response(vendor))
}

/// Work out which vendor the caller may touch: their own unless they
/// are an admin naming another.
pub(crate) async fn resolve_vendor_id(
    state: &AppState,
    user: &AuthenticatedUser,
    requested: Option<Uuid>,
) -> Result<Uuid, ApiError> {
    let own = state
        .services
        .vendors
        .get_vendor_for_user(user.user_id)
        .await?;

    match requested {
        Some(id) => {
            if user.is_admin() || own.as_ref().map(|v| v.id) == Some(id) {
                Ok(id)
            } else {
                Err(ApiError::Forbidden(
                    "Cannot modify another vendor's record".into(),
                ))
            }
        }
        None => own
            .map(|v| v.id)
            .ok_or_else(|| ApiError::NotFound("No vendor registered for this account".into())),
    }
}
