use crate::auth::AuthRouterExt;
use crate::entities::{DeletionRequestStatus, VendorStatus};
use crate::handlers::common::success_response;
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Admin-only surface: vendor approval, deletion-request processing
/// and the manual Shopify pull-sync trigger.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/approve-vendor/:id", put(approve_vendor))
        .route("/deletion-requests", get(list_deletion_requests))
        .route("/deletion-requests/:id/approve", post(approve_deletion))
        .route("/deletion-requests/:id/reject", post(reject_deletion))
        .route("/shopify/sync", post(trigger_shopify_sync))
        .with_role("admin")
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveVendorRequest {
    /// "approved" or "rejected"
    pub status: VendorStatus,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DeletionRequestsQuery {
    pub status: Option<DeletionRequestStatus>,
}

/// Approve or reject a vendor
#[utoipa::path(
    put,
    path = "/api/v1/admin/approve-vendor/{id}",
    params(("id" = Uuid, Path, description = "Vendor id")),
    request_body = ApproveVendorRequest,
    responses(
        (status = 200, description = "Vendor status updated"),
        (status = 400, description = "Invalid status", body = crate::errors::ErrorResponse),
        (status = 404, description = "Vendor not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn approve_vendor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApproveVendorRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let vendor = state
        .services
        .vendors
        .set_vendor_status(id, payload.status)
        .await?;

    let verb = match payload.status {
        VendorStatus::Approved => "approved",
        VendorStatus::Rejected => "rejected",
        VendorStatus::Pending => "pending",
    };

    Ok(success_response(serde_json::json!({
        "message": format!("Vendor {} successfully", verb),
        "vendor": vendor,
    })))
}

/// List deletion requests, optionally filtered by status
#[utoipa::path(
    get,
    path = "/api/v1/admin/deletion-requests",
    params(DeletionRequestsQuery),
    responses((status = 200, description = "Deletion requests")),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn list_deletion_requests(
    State(state): State<AppState>,
    Query(query): Query<DeletionRequestsQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let requests = state.services.deletion.list_requests(query.status).await?;
    Ok(success_response(requests))
}

/// Approve a deletion request; the account is removed immediately
#[utoipa::path(
    post,
    path = "/api/v1/admin/deletion-requests/{id}/approve",
    params(("id" = Uuid, Path, description = "Deletion request id")),
    responses(
        (status = 200, description = "Account deleted"),
        (status = 400, description = "Request already processed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Request not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn approve_deletion(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state.services.deletion.approve(id).await?;
    Ok(success_response(serde_json::json!({
        "message": "Deletion request approved"
    })))
}

/// Reject a deletion request
#[utoipa::path(
    post,
    path = "/api/v1/admin/deletion-requests/{id}/reject",
    params(("id" = Uuid, Path, description = "Deletion request id")),
    responses(
        (status = 200, description = "Request rejected"),
        (status = 400, description = "Request already processed", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn reject_deletion(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let request = state.services.deletion.reject(id).await?;
    Ok(success_response(request))
}

/// Pull the remote Shopify catalog and inventory into the local store
#[utoipa::path(
    post,
    path = "/api/v1/admin/shopify/sync",
    responses(
        (status = 200, description = "Sync summary"),
        (status = 400, description = "Shopify integration not configured", body = crate::errors::ErrorResponse),
        (status = 502, description = "Shopify API failure", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn trigger_shopify_sync(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let shopify = state
        .services
        .shopify
        .as_ref()
        .ok_or_else(|| ApiError::BadRequest("Shopify integration is not configured".into()))?;

    let summary = shopify.pull_catalog().await?;
    Ok(success_response(summary))
}
