//! Verification status handler

use axum::{
    extract::{Path, State},
    Json,
};
use lifecheck_core::VerificationStatus;

use crate::error::ApiError;
use crate::handlers::AppState;

/// Get a user's verification status
///
/// `verificationRequired` is true when the user has never verified, or when
/// the last verification is 180 days old or more.
#[utoipa::path(
    get,
    path = "/verification-status/{username}",
    tag = "Verification",
    params(
        ("username" = String, Path, description = "User to query")
    ),
    responses(
        (status = 200, description = "Current status", body = VerificationStatus),
        (status = 404, description = "User not found")
    )
)]
pub async fn verification_status_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<VerificationStatus>, ApiError> {
    Ok(Json(state.orchestrator.status(&username).await?))
}
