//! Liveness verification handler
//!
//! Handles POST /verify/{username} requests.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use lifecheck_core::{Disposition, VerificationResultEnvelope};

use crate::error::ApiError;
use crate::handlers::AppState;
use crate::multipart::MultipartFields;

/// Multipart field carrying the clip
pub const VIDEO_FIELD: &str = "video";

/// Verify that an uploaded clip shows the user's live face
///
/// Accepts multipart/form-data with:
/// - **video** (required): the clip, declared as `video/*`, at most 50 MB
///
/// The clip is compared against the user's stored reference photo by the
/// configured liveness backend. The response body is always a verification
/// envelope; the status tells the outcome:
/// - 200: verified, the user's last-verification date is updated
/// - 400: not verified (diagnostics included), or the upload was rejected
/// - 404: unknown user
/// - 500: the liveness service could not be reached, or a local failure
#[utoipa::path(
    post,
    path = "/verify/{username}",
    tag = "Verification",
    params(
        ("username" = String, Path, description = "User to verify")
    ),
    request_body(
        content_type = "multipart/form-data",
        description = "Clip in the `video` field"
    ),
    responses(
        (status = 200, description = "Live person verified", body = VerificationResultEnvelope),
        (status = 400, description = "Verification failed or upload rejected", body = VerificationResultEnvelope),
        (status = 404, description = "User not found"),
        (status = 500, description = "Liveness service unavailable or internal error", body = VerificationResultEnvelope)
    )
)]
pub async fn verify_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<VerificationResultEnvelope>), ApiError> {
    let mut fields = MultipartFields::parse(&mut multipart, &[VIDEO_FIELD]).await?;
    let video = fields.take_file(VIDEO_FIELD);

    let report = state.orchestrator.verify(&username, video).await?;

    let status = match report.disposition {
        Disposition::Verified => StatusCode::OK,
        Disposition::Rejected => StatusCode::BAD_REQUEST,
        Disposition::ServiceFailure => StatusCode::INTERNAL_SERVER_ERROR,
    };

    Ok((status, Json(report.envelope)))
}
