//! Reference photo upload handler

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use lifecheck_core::{media, LivenessError, MediaKind};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::handlers::AppState;
use crate::multipart::MultipartFields;

/// Multipart field carrying the photo
pub const IMAGE_FIELD: &str = "image";

/// Response for a stored reference photo
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePictureResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "Profile picture uploaded successfully")]
    pub message: String,
    /// Stored reference, relative to the upload directory
    #[schema(example = "3f2b0c4e-8a1d-4c55-9a3e-2b6d1f0e7a91_portrait.jpg")]
    pub profile_picture_path: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

/// Upload or replace a user's reference photo
///
/// Accepts multipart/form-data with:
/// - **image** (required): the photo, declared as `image/*`, at most 10 MB
#[utoipa::path(
    post,
    path = "/upload-profile-picture/{username}",
    tag = "Users",
    params(
        ("username" = String, Path, description = "Photo owner")
    ),
    request_body(
        content_type = "multipart/form-data",
        description = "Photo in the `image` field"
    ),
    responses(
        (status = 200, description = "Photo stored", body = ProfilePictureResponse),
        (status = 400, description = "Missing, empty, oversized or non-image upload"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn upload_profile_picture_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ProfilePictureResponse>, ApiError> {
    let mut fields = MultipartFields::parse(&mut multipart, &[IMAGE_FIELD]).await?;
    let image = fields.take_file(IMAGE_FIELD);

    let mut user = state
        .directory()
        .find_by_username(&username)
        .await?
        .ok_or_else(|| LivenessError::UserNotFound(username.clone()))?;

    media::validate(&image, MediaKind::Image).map_err(LivenessError::from)?;

    let reference = state
        .photos()
        .save(image.data, image.file_name.as_deref())
        .await?;

    user.profile_picture_path = Some(reference.clone());
    state.directory().save(user).await?;

    tracing::info!(username = %username, reference = %reference, "Reference photo updated");

    Ok(Json(ProfilePictureResponse {
        success: true,
        message: "Profile picture uploaded successfully".to_string(),
        profile_picture_path: reference,
        timestamp: chrono::Utc::now().timestamp_millis(),
    }))
}
