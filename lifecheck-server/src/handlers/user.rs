//! User management handlers
//!
//! Registration, login and public profile lookup. Passwords are only ever
//! stored as Argon2id hashes.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use lifecheck_core::{media, LivenessError, MediaKind, UserRecord};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{hash_password_async, verify_password_async};
use crate::error::ApiError;
use crate::handlers::AppState;
use crate::multipart::MultipartFields;

/// Multipart field carrying the optional photo at registration
pub const PROFILE_PICTURE_FIELD: &str = "profilePicture";

const INVALID_CREDENTIALS: &str = "Invalid username or password!";

/// Public view of a user (never includes the password hash)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[schema(example = "alice")]
    pub username: String,
    /// Reference photo, relative to the upload directory
    pub profile_picture_path: Option<String>,
    pub last_verification_date: Option<DateTime<Utc>>,
}

impl From<UserRecord> for UserProfile {
    fn from(user: UserRecord) -> Self {
        Self {
            username: user.username,
            profile_picture_path: user.profile_picture_path,
            last_verification_date: user.last_verification_date,
        }
    }
}

/// Response for a registration
#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "User registered successfully!")]
    pub message: String,
    pub user: UserProfile,
}

/// Login credentials
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "alice")]
    pub username: String,
    pub password: String,
}

/// Register a new user
///
/// Accepts multipart/form-data with:
/// - **username** (required)
/// - **password** (required)
/// - **profilePicture** (optional): reference photo, `image/*`, at most 10 MB
#[utoipa::path(
    post,
    path = "/users/register",
    tag = "Users",
    request_body(
        content_type = "multipart/form-data",
        description = "username, password and optional profilePicture"
    ),
    responses(
        (status = 200, description = "User registered", body = RegisterResponse),
        (status = 400, description = "Missing field or invalid photo"),
        (status = 409, description = "Username is already taken")
    )
)]
pub async fn register_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<RegisterResponse>, ApiError> {
    let mut fields = MultipartFields::parse(&mut multipart, &[PROFILE_PICTURE_FIELD]).await?;
    let username = fields.require_text("username")?.to_string();
    let password = fields
        .get_text("password")
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing required field 'password'"))?
        .to_string();

    // A form file input left blank still sends an empty part
    let picture = fields
        .take_optional_file(PROFILE_PICTURE_FIELD)
        .filter(|p| !p.is_empty() || p.file_name.as_deref().is_some_and(|n| !n.is_empty()));
    if let Some(picture) = &picture {
        media::validate(picture, MediaKind::Image).map_err(LivenessError::from)?;
    }

    if state.directory().find_by_username(&username).await?.is_some() {
        return Err(ApiError::conflict("Username is already taken!"));
    }

    let mut record = UserRecord::new(&username, hash_password_async(password).await?);

    if let Some(picture) = picture {
        let reference = state
            .photos()
            .save(picture.data, picture.file_name.as_deref())
            .await?;
        record.profile_picture_path = Some(reference);
    }

    if !state.directory().create(record.clone()).await? {
        // Lost a race with a concurrent registration
        if let Some(path) = record.profile_picture().and_then(|r| state.photos().resolve(r)) {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove orphaned photo");
            }
        }
        return Err(ApiError::conflict("Username is already taken!"));
    }

    tracing::info!(username = %username, "User registered");

    Ok(Json(RegisterResponse {
        success: true,
        message: "User registered successfully!".to_string(),
        user: UserProfile::from(record),
    }))
}

/// Log in with username and password
#[utoipa::path(
    post,
    path = "/users/login",
    tag = "Users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = UserProfile),
        (status = 401, description = "Invalid username or password")
    )
)]
pub async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = state
        .directory()
        .find_by_username(&request.username)
        .await?
        .ok_or_else(|| ApiError::unauthorized(INVALID_CREDENTIALS))?;

    if !verify_password_async(request.password, user.password_hash.clone()).await {
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    Ok(Json(UserProfile::from(user)))
}

/// Get a user's public profile
#[utoipa::path(
    get,
    path = "/users/profile/{username}",
    tag = "Users",
    params(
        ("username" = String, Path, description = "User to look up")
    ),
    responses(
        (status = 200, description = "Public profile", body = UserProfile),
        (status = 404, description = "User not found")
    )
)]
pub async fn profile_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = state
        .directory()
        .find_by_username(&username)
        .await?
        .ok_or_else(|| LivenessError::UserNotFound(username.clone()))?;

    Ok(Json(UserProfile::from(user)))
}
