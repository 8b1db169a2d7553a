//! OpenAPI documentation configuration
//!
//! Generates the OpenAPI 3 document for the lifecheck API.

use lifecheck_core::{VerificationResultEnvelope, VerificationStatus};
use utoipa::OpenApi;

use crate::handlers::{
    HealthResponse, LoginRequest, ProfilePictureResponse, ReadyResponse, RegisterResponse,
    UserProfile,
};

/// Lifecheck API - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lifecheck - Liveness Verification API",
        version = "0.1.0",
        description = r#"
## Periodic proof-of-life for registered users

Lifecheck confirms that an uploaded video shows a **live person** matching the
user's stored reference photo. The judgment itself is delegated to an external
liveness model, reached over HTTP or as a local process.

### How It Works

1. **Register** via `POST /users/register`, with a reference photo
2. Optionally replace the photo via `POST /upload-profile-picture/{username}`
3. **Verify** by uploading a short clip to `POST /verify/{username}`
4. Check whether a new verification is due via `GET /verification-status/{username}`

A verification stays valid for 180 days.
"#,
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    tags(
        (name = "Verification", description = "Liveness verification and status"),
        (name = "Users", description = "Registration, login and reference photos"),
        (name = "Health", description = "Service health and readiness endpoints")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::health::ready,
        crate::handlers::verify::verify_handler,
        crate::handlers::status::verification_status_handler,
        crate::handlers::profile_picture::upload_profile_picture_handler,
        crate::handlers::user::register_handler,
        crate::handlers::user::login_handler,
        crate::handlers::user::profile_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ReadyResponse,
            VerificationResultEnvelope,
            VerificationStatus,
            ProfilePictureResponse,
            RegisterResponse,
            LoginRequest,
            UserProfile,
        )
    )
)]
pub struct ApiDoc;
