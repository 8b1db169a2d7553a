//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.

pub mod health;
pub mod profile_picture;
pub mod status;
pub mod user;
pub mod verify;

pub use crate::state::AppState;
pub use health::{health, ready, HealthResponse, ReadyResponse};
pub use profile_picture::{upload_profile_picture_handler, ProfilePictureResponse};
pub use status::verification_status_handler;
pub use user::{
    login_handler, profile_handler, register_handler, LoginRequest, RegisterResponse, UserProfile,
};
pub use verify::verify_handler;
