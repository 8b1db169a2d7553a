use thiserror::Error;

use crate::media::Rejection;

#[derive(Error, Debug)]
pub enum LivenessError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User profile picture not found. Please upload a profile picture first.")]
    NoProfilePhoto,

    #[error("Invalid media: {0}")]
    InvalidMedia(#[from] Rejection),

    #[error("Liveness transport error: {0}")]
    Transport(String),

    #[error("Liveness capability error: {0}")]
    Capability(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("User directory error: {0}")]
    Directory(String),
}

impl LivenessError {
    /// Stable kind label echoed in diagnostics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UserNotFound(_) => "user_not_found",
            Self::NoProfilePhoto => "no_profile_photo",
            Self::InvalidMedia(_) => "invalid_media",
            Self::Transport(_) => "transport",
            Self::Capability(_) => "capability",
            Self::Internal(_) => "internal",
            Self::Directory(_) => "directory",
        }
    }

    /// The message without the variant prefix.
    pub fn detail(&self) -> String {
        match self {
            Self::UserNotFound(msg)
            | Self::Transport(msg)
            | Self::Capability(msg)
            | Self::Internal(msg)
            | Self::Directory(msg) => msg.clone(),
            Self::InvalidMedia(rejection) => rejection.to_string(),
            Self::NoProfilePhoto => self.to_string(),
        }
    }

    /// Whether the error came from reaching the external liveness capability.
    pub fn is_gateway_failure(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Capability(_))
    }
}

impl From<std::io::Error> for LivenessError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LivenessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_drops_variant_prefix() {
        let err = LivenessError::Transport("connection refused".into());
        assert_eq!(err.to_string(), "Liveness transport error: connection refused");
        assert_eq!(err.detail(), "connection refused");
        assert_eq!(
            LivenessError::NoProfilePhoto.detail(),
            LivenessError::NoProfilePhoto.to_string()
        );
    }
}
