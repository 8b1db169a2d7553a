//! Verification orchestration.
//!
//! [`VerificationOrchestrator::verify`] runs one liveness check end to end:
//!
//! 1. resolve the user (no side effects on a miss)
//! 2. validate the uploaded clip
//! 3. resolve the user's reference photo on disk
//! 4. stage the clip
//! 5. call the configured [`LivenessGateway`]
//! 6. normalize the reply into a verdict
//! 7. on success, stamp the user's last-verification time
//!
//! The staged clip is released whichever way step 5 ends. The gateway call
//! runs on its own task that owns the staged clip, so a caller dropping the
//! request lets the external call finish and still cleans up.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::directory::{UserDirectory, UserRecord};
use crate::error::{LivenessError, Result};
use crate::gateway::{Backend, LivenessGateway};
use crate::media::{self, MediaKind, MediaPayload};
use crate::normalize::normalize;
use crate::photos::PhotoStore;
use crate::staging::TemporaryMediaStore;
use crate::verdict::VerificationResultEnvelope;

/// A verification older than this many days must be redone.
pub const FRESHNESS_WINDOW_DAYS: i64 = 180;

/// Whether a user must verify again at `now`.
///
/// Required when there is no prior verification, or when at least
/// [`FRESHNESS_WINDOW_DAYS`] whole days have elapsed since it.
pub fn verification_required(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last {
        None => true,
        Some(last) => now.signed_duration_since(last) >= Duration::days(FRESHNESS_WINDOW_DAYS),
    }
}

/// How a completed verify call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The capability confirmed a live person
    Verified,
    /// The capability answered, but did not confirm
    Rejected,
    /// The capability could not be reached or refused the call
    ServiceFailure,
}

/// Outcome of [`VerificationOrchestrator::verify`].
#[derive(Debug, Clone)]
pub struct VerificationReport {
    pub disposition: Disposition,
    pub envelope: VerificationResultEnvelope,
}

impl VerificationReport {
    pub fn is_verified(&self) -> bool {
        self.disposition == Disposition::Verified
    }
}

/// Read-only verification status of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct VerificationStatus {
    pub username: String,
    pub last_verification_date: Option<DateTime<Utc>>,
    pub verification_required: bool,
    pub has_profile_picture: bool,
}

impl VerificationStatus {
    pub fn of(user: &UserRecord, now: DateTime<Utc>) -> Self {
        Self {
            username: user.username.clone(),
            last_verification_date: user.last_verification_date,
            verification_required: verification_required(user.last_verification_date, now),
            has_profile_picture: user.has_profile_picture(),
        }
    }
}

/// Coordinates validation, staging, the liveness call and persistence.
#[derive(Clone)]
pub struct VerificationOrchestrator {
    directory: Arc<dyn UserDirectory>,
    photos: PhotoStore,
    staging: TemporaryMediaStore,
    gateway: Arc<dyn LivenessGateway>,
}

impl std::fmt::Debug for VerificationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationOrchestrator")
            .field("directory", &self.directory.name())
            .field("photos", &self.photos.dir())
            .field("staging", &self.staging.dir())
            .field("backend", &self.gateway.backend())
            .finish()
    }
}

impl VerificationOrchestrator {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        photos: PhotoStore,
        staging: TemporaryMediaStore,
        gateway: Arc<dyn LivenessGateway>,
    ) -> Self {
        Self {
            directory,
            photos,
            staging,
            gateway,
        }
    }

    pub fn directory(&self) -> &Arc<dyn UserDirectory> {
        &self.directory
    }

    pub fn photos(&self) -> &PhotoStore {
        &self.photos
    }

    pub fn backend(&self) -> Backend {
        self.gateway.backend()
    }

    /// Run one liveness verification for `username`.
    ///
    /// Fails with `UserNotFound`, `InvalidMedia`, `NoProfilePhoto`, or
    /// `Internal` for local staging and I/O problems. A capability that cannot
    /// be reached is not an error here: it yields a failure envelope with
    /// [`Disposition::ServiceFailure`].
    #[instrument(
        level = "info",
        skip(self, video),
        fields(video_bytes = video.len(), backend = %self.gateway.backend())
    )]
    pub async fn verify(&self, username: &str, video: MediaPayload) -> Result<VerificationReport> {
        let start = Instant::now();

        let mut user = self.find_user(username).await?;

        media::validate(&video, MediaKind::Video)?;

        let reference_photo = self.reference_photo(&user).await?;

        let staged = self
            .staging
            .stage(video.data, video.file_name.as_deref())
            .await?;

        let gateway = Arc::clone(&self.gateway);
        let call = tokio::spawn(async move {
            let reply = gateway.check(&reference_photo, staged.path()).await;
            staged.release();
            reply
        });

        let reply = match call.await {
            Ok(reply) => reply,
            Err(e) => {
                return Err(LivenessError::Internal(format!("Liveness task failed: {e}")));
            }
        };

        let reply = match reply {
            Ok(reply) => reply,
            Err(err) if err.is_gateway_failure() => {
                warn!(
                    error = %err,
                    kind = err.kind(),
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Liveness service failed"
                );
                return Ok(VerificationReport {
                    disposition: Disposition::ServiceFailure,
                    envelope: VerificationResultEnvelope::service_failure(
                        username,
                        &err,
                        Utc::now(),
                    ),
                });
            }
            Err(err) => return Err(err),
        };

        let verdict = normalize(&reply);
        let now = Utc::now();

        let disposition = if verdict.verified() {
            let stamp = next_timestamp(user.last_verification_date, now);
            user.last_verification_date = Some(stamp);
            self.directory.save(user).await?;
            Disposition::Verified
        } else {
            Disposition::Rejected
        };

        info!(
            verified = verdict.verified(),
            confidence = verdict.confidence(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Verification finished"
        );

        Ok(VerificationReport {
            disposition,
            envelope: VerificationResultEnvelope::from_verdict(username, verdict, now),
        })
    }

    /// Current verification status of `username`.
    pub async fn status(&self, username: &str) -> Result<VerificationStatus> {
        self.status_at(username, Utc::now()).await
    }

    /// Verification status of `username` as of `now`.
    pub async fn status_at(&self, username: &str, now: DateTime<Utc>) -> Result<VerificationStatus> {
        let user = self.find_user(username).await?;
        Ok(VerificationStatus::of(&user, now))
    }

    async fn find_user(&self, username: &str) -> Result<UserRecord> {
        self.directory
            .find_by_username(username)
            .await?
            .ok_or_else(|| LivenessError::UserNotFound(username.to_string()))
    }

    async fn reference_photo(&self, user: &UserRecord) -> Result<PathBuf> {
        let Some(reference) = user.profile_picture() else {
            return Err(LivenessError::NoProfilePhoto);
        };

        match self.photos.resolve_existing(reference).await {
            Some(path) => Ok(path),
            None => {
                warn!(reference, "Recorded reference photo is missing on disk");
                Err(LivenessError::NoProfilePhoto)
            }
        }
    }
}

/// A stamp strictly later than `previous`, normally `now`.
fn next_timestamp(previous: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match previous {
        Some(previous) if now <= previous => previous + Duration::milliseconds(1),
        _ => now,
    }
}
