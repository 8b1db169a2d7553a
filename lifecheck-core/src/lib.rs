//! Lifecheck Core - liveness verification orchestration
//!
//! This crate decides whether an uploaded video shows a live person matching
//! a user's reference photo, by delegating the judgment to an external
//! liveness capability and normalizing whatever it answers.
//!
//! # Components
//!
//! - [`media`] - upload validation (non-empty, declared type, size ceiling)
//! - [`staging`] - self-cleaning temporary storage for clips
//! - [`photos`] - reference photo storage
//! - [`gateway`] - HTTP and local-process liveness backends
//! - [`normalize`] - total mapping from raw replies to verdicts
//! - [`orchestrator`] - the end-to-end verify flow and staleness policy
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use lifecheck_core::{
//!     GatewayConfig, GatewayFactory, InMemoryUserDirectory, MediaPayload, PhotoStore,
//!     TemporaryMediaStore, VerificationOrchestrator,
//! };
//!
//! # async fn example() -> lifecheck_core::Result<()> {
//! let orchestrator = VerificationOrchestrator::new(
//!     Arc::new(InMemoryUserDirectory::new()),
//!     PhotoStore::new("uploads")?,
//!     TemporaryMediaStore::new("temp-videos")?,
//!     GatewayFactory::create(GatewayConfig::from_env())?,
//! );
//!
//! let clip = MediaPayload::new(std::fs::read("clip.mp4")?, Some("video/mp4".into()), None);
//! let report = orchestrator.verify("alice", clip).await?;
//! println!("{}", report.envelope.message);
//! # Ok(())
//! # }
//! ```

pub mod directory;
pub mod error;
pub mod gateway;
pub mod media;
pub mod normalize;
pub mod orchestrator;
pub mod photos;
pub mod staging;
pub mod verdict;

// Re-export main types for convenience
pub use directory::{InMemoryUserDirectory, UserDirectory, UserRecord};
pub use error::{LivenessError, Result};
pub use gateway::{
    Backend, GatewayConfig, GatewayFactory, HttpGateway, HttpGatewayConfig, LivenessGateway,
    ProcessGateway, ProcessGatewayConfig,
};
pub use media::{MediaKind, MediaPayload, Rejection, MAX_IMAGE_SIZE, MAX_VIDEO_SIZE};
pub use normalize::{normalize, RawExternalReply};
pub use orchestrator::{
    verification_required, Disposition, VerificationOrchestrator, VerificationReport,
    VerificationStatus, FRESHNESS_WINDOW_DAYS,
};
pub use photos::PhotoStore;
pub use staging::{StagedVideo, TemporaryMediaStore};
pub use verdict::{DetailValue, Details, VerificationResultEnvelope, VerificationVerdict};
