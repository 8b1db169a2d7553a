//! Verdict and response envelope types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LivenessError;

/// Reason used when nothing more specific could be derived.
pub const DEFAULT_REASON: &str = "Verification completed";

/// A scalar diagnostic value echoed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetailValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl From<&str> for DetailValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for DetailValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for DetailValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for DetailValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<bool> for DetailValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// Free-form diagnostic fields, ordered for stable output.
pub type Details = BTreeMap<String, DetailValue>;

/// Normalized outcome of one liveness check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationVerdict {
    verified: bool,
    confidence: f64,
    reason: String,
    details: Details,
}

impl VerificationVerdict {
    /// Build a verdict. An empty reason is replaced by [`DEFAULT_REASON`] and
    /// confidence is clamped to `[0, 1]` (non-finite values become `0.0`).
    pub fn new(verified: bool, confidence: f64, reason: impl Into<String>, details: Details) -> Self {
        let reason = reason.into();
        let reason = if reason.trim().is_empty() {
            DEFAULT_REASON.to_string()
        } else {
            reason
        };

        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            verified,
            confidence,
            reason,
            details,
        }
    }

    pub fn verified(&self) -> bool {
        self.verified
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn into_details(self) -> Details {
        self.details
    }
}

/// Response shape returned to callers of the verify operation.
///
/// Exactly one of `verification_details` (on success) or `diagnostics`
/// (on failure) is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct VerificationResultEnvelope {
    pub success: bool,
    pub message: String,
    pub confidence: f64,
    pub username: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub verification_details: Option<Details>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub diagnostics: Option<Details>,
}

impl VerificationResultEnvelope {
    pub fn from_verdict(username: &str, verdict: VerificationVerdict, at: DateTime<Utc>) -> Self {
        let success = verdict.verified();
        let message = verdict.reason().to_string();
        let confidence = verdict.confidence();
        let details = verdict.into_details();

        let (verification_details, diagnostics) = if success {
            (Some(details), None)
        } else {
            (None, Some(details))
        };

        Self {
            success,
            message,
            confidence,
            username: username.to_string(),
            timestamp: at.timestamp_millis(),
            verification_details,
            diagnostics,
        }
    }

    /// Failure envelope for a liveness call that could not be completed.
    pub fn service_failure(username: &str, err: &LivenessError, at: DateTime<Utc>) -> Self {
        let mut diagnostics = Details::new();
        diagnostics.insert("error".into(), err.to_string().into());
        diagnostics.insert("errorKind".into(), err.kind().into());

        Self {
            success: false,
            message: format!("Verification service unavailable: {err}"),
            confidence: 0.0,
            username: username.to_string(),
            timestamp: at.timestamp_millis(),
            verification_details: None,
            diagnostics: Some(diagnostics),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_reason_never_empty() {
        let verdict = VerificationVerdict::new(false, 0.0, "  ", Details::new());
        assert_eq!(verdict.reason(), DEFAULT_REASON);
    }

    #[test]
    fn test_verdict_confidence_clamped() {
        assert_eq!(VerificationVerdict::new(true, 1.7, "x", Details::new()).confidence(), 1.0);
        assert_eq!(VerificationVerdict::new(true, -0.2, "x", Details::new()).confidence(), 0.0);
        assert_eq!(VerificationVerdict::new(true, f64::NAN, "x", Details::new()).confidence(), 0.0);
    }

    #[test]
    fn test_envelope_keys_depend_on_success() {
        let mut details = Details::new();
        details.insert("fullResult".into(), "ok".into());
        let now = Utc::now();

        let ok = VerificationResultEnvelope::from_verdict(
            "alice",
            VerificationVerdict::new(true, 0.9, "fine", details.clone()),
            now,
        );
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["verificationDetails"]["fullResult"], "ok");
        assert!(json.get("diagnostics").is_none());
        assert_eq!(json["timestamp"], now.timestamp_millis());

        let failed = VerificationResultEnvelope::from_verdict(
            "alice",
            VerificationVerdict::new(false, 0.0, "nope", details),
            now,
        );
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["diagnostics"]["fullResult"], "ok");
        assert!(json.get("verificationDetails").is_none());
        assert_eq!(json["success"], false);
    }

    #[test]
    fn test_service_failure_envelope() {
        let err = LivenessError::Transport("connection refused".into());
        let envelope = VerificationResultEnvelope::service_failure("bob", &err, Utc::now());

        assert!(!envelope.success);
        assert!(envelope.message.contains("connection refused"));
        let diagnostics = envelope.diagnostics.unwrap();
        assert_eq!(diagnostics["errorKind"], DetailValue::from("transport"));
    }

    #[test]
    fn test_detail_value_serializes_as_scalar() {
        let mut details = Details::new();
        details.insert("a".into(), true.into());
        details.insert("b".into(), 0.5.into());
        details.insert("c".into(), "text".into());
        assert_eq!(
            serde_json::to_string(&details).unwrap(),
            r#"{"a":true,"b":0.5,"c":"text"}"#
        );
    }
}
