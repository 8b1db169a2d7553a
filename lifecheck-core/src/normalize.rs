//! Normalization of liveness replies into a [`VerificationVerdict`].
//!
//! The external capability answers in one of two ways depending on the
//! backend: a JSON document shaped `[markdownText, structuredDetails]`
//! (bare or under a `data` key), or a process exit code plus captured text.
//! [`normalize`] is total: every input yields a verdict, falling back to an
//! "Unexpected response format" verdict that carries the raw text.

use serde_json::Value;

use crate::verdict::{DetailValue, Details, VerificationVerdict, DEFAULT_REASON};

/// Full success marker emitted by the liveness model.
pub const VERIFIED_GENUINE_MARKER: &str = "✅ VERIFIED - GENUINE PERSON";
/// Bare success token.
pub const VERIFIED_TOKEN: &str = "VERIFIED";
/// Bare genuineness token.
pub const GENUINE_TOKEN: &str = "GENUINE";

const FAILED_MARKER: &str = "❌ VERIFICATION FAILED";
const SPOOFING_MARKER: &str = "❌ SPOOFING SUSPECTED";
const VERIFIED_MARKER: &str = "✅ VERIFIED";

pub const REASON_FAILED: &str = "Verification failed — please try again";
pub const REASON_SPOOFING: &str = "Spoofing detected — please ensure you are a real person";
pub const REASON_VERIFIED: &str = "Verification successful — genuine person detected";
pub const REASON_UNEXPECTED: &str = "Unexpected response format";

/// Raw reply from a liveness backend, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawExternalReply {
    /// Response body of the HTTP backend
    Http { body: String },
    /// Exit status and combined stdout/stderr of the process backend.
    /// `exit_code` is `None` when the process was terminated by a signal.
    Process {
        exit_code: Option<i32>,
        output: String,
    },
}

/// Structural classification of an HTTP reply body.
#[derive(Debug)]
enum Reply<'a> {
    /// `[markdownText, structuredDetails, ...]`
    TwoElementArray {
        markdown: String,
        structured: &'a Value,
    },
    /// `{"data": [markdownText, structuredDetails, ...]}`
    NestedUnderData {
        markdown: String,
        structured: &'a Value,
    },
    Unrecognized,
}

impl<'a> Reply<'a> {
    fn classify(document: &'a Value) -> Self {
        if let Some(data) = document.get("data").and_then(Value::as_array) {
            return match data.as_slice() {
                [markdown, structured, ..] => Reply::NestedUnderData {
                    markdown: markdown_text(markdown),
                    structured,
                },
                _ => Reply::Unrecognized,
            };
        }

        match document.as_array().map(Vec::as_slice) {
            Some([markdown, structured, ..]) => Reply::TwoElementArray {
                markdown: markdown_text(markdown),
                structured,
            },
            _ => Reply::Unrecognized,
        }
    }
}

/// Turn any backend reply into a verdict. Never fails.
pub fn normalize(reply: &RawExternalReply) -> VerificationVerdict {
    match reply {
        RawExternalReply::Http { body } => normalize_http(body),
        RawExternalReply::Process { exit_code, output } => normalize_process(*exit_code, output),
    }
}

fn normalize_http(body: &str) -> VerificationVerdict {
    let Ok(document) = serde_json::from_str::<Value>(body) else {
        return unexpected(body);
    };

    match Reply::classify(&document) {
        Reply::TwoElementArray {
            markdown,
            structured,
        }
        | Reply::NestedUnderData {
            markdown,
            structured,
        } => from_markdown(&markdown, structured),
        Reply::Unrecognized => unexpected(body),
    }
}

fn from_markdown(markdown: &str, structured: &Value) -> VerificationVerdict {
    let verified = is_verified(markdown);
    let reason = reason_for(markdown);

    let mut details = flatten_details(structured);
    let confidence = extract_confidence(structured);
    details.insert("fullResult".into(), markdown.into());

    VerificationVerdict::new(verified, confidence, reason, details)
}

fn normalize_process(exit_code: Option<i32>, output: &str) -> VerificationVerdict {
    let verified = exit_code == Some(0);
    let text = output.trim();

    let prefix = if verified {
        "Liveness check passed"
    } else {
        "Liveness check failed"
    };
    let reason = if text.is_empty() {
        prefix.to_string()
    } else {
        format!("{prefix}: {text}")
    };

    let mut details = Details::new();
    details.insert("fullResult".into(), output.into());
    details.insert(
        "exitCode".into(),
        match exit_code {
            Some(code) => code.into(),
            None => "terminated by signal".into(),
        },
    );

    VerificationVerdict::new(verified, 0.0, reason, details)
}

fn unexpected(raw: &str) -> VerificationVerdict {
    let mut details = Details::new();
    details.insert("rawResponse".into(), raw.into());
    VerificationVerdict::new(false, 0.0, REASON_UNEXPECTED, details)
}

/// Case-sensitive substring search for any success marker.
pub fn is_verified(markdown: &str) -> bool {
    [VERIFIED_GENUINE_MARKER, VERIFIED_TOKEN, GENUINE_TOKEN]
        .iter()
        .any(|marker| markdown.contains(marker))
}

/// Reason text, by marker precedence: failure, spoofing, verified.
pub fn reason_for(markdown: &str) -> &'static str {
    if markdown.contains(FAILED_MARKER) {
        REASON_FAILED
    } else if markdown.contains(SPOOFING_MARKER) {
        REASON_SPOOFING
    } else if markdown.contains(VERIFIED_MARKER) {
        REASON_VERIFIED
    } else {
        DEFAULT_REASON
    }
}

fn markdown_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Flatten an object into scalar details. Non-object payloads degrade to an
/// empty map with a `parseError` entry; `null` means no details at all.
fn flatten_details(structured: &Value) -> Details {
    let mut details = Details::new();

    match structured {
        Value::Object(fields) => {
            for (key, value) in fields {
                let scalar = match value {
                    Value::String(s) => DetailValue::Text(s.clone()),
                    Value::Number(n) => n
                        .as_f64()
                        .map(DetailValue::Number)
                        .unwrap_or_else(|| DetailValue::Text(n.to_string())),
                    Value::Bool(b) => DetailValue::Flag(*b),
                    other => DetailValue::Text(other.to_string()),
                };
                details.insert(key.clone(), scalar);
            }
        }
        Value::Null => {}
        other => {
            details.insert(
                "parseError".into(),
                format!("structured details is not an object: {}", type_name(other)).into(),
            );
        }
    }

    details
}

/// `confidence` at the top level, else `details.confidence`, else `0.0`.
fn extract_confidence(structured: &Value) -> f64 {
    structured
        .get("confidence")
        .and_then(as_number)
        .or_else(|| {
            structured
                .get("details")
                .and_then(|nested| nested.get("confidence"))
                .and_then(as_number)
        })
        .unwrap_or(0.0)
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(body: &str) -> VerificationVerdict {
        normalize(&RawExternalReply::Http {
            body: body.to_string(),
        })
    }

    #[test]
    fn test_genuine_person_verdict() {
        let verdict = http(r#"["✅ VERIFIED - GENUINE PERSON", {"confidence": 0.92}]"#);

        assert!(verdict.verified());
        assert_eq!(verdict.confidence(), 0.92);
        assert_eq!(verdict.reason(), REASON_VERIFIED);
        assert_eq!(verdict.details()["confidence"], DetailValue::Number(0.92));
        assert_eq!(
            verdict.details()["fullResult"],
            DetailValue::from("✅ VERIFIED - GENUINE PERSON")
        );
    }

    #[test]
    fn test_spoofing_verdict() {
        let verdict = http(r#"["❌ SPOOFING SUSPECTED", {}]"#);

        assert!(!verdict.verified());
        assert_eq!(verdict.confidence(), 0.0);
        assert_eq!(verdict.reason(), REASON_SPOOFING);
        assert_eq!(
            verdict.details()["fullResult"],
            DetailValue::from("❌ SPOOFING SUSPECTED")
        );
    }

    #[test]
    fn test_failed_marker_takes_precedence() {
        let verdict = http(r#"["❌ VERIFICATION FAILED\n❌ SPOOFING SUSPECTED", null]"#);
        assert!(!verdict.verified());
        assert_eq!(verdict.reason(), REASON_FAILED);
    }

    #[test]
    fn test_nested_under_data() {
        let verdict = http(
            r#"{"data": ["Result: GENUINE", {"details": {"confidence": 0.75}, "blinks": 3, "ok": true}]}"#,
        );

        assert!(verdict.verified());
        assert_eq!(verdict.confidence(), 0.75);
        assert_eq!(verdict.reason(), DEFAULT_REASON);
        assert_eq!(verdict.details()["blinks"], DetailValue::Number(3.0));
        assert_eq!(verdict.details()["ok"], DetailValue::Flag(true));
        assert_eq!(
            verdict.details()["details"],
            DetailValue::from(r#"{"confidence":0.75}"#)
        );
    }

    #[test]
    fn test_confidence_from_numeric_string() {
        let verdict = http(r#"["VERIFIED", {"confidence": "0.5"}]"#);
        assert_eq!(verdict.confidence(), 0.5);
    }

    #[test]
    fn test_markers_are_case_sensitive() {
        let verdict = http(r#"["verified genuine person", {}]"#);
        assert!(!verdict.verified());
    }

    #[test]
    fn test_non_object_details_degrade_with_parse_error() {
        let verdict = http(r#"["✅ VERIFIED", [1, 2, 3]]"#);

        assert!(verdict.verified());
        assert_eq!(verdict.confidence(), 0.0);
        assert!(matches!(
            &verdict.details()["parseError"],
            DetailValue::Text(msg) if msg.contains("array")
        ));
        assert!(verdict.details().contains_key("fullResult"));
    }

    #[test]
    fn test_malformed_reply_falls_back() {
        for body in ["<html>502 Bad Gateway</html>", "", r#"{"event_id": "abc"}"#, r#"["only one"]"#, r#"{"data": ["x"]}"#] {
            let verdict = http(body);
            assert!(!verdict.verified());
            assert_eq!(verdict.reason(), REASON_UNEXPECTED);
            assert_eq!(verdict.confidence(), 0.0);
            assert_eq!(verdict.details()["rawResponse"], DetailValue::from(body));
        }
    }

    #[test]
    fn test_process_success() {
        let verdict = normalize(&RawExternalReply::Process {
            exit_code: Some(0),
            output: "VERIFICATION_SUCCESS\nAll checks passed\n".into(),
        });

        assert!(verdict.verified());
        assert!(verdict.reason().starts_with("Liveness check passed: VERIFICATION_SUCCESS"));
        assert_eq!(verdict.details()["exitCode"], DetailValue::Number(0.0));
    }

    #[test]
    fn test_process_failure_and_signal() {
        let failed = normalize(&RawExternalReply::Process {
            exit_code: Some(1),
            output: "VERIFICATION_FAILED".into(),
        });
        assert!(!failed.verified());
        assert_eq!(failed.reason(), "Liveness check failed: VERIFICATION_FAILED");

        let killed = normalize(&RawExternalReply::Process {
            exit_code: None,
            output: String::new(),
        });
        assert!(!killed.verified());
        assert_eq!(killed.reason(), "Liveness check failed");
        assert_eq!(
            killed.details()["exitCode"],
            DetailValue::from("terminated by signal")
        );
    }
}
