//! Splitting multipart/form-data uploads into file parts and text fields.

use std::collections::HashMap;

use axum::extract::Multipart;
use lifecheck_core::MediaPayload;

use crate::error::ApiError;

/// A drained multipart form.
///
/// Fields named in `file_fields` are read as raw bytes together with their
/// declared Content-Type and filename; every other field is read as text.
/// Validation of the file contents is left to the caller.
#[derive(Debug, Default)]
pub struct MultipartFields {
    /// File fields indexed by name
    files: HashMap<String, MediaPayload>,
    /// Text fields indexed by name
    text_fields: HashMap<String, String>,
}

impl MultipartFields {
    /// Drain every part of the request.
    ///
    /// # Example
    /// ```ignore
    /// let fields = MultipartFields::parse(&mut multipart, &["video"]).await?;
    /// let video = fields.take_file("video");
    /// ```
    pub async fn parse(multipart: &mut Multipart, file_fields: &[&str]) -> Result<Self, ApiError> {
        let mut fields = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to parse multipart: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if file_fields.contains(&name.as_str()) {
                let content_type = field.content_type().map(str::to_string);
                let file_name = field.file_name().map(str::to_string);

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| {
                        ApiError::bad_request(format!("Failed to read field '{}': {}", name, e))
                    })?
                    .to_vec();

                fields
                    .files
                    .insert(name, MediaPayload::new(data, content_type, file_name));
            } else {
                let value = field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("Failed to read field '{}': {}", name, e))
                })?;
                fields.text_fields.insert(name, value);
            }
        }

        Ok(fields)
    }

    /// Remove and return a file field, or an empty payload if it was not sent.
    ///
    /// An absent file and an empty file are rejected the same way downstream.
    pub fn take_file(&mut self, name: &str) -> MediaPayload {
        self.files.remove(name).unwrap_or_default()
    }

    /// Remove and return a file field if present
    pub fn take_optional_file(&mut self, name: &str) -> Option<MediaPayload> {
        self.files.remove(name)
    }

    /// Text field by name, as sent.
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.text_fields.get(name).map(String::as_str)
    }

    /// Get a required, non-blank text field
    pub fn require_text(&self, name: &str) -> Result<&str, ApiError> {
        self.get_text(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::bad_request(format!("Missing required field '{}'", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_text() {
        let mut fields = MultipartFields::default();
        fields
            .text_fields
            .insert("name".to_string(), "test".to_string());

        assert_eq!(fields.get_text("name"), Some("test"));
        assert_eq!(fields.get_text("missing"), None);
    }

    #[test]
    fn test_require_text_rejects_blank() {
        let mut fields = MultipartFields::default();
        fields
            .text_fields
            .insert("username".to_string(), "  ".to_string());

        assert!(fields.require_text("username").is_err());
        assert!(fields.require_text("password").is_err());
    }

    #[test]
    fn test_take_missing_file_is_empty() {
        let mut fields = MultipartFields::default();
        assert!(fields.take_file("video").is_empty());
        assert!(fields.take_optional_file("image").is_none());
    }
}
