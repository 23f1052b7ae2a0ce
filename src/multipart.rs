//! Turns a [`SelectedImage`] into the multipart body every endpoint expects.
//!
//! Building is synchronous and pure apart from reading the image bytes. The
//! resulting [`ImagePayload`] is reusable: the identification flow sends the
//! same payload to the species and breed endpoints.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};

use crate::error::{DiagnosisError, Result};
use crate::image::SelectedImage;

/// Name of the multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";

/// An image resolved to bytes, ready to be encoded as `multipart/form-data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: String,
}

impl ImagePayload {
    /// Resolve the image reference and capture its filename and content type.
    ///
    /// Fails with [`DiagnosisError::InvalidImageReference`] when the bytes
    /// cannot be read. Unknown extensions never fail; they get the generic
    /// `image` content type.
    pub fn build(image: &SelectedImage) -> Result<Self> {
        let bytes = image.read_bytes()?;
        Ok(Self {
            bytes,
            filename: image.filename.clone(),
            content_type: image.mime_type.clone(),
        })
    }

    /// Encode as a form with a single `image` field.
    ///
    /// The content type is written as a raw part header because the generic
    /// `image` fallback is not a full MIME type.
    pub fn to_form(&self) -> Result<Form> {
        let content_type = HeaderValue::from_str(&self.content_type).map_err(|e| {
            DiagnosisError::InvalidImageReference(format!(
                "bad content type '{}': {}",
                self.content_type, e
            ))
        })?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, content_type);

        let part = Part::bytes(self.bytes.clone())
            .file_name(self.filename.clone())
            .headers(headers);

        Ok(Form::new().part(IMAGE_FIELD, part))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
