use std::path::PathBuf;

use reqwest::Url;

use crate::error::{DiagnosisError, Result};

/// Where the user obtained the image from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    Gallery,
    Camera,
}

/// A single image chosen by the user, plus its derived filename and MIME type.
///
/// A new selection always produces a new value; sessions replace the image
/// they hold rather than mutating it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    pub source: ImageSource,
    pub uri: String,
    pub filename: String,
    pub mime_type: String,
}

impl SelectedImage {
    /// Wrap a local path or `file://` URI.
    pub fn new(source: ImageSource, uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let filename = filename_from_uri(&uri);
        let mime_type = mime_type_for(&filename);
        Self {
            source,
            uri,
            filename,
            mime_type,
        }
    }

    /// Shorthand for an image picked from the gallery.
    pub fn from_gallery(uri: impl Into<String>) -> Self {
        Self::new(ImageSource::Gallery, uri)
    }

    /// Shorthand for an image captured with the camera.
    pub fn from_camera(uri: impl Into<String>) -> Self {
        Self::new(ImageSource::Camera, uri)
    }

    /// Resolve the reference to a local filesystem path.
    ///
    /// `file://` URIs are percent-decoded; anything that does not parse as
    /// an absolute URL is taken as a plain path.
    pub fn local_path(&self) -> Result<PathBuf> {
        let uri = self.uri.trim();
        if uri.is_empty() {
            return Err(DiagnosisError::InvalidImageReference(
                "empty image reference".to_string(),
            ));
        }
        let url = match Url::parse(uri) {
            Ok(url) => url,
            Err(_) => return Ok(PathBuf::from(uri)),
        };
        if url.scheme() != "file" {
            return Err(DiagnosisError::InvalidImageReference(format!(
                "unsupported scheme '{}' in {}",
                url.scheme(),
                uri
            )));
        }
        url.to_file_path().map_err(|_| {
            DiagnosisError::InvalidImageReference(format!("{} is not a local file", uri))
        })
    }

    /// Read the raw bytes the reference points at.
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        let path = self.local_path()?;
        let bytes = std::fs::read(&path).map_err(|e| {
            DiagnosisError::InvalidImageReference(format!("{}: {}", path.display(), e))
        })?;
        if bytes.is_empty() {
            return Err(DiagnosisError::InvalidImageReference(format!(
                "{}: file is empty",
                path.display()
            )));
        }
        Ok(bytes)
    }
}

/// Last path segment of the reference.
pub fn filename_from_uri(uri: &str) -> String {
    uri.rsplit('/').next().unwrap_or_default().to_string()
}

/// `name.<ext>` maps to `image/<ext>`; anything else falls back to `image`.
///
/// The extension must be a trailing run of ASCII word characters, and its
/// case is kept as-is.
pub fn mime_type_for(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((_, ext))
            if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') =>
        {
            format!("image/{}", ext)
        }
        _ => "image".to_string(),
    }
}
