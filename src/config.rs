use std::time::Duration;

use crate::error::{DiagnosisError, Result};

fn normalize(base_url: String) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Join a service-relative path onto a base address.
pub fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Configuration for the inference service client.
///
/// Use [`DiagnosisConfig::builder()`] for validated construction, or
/// [`DiagnosisConfig::default()`] for a local development server.
#[derive(Debug, Clone)]
pub struct DiagnosisConfig {
    /// Base address of the inference service, without a trailing slash.
    pub base_url: String,

    /// Per-request timeout. `None` leaves timing to the transport.
    pub timeout: Option<Duration>,
}

impl Default for DiagnosisConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout: None,
        }
    }
}

impl DiagnosisConfig {
    /// Start building a config with the builder pattern.
    pub fn builder() -> DiagnosisConfigBuilder {
        DiagnosisConfigBuilder::default()
    }

    /// Join a path returned by the service onto the base address.
    ///
    /// Paths that are already absolute URLs are returned unchanged.
    pub fn resolve(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

/// Builder for [`DiagnosisConfig`].
#[derive(Default)]
pub struct DiagnosisConfigBuilder {
    config: DiagnosisConfig,
}

impl DiagnosisConfigBuilder {
    /// Set the base address of the inference service.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Apply a timeout to every remote call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Validate and build the final [`DiagnosisConfig`].
    pub fn build(self) -> Result<DiagnosisConfig> {
        let base_url = normalize(self.config.base_url);
        if base_url.is_empty() {
            return Err(DiagnosisError::InvalidConfig(
                "Base URL must not be empty".to_string(),
            ));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(DiagnosisError::InvalidConfig(format!(
                "Base URL must start with http:// or https://, got {}",
                base_url
            )));
        }
        if self.config.timeout == Some(Duration::ZERO) {
            return Err(DiagnosisError::InvalidConfig(
                "Timeout must be greater than zero".to_string(),
            ));
        }

        Ok(DiagnosisConfig {
            base_url,
            timeout: self.config.timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DiagnosisConfig::default();
        assert_eq!(config.base_url, "http://localhost:5000");
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_builder_normalizes_trailing_slashes() {
        let config = DiagnosisConfig::builder()
            .with_base_url("http://10.0.0.5:5000///")
            .with_timeout(Duration::from_secs(20))
            .build()
            .unwrap();
        assert_eq!(config.base_url, "http://10.0.0.5:5000");
        assert_eq!(config.timeout, Some(Duration::from_secs(20)));
    }

    #[test]
    fn test_builder_rejects_bad_base_url() {
        let result = DiagnosisConfig::builder().with_base_url("").build();
        match result.unwrap_err() {
            DiagnosisError::InvalidConfig(msg) => assert!(msg.contains("empty")),
            _ => panic!("Expected InvalidConfig error"),
        }

        let result = DiagnosisConfig::builder()
            .with_base_url("ftp://host")
            .build();
        assert!(matches!(result, Err(DiagnosisError::InvalidConfig(_))));
    }

    #[test]
    fn test_builder_rejects_zero_timeout() {
        let result = DiagnosisConfig::builder()
            .with_timeout(Duration::ZERO)
            .build();
        assert!(matches!(result, Err(DiagnosisError::InvalidConfig(_))));
    }

    #[test]
    fn test_resolve_relative_path() {
        let config = DiagnosisConfig::default();
        assert_eq!(
            config.resolve("/static/output/result.jpg"),
            "http://localhost:5000/static/output/result.jpg"
        );
        assert_eq!(
            config.resolve("static/output/result.jpg"),
            "http://localhost:5000/static/output/result.jpg"
        );
    }

    #[test]
    fn test_join_url_tolerates_slashes() {
        assert_eq!(
            join_url("http://10.0.0.5:5000/", "/static/x.png"),
            "http://10.0.0.5:5000/static/x.png"
        );
    }

    #[test]
    fn test_resolve_absolute_path_is_kept() {
        let config = DiagnosisConfig::default();
        assert_eq!(
            config.resolve("https://cdn.example.com/a.jpg"),
            "https://cdn.example.com/a.jpg"
        );
    }
}
