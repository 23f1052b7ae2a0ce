use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::DiagnosisConfig;
use crate::error::{DiagnosisError, Result};
use crate::types::{BoundingRegion, Confidence, DiagnosisRequest, Detection, Prediction};

/// Body of a successful `/classify-cat-dog` call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpeciesPrediction {
    pub predicted_label: String,
    #[serde(default)]
    pub confidence_score: Option<f64>,
}

impl SpeciesPrediction {
    /// Validate the label and confidence score.
    ///
    /// The label is kept exactly as sent; only a blank one is refused.
    pub fn into_prediction(self) -> Result<Prediction> {
        let label = self.predicted_label;
        if label.trim().is_empty() {
            return Err(DiagnosisError::InvalidResponse(
                "predicted_label is empty".to_string(),
            ));
        }
        let confidence = match self.confidence_score {
            Some(score) => Some(Confidence::new(score).ok_or_else(|| {
                DiagnosisError::InvalidResponse(format!(
                    "confidence_score {} is not a probability",
                    score
                ))
            })?),
            None => None,
        };
        Ok(Prediction::new(label, confidence))
    }
}

/// Body of a successful `/predict-breed` call. No confidence is reported.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BreedPrediction {
    pub predicted_breed_label: String,
}

impl BreedPrediction {
    pub fn into_prediction(self) -> Result<Prediction> {
        let label = self.predicted_breed_label.trim().to_string();
        if label.is_empty() {
            return Err(DiagnosisError::InvalidResponse(
                "predicted_breed_label is empty".to_string(),
            ));
        }
        Ok(Prediction::new(label, None))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawDetection {
    pub label: String,
    #[serde(default, alias = "box")]
    pub bbox: Option<[f64; 4]>,
}

impl From<RawDetection> for Detection {
    fn from(raw: RawDetection) -> Self {
        Detection {
            label: raw.label,
            region: raw.bbox.map(BoundingRegion::from),
        }
    }
}

/// Body of a successful `/detect-skin-disease` call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SkinDetections {
    #[serde(default)]
    pub detections: Vec<RawDetection>,
    /// Path of the annotated image, relative to the service base address.
    #[serde(default)]
    pub output_image: Option<String>,
}

/// The remote inference service, one method per endpoint.
///
/// [`HttpInferenceClient`] is the production implementation; the
/// orchestrators only depend on this trait.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Base address that relative paths in responses are resolved against.
    fn base_url(&self) -> &str;

    async fn classify_species(&self, request: &DiagnosisRequest) -> Result<SpeciesPrediction>;

    async fn identify_breed(&self, request: &DiagnosisRequest) -> Result<BreedPrediction>;

    async fn detect_skin(&self, request: &DiagnosisRequest) -> Result<SkinDetections>;
}

/// Async client for the pet inference service.
///
/// # Example
/// ```no_run
/// use pet_diagnosis::{DiagnosisConfig, HttpInferenceClient};
/// use std::time::Duration;
///
/// # fn example() -> pet_diagnosis::Result<()> {
/// let config = DiagnosisConfig::builder()
///     .with_base_url("http://10.0.0.5:5000")
///     .with_timeout(Duration::from_secs(30))
///     .build()?;
/// let client = HttpInferenceClient::new(config);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpInferenceClient {
    http: Client,
    config: DiagnosisConfig,
}

impl HttpInferenceClient {
    pub fn new(config: DiagnosisConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    /// Use a custom `reqwest::Client` (for connection pooling, TLS).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    pub fn config(&self) -> &DiagnosisConfig {
        &self.config
    }

    /// POST the request's image to its stage endpoint and decode the reply.
    async fn post_stage<T: DeserializeOwned>(&self, request: &DiagnosisRequest) -> Result<T> {
        let url = format!("{}{}", self.config.base_url, request.stage.path());
        let form = request.payload.to_form()?;

        debug!(
            stage = %request.stage,
            generation = %request.generation,
            url = %url,
            bytes = request.payload.len(),
            "sending inference request"
        );

        let mut builder = self.http.post(&url).multipart(form);
        if let Some(timeout) = self.config.timeout {
            builder = builder.timeout(timeout);
        }

        let resp = builder.send().await.map_err(|e| DiagnosisError::Transport {
            context: format!(
                "Cannot connect to inference service at {} \u{2014} is the service running?",
                self.config.base_url
            ),
            source: e,
        })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| DiagnosisError::Transport {
            context: format!("Failed to read {} response", request.stage),
            source: e,
        })?;

        if !status.is_success() {
            debug!(stage = %request.stage, status = status.as_u16(), body = %text, "inference request rejected");
            return Err(DiagnosisError::RemoteRejection {
                status: Some(status.as_u16()),
                message: error_field(&text).unwrap_or_default(),
            });
        }

        parse_stage_body(&text)
    }
}

#[async_trait]
impl InferenceBackend for HttpInferenceClient {
    fn base_url(&self) -> &str {
        &self.config.base_url
    }

    async fn classify_species(&self, request: &DiagnosisRequest) -> Result<SpeciesPrediction> {
        self.post_stage(request).await
    }

    async fn identify_breed(&self, request: &DiagnosisRequest) -> Result<BreedPrediction> {
        self.post_stage(request).await
    }

    async fn detect_skin(&self, request: &DiagnosisRequest) -> Result<SkinDetections> {
        self.post_stage(request).await
    }
}

/// Extract the `error` string from a JSON body, if there is one.
fn error_field(text: &str) -> Option<String> {
    let json: Value = serde_json::from_str(text).ok()?;
    json.get("error")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Decode a success body. An `error` field wins over everything else.
fn parse_stage_body<T: DeserializeOwned>(text: &str) -> Result<T> {
    let json: Value = serde_json::from_str(text).map_err(|e| {
        DiagnosisError::InvalidResponse(format!(
            "body is not JSON ({}): {}",
            e,
            text.chars().take(200).collect::<String>()
        ))
    })?;

    if let Some(message) = json.get("error").and_then(|v| v.as_str()) {
        return Err(DiagnosisError::RemoteRejection {
            status: None,
            message: message.to_string(),
        });
    }

    serde_json::from_value(json).map_err(|e| DiagnosisError::InvalidResponse(e.to_string()))
}
