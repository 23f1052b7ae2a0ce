use std::fmt;
use std::sync::Arc;

use crate::error::{DiagnosisError, ErrorKind};
use crate::multipart::ImagePayload;

/// Shown for the breed of anything that is not a dog.
pub const BREED_NOT_APPLICABLE: &str = "N/A (Not a Dog)";

/// Shown wherever a confidence score is unavailable.
pub const CONFIDENCE_UNAVAILABLE: &str = "N/A";

/// Species label that unlocks breed identification.
pub const DOG_LABEL: &str = "Dog";

/// One remote inference call within a diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    SpeciesClassification,
    BreedIdentification,
    SkinDetection,
}

impl Stage {
    /// Endpoint path relative to the service base address.
    pub fn path(&self) -> &'static str {
        match self {
            Stage::SpeciesClassification => "/classify-cat-dog",
            Stage::BreedIdentification => "/predict-breed",
            Stage::SkinDetection => "/detect-skin-disease",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::SpeciesClassification => "species",
            Stage::BreedIdentification => "breed",
            Stage::SkinDetection => "detection",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Monotonically increasing id of one diagnosis attempt within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One remote call: which stage, for which attempt, with which image.
#[derive(Debug, Clone)]
pub struct DiagnosisRequest {
    pub stage: Stage,
    pub generation: Generation,
    pub payload: Arc<ImagePayload>,
}

impl DiagnosisRequest {
    pub fn new(stage: Stage, generation: Generation, payload: Arc<ImagePayload>) -> Self {
        Self {
            stage,
            generation,
            payload,
        }
    }
}

/// A probability in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Confidence(f64);

impl Confidence {
    /// Returns `None` for values outside `[0, 1]` or non-finite values.
    pub fn new(value: f64) -> Option<Self> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Some(Confidence(value))
        } else {
            None
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Percentage with two decimals, e.g. `0.93` becomes `"93.00%"`.
    pub fn as_percent(&self) -> String {
        format!("{:.2}%", self.0 * 100.0)
    }
}

/// A successful stage answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: Option<Confidence>,
}

impl Prediction {
    pub fn new(label: impl Into<String>, confidence: Option<Confidence>) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }

    pub fn is_dog(&self) -> bool {
        self.label == DOG_LABEL
    }

    /// Formatted confidence, or `"N/A"` when the endpoint gave none.
    pub fn confidence_display(&self) -> String {
        self.confidence
            .map(|c| c.as_percent())
            .unwrap_or_else(|| CONFIDENCE_UNAVAILABLE.to_string())
    }
}

/// Why a stage did not produce a prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    pub stage: Stage,
    pub kind: ErrorKind,
    pub reason: String,
    /// The service's own `error` text, when it sent one.
    pub remote_message: Option<String>,
}

impl StageFailure {
    pub fn from_error(stage: Stage, err: &DiagnosisError) -> Self {
        Self {
            stage,
            kind: err.kind(),
            reason: err.to_string(),
            remote_message: err.remote_message().map(str::to_string),
        }
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stage failed: {}", self.stage, self.reason)
    }
}

/// Tagged result of one [`DiagnosisRequest`].
#[derive(Debug, Clone, PartialEq)]
pub enum StageResult {
    Success(Prediction),
    Failure(StageFailure),
}

impl StageResult {
    pub fn is_success(&self) -> bool {
        matches!(self, StageResult::Success(_))
    }

    pub fn prediction(&self) -> Option<&Prediction> {
        match self {
            StageResult::Success(p) => Some(p),
            StageResult::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&StageFailure> {
        match self {
            StageResult::Success(_) => None,
            StageResult::Failure(f) => Some(f),
        }
    }
}

/// Breed slot of an identification outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum BreedResult<'a> {
    /// Species was not "Dog"; no breed call was made.
    NotApplicable,
    /// Species stage failed; the breed stage was never entered.
    NotAttempted,
    Ran(&'a StageResult),
}

/// Aggregate of the species→breed flow.
///
/// The variants encode the ordering rule: a breed result only exists when
/// the species stage succeeded with "Dog".
#[derive(Debug, Clone, PartialEq)]
pub enum IdentificationOutcome {
    SpeciesFailed(StageFailure),
    NotADog { species: Prediction },
    Dog {
        species: Prediction,
        breed: StageResult,
    },
}

impl IdentificationOutcome {
    pub fn species(&self) -> StageResult {
        match self {
            IdentificationOutcome::SpeciesFailed(f) => StageResult::Failure(f.clone()),
            IdentificationOutcome::NotADog { species }
            | IdentificationOutcome::Dog { species, .. } => StageResult::Success(species.clone()),
        }
    }

    pub fn breed(&self) -> BreedResult<'_> {
        match self {
            IdentificationOutcome::SpeciesFailed(_) => BreedResult::NotAttempted,
            IdentificationOutcome::NotADog { .. } => BreedResult::NotApplicable,
            IdentificationOutcome::Dog { breed, .. } => BreedResult::Ran(breed),
        }
    }

    pub fn species_label(&self) -> Option<&str> {
        match self {
            IdentificationOutcome::SpeciesFailed(_) => None,
            IdentificationOutcome::NotADog { species }
            | IdentificationOutcome::Dog { species, .. } => Some(species.label.as_str()),
        }
    }

    pub fn breed_label(&self) -> Option<&str> {
        match self {
            IdentificationOutcome::Dog {
                breed: StageResult::Success(p),
                ..
            } => Some(p.label.as_str()),
            _ => None,
        }
    }

    /// True when the species was obtained but the breed call failed.
    pub fn is_partial(&self) -> bool {
        matches!(
            self,
            IdentificationOutcome::Dog {
                breed: StageResult::Failure(_),
                ..
            }
        )
    }
}

/// Axis-aligned box in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingRegion {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl From<[f64; 4]> for BoundingRegion {
    fn from(b: [f64; 4]) -> Self {
        Self {
            x_min: b[0],
            y_min: b[1],
            x_max: b[2],
            y_max: b[3],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub label: String,
    pub region: Option<BoundingRegion>,
}

/// Aggregate of the skin-condition flow.
#[derive(Debug, Clone, PartialEq)]
pub enum SkinOutcome {
    Detected {
        detections: Vec<Detection>,
        /// Absolute address of the server-rendered annotated image.
        annotated_image_url: Option<String>,
    },
    /// The call succeeded and found nothing.
    NoConditions,
    Failed(StageFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A user-facing alert raised by an orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn no_image() -> Self {
        Self::info("No Image", "Please select or take a photo first")
    }

    pub fn no_conditions() -> Self {
        Self::info("No Results", "No skin diseases detected")
    }

    /// Alert for a failed stage, worded after the stage and failure kind.
    pub fn for_failure(failure: &StageFailure) -> Self {
        match failure.kind {
            ErrorKind::InvalidImageReference => {
                Self::error("Error", "Failed to read the selected image")
            }
            ErrorKind::TransportFailure => match failure.stage {
                Stage::SkinDetection => Self::skin_failure(),
                _ => Self::error(
                    "Error",
                    "Could not connect to the pet classification API. Please ensure it is running.",
                ),
            },
            ErrorKind::RemoteRejection => match failure.stage {
                Stage::SpeciesClassification => Self::error(
                    "Classification Failed",
                    failure.remote_message.clone().unwrap_or_else(|| {
                        "An error occurred during cat/dog classification.".to_string()
                    }),
                ),
                Stage::BreedIdentification => Self::error(
                    "Breed Prediction Failed",
                    failure.remote_message.clone().unwrap_or_else(|| {
                        "An error occurred during breed prediction.".to_string()
                    }),
                ),
                Stage::SkinDetection => Self::skin_failure(),
            },
        }
    }

    fn skin_failure() -> Self {
        Self::error(
            "Error",
            "Failed to analyze image. Please ensure your server is running.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(stage: Stage, kind: ErrorKind, remote: Option<&str>) -> StageFailure {
        StageFailure {
            stage,
            kind,
            reason: "test".into(),
            remote_message: remote.map(str::to_string),
        }
    }

    #[test]
    fn test_stage_paths() {
        assert_eq!(Stage::SpeciesClassification.path(), "/classify-cat-dog");
        assert_eq!(Stage::BreedIdentification.path(), "/predict-breed");
        assert_eq!(Stage::SkinDetection.path(), "/detect-skin-disease");
        assert_eq!(Stage::BreedIdentification.to_string(), "breed");
    }

    #[test]
    fn test_confidence_bounds() {
        assert!(Confidence::new(0.0).is_some());
        assert!(Confidence::new(1.0).is_some());
        assert!(Confidence::new(1.01).is_none());
        assert!(Confidence::new(-0.1).is_none());
        assert!(Confidence::new(f64::NAN).is_none());
    }

    #[test]
    fn test_confidence_percent() {
        assert_eq!(Confidence::new(0.93).unwrap().as_percent(), "93.00%");
        assert_eq!(Confidence::new(0.88).unwrap().as_percent(), "88.00%");
        assert_eq!(Confidence::new(0.9876).unwrap().as_percent(), "98.76%");
        assert_eq!(Confidence::new(1.0).unwrap().as_percent(), "100.00%");
    }

    #[test]
    fn test_prediction_without_confidence() {
        let p = Prediction::new("Beagle", None);
        assert_eq!(p.confidence_display(), "N/A");
        assert!(!p.is_dog());
        assert!(Prediction::new("Dog", None).is_dog());
        assert!(!Prediction::new("dog", None).is_dog());
    }

    #[test]
    fn test_outcome_accessors() {
        let dog = IdentificationOutcome::Dog {
            species: Prediction::new("Dog", Confidence::new(0.9)),
            breed: StageResult::Success(Prediction::new("Pug", None)),
        };
        assert_eq!(dog.species_label(), Some("Dog"));
        assert_eq!(dog.breed_label(), Some("Pug"));
        assert!(!dog.is_partial());

        let cat = IdentificationOutcome::NotADog {
            species: Prediction::new("Cat", Confidence::new(0.8)),
        };
        assert_eq!(cat.breed(), BreedResult::NotApplicable);
        assert_eq!(cat.breed_label(), None);

        let failed = IdentificationOutcome::SpeciesFailed(failure(
            Stage::SpeciesClassification,
            ErrorKind::TransportFailure,
            None,
        ));
        assert_eq!(failed.breed(), BreedResult::NotAttempted);
        assert!(!failed.species().is_success());
    }

    #[test]
    fn test_partial_outcome() {
        let partial = IdentificationOutcome::Dog {
            species: Prediction::new("Dog", Confidence::new(0.7)),
            breed: StageResult::Failure(failure(
                Stage::BreedIdentification,
                ErrorKind::RemoteRejection,
                None,
            )),
        };
        assert!(partial.is_partial());
        assert!(partial.species().is_success());
        assert_eq!(partial.breed_label(), None);
    }

    #[test]
    fn test_notice_wording() {
        let n = Notice::for_failure(&failure(
            Stage::SpeciesClassification,
            ErrorKind::RemoteRejection,
            Some("Unsupported file"),
        ));
        assert_eq!(n.title, "Classification Failed");
        assert_eq!(n.message, "Unsupported file");

        let n = Notice::for_failure(&failure(
            Stage::BreedIdentification,
            ErrorKind::RemoteRejection,
            None,
        ));
        assert_eq!(n.title, "Breed Prediction Failed");
        assert_eq!(n.message, "An error occurred during breed prediction.");

        let n = Notice::for_failure(&failure(
            Stage::SpeciesClassification,
            ErrorKind::TransportFailure,
            None,
        ));
        assert_eq!(n.title, "Error");
        assert!(n.message.contains("pet classification API"));
        assert_eq!(n.level, NoticeLevel::Error);

        assert_eq!(Notice::no_conditions().level, NoticeLevel::Info);
    }

    #[test]
    fn test_generation_ordering() {
        let g = Generation::default();
        assert_eq!(g.next(), Generation(1));
        assert!(g.next().next() > g.next());
    }
}
