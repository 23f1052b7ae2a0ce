//! Presenter-ready text for finished outcomes.
//!
//! The strings here are user-visible conventions: confidences as
//! percentages with two decimals, `"N/A"` where no confidence exists, and
//! `"N/A (Not a Dog)"` in the breed slot for other species.

use serde::Serialize;

use crate::types::{
    IdentificationOutcome, SkinOutcome, StageResult, BREED_NOT_APPLICABLE, CONFIDENCE_UNAVAILABLE,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentificationReport {
    pub species: String,
    pub species_confidence: String,
    /// `None` when the breed call failed; the species part still stands.
    pub breed: Option<String>,
    pub breed_confidence: String,
}

impl IdentificationReport {
    /// Build a report. Returns `None` when the species stage failed.
    pub fn from_outcome(outcome: &IdentificationOutcome) -> Option<Self> {
        match outcome {
            IdentificationOutcome::SpeciesFailed(_) => None,
            IdentificationOutcome::NotADog { species } => Some(Self {
                species: species.label.clone(),
                species_confidence: species.confidence_display(),
                breed: Some(BREED_NOT_APPLICABLE.to_string()),
                breed_confidence: CONFIDENCE_UNAVAILABLE.to_string(),
            }),
            IdentificationOutcome::Dog { species, breed } => Some(Self {
                species: species.label.clone(),
                species_confidence: species.confidence_display(),
                breed: match breed {
                    StageResult::Success(p) => Some(p.label.clone()),
                    StageResult::Failure(_) => None,
                },
                breed_confidence: CONFIDENCE_UNAVAILABLE.to_string(),
            }),
        }
    }

    /// e.g. `"Dog (Confidence: 93.00%)"`.
    pub fn classification_line(&self) -> String {
        format!("{} (Confidence: {})", self.species, self.species_confidence)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkinReport {
    /// Detected labels joined with `", "`, in response order.
    pub conditions: String,
    pub confidence: String,
    pub annotated_image_url: Option<String>,
}

impl SkinReport {
    /// Build a report. Returns `None` unless something was detected.
    pub fn from_outcome(outcome: &SkinOutcome) -> Option<Self> {
        match outcome {
            SkinOutcome::Detected {
                detections,
                annotated_image_url,
            } => Some(Self {
                conditions: detections
                    .iter()
                    .map(|d| d.label.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                confidence: CONFIDENCE_UNAVAILABLE.to_string(),
                annotated_image_url: annotated_image_url.clone(),
            }),
            SkinOutcome::NoConditions | SkinOutcome::Failed(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::{Confidence, Detection, Prediction, Stage, StageFailure};

    #[test]
    fn test_dog_report() {
        let outcome = IdentificationOutcome::Dog {
            species: Prediction::new("Dog", Confidence::new(0.93)),
            breed: StageResult::Success(Prediction::new("Labrador Retriever", None)),
        };
        let report = IdentificationReport::from_outcome(&outcome).unwrap();
        assert_eq!(report.species, "Dog");
        assert_eq!(report.species_confidence, "93.00%");
        assert_eq!(report.breed.as_deref(), Some("Labrador Retriever"));
        assert_eq!(report.breed_confidence, "N/A");
        assert_eq!(report.classification_line(), "Dog (Confidence: 93.00%)");
    }

    #[test]
    fn test_cat_report() {
        let outcome = IdentificationOutcome::NotADog {
            species: Prediction::new("Cat", Confidence::new(0.88)),
        };
        let report = IdentificationReport::from_outcome(&outcome).unwrap();
        assert_eq!(report.species_confidence, "88.00%");
        assert_eq!(report.breed.as_deref(), Some("N/A (Not a Dog)"));
    }

    #[test]
    fn test_partial_report_keeps_species() {
        let outcome = IdentificationOutcome::Dog {
            species: Prediction::new("Dog", Confidence::new(0.5)),
            breed: StageResult::Failure(StageFailure {
                stage: Stage::BreedIdentification,
                kind: ErrorKind::TransportFailure,
                reason: "connection refused".into(),
                remote_message: None,
            }),
        };
        let report = IdentificationReport::from_outcome(&outcome).unwrap();
        assert_eq!(report.species, "Dog");
        assert_eq!(report.species_confidence, "50.00%");
        assert!(report.breed.is_none());
    }

    #[test]
    fn test_failed_species_has_no_report() {
        let outcome = IdentificationOutcome::SpeciesFailed(StageFailure {
            stage: Stage::SpeciesClassification,
            kind: ErrorKind::TransportFailure,
            reason: "down".into(),
            remote_message: None,
        });
        assert!(IdentificationReport::from_outcome(&outcome).is_none());
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = IdentificationReport {
            species: "Cat".into(),
            species_confidence: "88.00%".into(),
            breed: Some(BREED_NOT_APPLICABLE.into()),
            breed_confidence: "N/A".into(),
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"speciesConfidence\":\"88.00%\""));
        assert!(json.contains("\"breedConfidence\":\"N/A\""));
    }

    #[test]
    fn test_skin_report_joins_labels() {
        let outcome = SkinOutcome::Detected {
            detections: vec![
                Detection {
                    label: "ringworm".into(),
                    region: None,
                },
                Detection {
                    label: "mange".into(),
                    region: None,
                },
            ],
            annotated_image_url: Some("http://localhost:5000/static/out.jpg".into()),
        };
        let report = SkinReport::from_outcome(&outcome).unwrap();
        assert_eq!(report.conditions, "ringworm, mange");
        assert_eq!(report.confidence, "N/A");
        assert_eq!(
            report.annotated_image_url.as_deref(),
            Some("http://localhost:5000/static/out.jpg")
        );
    }

    #[test]
    fn test_no_conditions_has_no_skin_report() {
        assert!(SkinReport::from_outcome(&SkinOutcome::NoConditions).is_none());
    }
}
