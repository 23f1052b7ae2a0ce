//! # pet-diagnosis
//!
//! Async client-side orchestration for multi-stage visual pet diagnosis
//! against a remote inference service.
//!
//! ## Features
//!
//! - **Species → breed flow** — classify cat vs. dog, then identify the
//!   breed for dogs only, strictly in that order
//! - **Skin-condition detection** — labelled detections plus an absolute
//!   address for the server-rendered annotated image
//! - **Partial success** — a failed breed call keeps the species result
//! - **Generation tagging** — starting a new diagnosis invalidates anything
//!   still in flight; late responses are discarded, never applied
//! - **Observable sessions** — one tagged state per session, published via
//!   `tokio::sync::watch`
//! - **Multipart builder** — one `image` field with filename and a content
//!   type inferred from the extension
//!
//! ## Quick Start
//!
//! ```no_run
//! use pet_diagnosis::{
//!     DiagnosisConfig, HttpInferenceClient, IdentificationReport, IdentifySession,
//!     RunResult, SelectedImage,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DiagnosisConfig::builder()
//!         .with_base_url("http://10.0.0.5:5000")
//!         .build()?;
//!     let session = IdentifySession::new(Arc::new(HttpInferenceClient::new(config)));
//!
//!     let image = SelectedImage::from_camera("file:///tmp/capture.jpg");
//!     if let RunResult::Completed(terminal) = session.select_image(image).await {
//!         if let Some(notice) = &terminal.notice {
//!             eprintln!("{}: {}", notice.title, notice.message);
//!         }
//!         if let Some(report) = IdentificationReport::from_outcome(&terminal.outcome) {
//!             println!("{}", report.classification_line());
//!             println!("Breed: {:?}", report.breed);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod identify;
pub mod image;
pub mod multipart;
pub mod report;
pub mod session;
pub mod skin;
pub mod types;

pub use client::{
    BreedPrediction, HttpInferenceClient, InferenceBackend, RawDetection, SkinDetections,
    SpeciesPrediction,
};
pub use config::{DiagnosisConfig, DiagnosisConfigBuilder};
pub use error::{DiagnosisError, ErrorKind, Result};
pub use identify::{IdentifySession, IdentifyState, IdentifyTerminal};
pub use image::{ImageSource, SelectedImage};
pub use multipart::ImagePayload;
pub use report::{IdentificationReport, SkinReport};
pub use session::{RunResult, SessionCell, Snapshot};
pub use skin::{SkinSession, SkinState, SkinTerminal};
pub use types::{
    BoundingRegion, BreedResult, Confidence, Detection, DiagnosisRequest, Generation,
    IdentificationOutcome, Notice, NoticeLevel, Prediction, SkinOutcome, Stage, StageFailure,
    StageResult, BREED_NOT_APPLICABLE, CONFIDENCE_UNAVAILABLE,
};
