use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::client::InferenceBackend;
use crate::config::join_url;
use crate::image::SelectedImage;
use crate::multipart::ImagePayload;
use crate::session::{RunResult, SessionCell, Snapshot};
use crate::types::{
    DiagnosisRequest, Detection, Generation, Notice, SkinOutcome, Stage, StageFailure,
};

#[derive(Debug, Clone, PartialEq)]
pub enum SkinState {
    Idle,
    Detecting,
    Terminal(SkinTerminal),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkinTerminal {
    pub outcome: SkinOutcome,
    pub notice: Option<Notice>,
}

/// Single-stage skin-condition detection with the same generation rules as
/// [`crate::IdentifySession`].
pub struct SkinSession<B: InferenceBackend> {
    backend: Arc<B>,
    cell: SessionCell<SkinState>,
}

impl<B: InferenceBackend> std::fmt::Debug for SkinSession<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkinSession")
            .field("snapshot", &self.cell.snapshot())
            .finish()
    }
}

impl<B: InferenceBackend> SkinSession<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            cell: SessionCell::new(SkinState::Idle),
        }
    }

    /// Run detection on a newly selected image.
    pub async fn analyze(&self, image: SelectedImage) -> RunResult<SkinTerminal> {
        let generation = self.cell.begin(SkinState::Detecting);
        info!(generation = %generation, image = %image.filename, "starting skin detection");

        let payload = match ImagePayload::build(&image) {
            Ok(payload) => Arc::new(payload),
            Err(e) => {
                warn!(generation = %generation, "cannot build image payload: {}", e);
                return self.fail(generation, StageFailure::from_error(Stage::SkinDetection, &e));
            }
        };

        let request = DiagnosisRequest::new(Stage::SkinDetection, generation, payload);
        let response = self.backend.detect_skin(&request).await;

        if !self.cell.is_current(generation) {
            debug!(generation = %generation, "discarding stale detection response");
            return RunResult::Superseded;
        }

        match response {
            Err(e) => {
                warn!(generation = %generation, stage = %Stage::SkinDetection, "{}", e);
                self.fail(generation, StageFailure::from_error(Stage::SkinDetection, &e))
            }
            Ok(body) if body.detections.is_empty() => self.finish(
                generation,
                SkinOutcome::NoConditions,
                Some(Notice::no_conditions()),
            ),
            Ok(body) => {
                let annotated_image_url = body
                    .output_image
                    .as_deref()
                    .map(|path| join_url(self.backend.base_url(), path));
                let detections = body.detections.into_iter().map(Detection::from).collect();
                self.finish(
                    generation,
                    SkinOutcome::Detected {
                        detections,
                        annotated_image_url,
                    },
                    None,
                )
            }
        }
    }

    /// Dismiss the current outcome and return to idle.
    pub fn reset(&self) {
        let generation = self.cell.begin(SkinState::Idle);
        debug!(generation = %generation, "skin session reset");
    }

    pub fn state(&self) -> SkinState {
        self.cell.state()
    }

    pub fn snapshot(&self) -> Snapshot<SkinState> {
        self.cell.snapshot()
    }

    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<Snapshot<SkinState>> {
        self.cell.subscribe()
    }

    fn fail(&self, generation: Generation, failure: StageFailure) -> RunResult<SkinTerminal> {
        let notice = Notice::for_failure(&failure);
        self.finish(generation, SkinOutcome::Failed(failure), Some(notice))
    }

    fn finish(
        &self,
        generation: Generation,
        outcome: SkinOutcome,
        notice: Option<Notice>,
    ) -> RunResult<SkinTerminal> {
        let terminal = SkinTerminal { outcome, notice };
        if self
            .cell
            .commit(generation, SkinState::Terminal(terminal.clone()))
        {
            info!(generation = %generation, "skin detection finished");
            RunResult::Completed(terminal)
        } else {
            RunResult::Superseded
        }
    }
}
