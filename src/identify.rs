use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::client::InferenceBackend;
use crate::image::SelectedImage;
use crate::multipart::ImagePayload;
use crate::session::{RunResult, SessionCell, Snapshot};
use crate::types::{
    DiagnosisRequest, Generation, IdentificationOutcome, Notice, Prediction, Stage, StageFailure,
    StageResult,
};

/// Where the species→breed flow currently is.
#[derive(Debug, Clone, PartialEq)]
pub enum IdentifyState {
    Idle,
    /// Waiting on the species classification call.
    Classifying,
    /// Species came back "Dog"; waiting on the breed call.
    BreedPending { species: Prediction },
    Terminal(IdentifyTerminal),
}

/// Final outcome of one identification attempt plus the alert to show, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifyTerminal {
    pub outcome: IdentificationOutcome,
    pub notice: Option<Notice>,
}

/// Orchestrates species classification followed, for dogs only, by breed
/// identification.
///
/// The session owns the current image and a single state slot. Each new
/// selection (or [`reidentify`](Self::reidentify)) starts a new generation;
/// responses that arrive for an older generation are dropped instead of
/// overwriting newer state. Nothing is retried automatically.
///
/// # Example
/// ```no_run
/// use pet_diagnosis::{HttpInferenceClient, DiagnosisConfig, IdentifySession, SelectedImage, RunResult};
/// use std::sync::Arc;
///
/// # async fn example() {
/// let backend = Arc::new(HttpInferenceClient::new(DiagnosisConfig::default()));
/// let session = IdentifySession::new(backend);
///
/// let run = session.select_image(SelectedImage::from_gallery("/tmp/rex.jpg")).await;
/// if let RunResult::Completed(terminal) = run {
///     println!("{:?}", terminal.outcome.breed_label());
/// }
/// # }
/// ```
pub struct IdentifySession<B: InferenceBackend> {
    backend: Arc<B>,
    cell: SessionCell<IdentifyState>,
    image: Mutex<Option<SelectedImage>>,
}

impl<B: InferenceBackend> std::fmt::Debug for IdentifySession<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentifySession")
            .field("snapshot", &self.cell.snapshot())
            .field("image", &self.current_image())
            .finish()
    }
}

impl<B: InferenceBackend> IdentifySession<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            cell: SessionCell::new(IdentifyState::Idle),
            image: Mutex::new(None),
        }
    }

    /// Replace the selected image and run a fresh identification with it.
    pub async fn select_image(&self, image: SelectedImage) -> RunResult<IdentifyTerminal> {
        let generation = {
            let mut current = self.image.lock().unwrap_or_else(PoisonError::into_inner);
            *current = Some(image.clone());
            self.cell.begin(IdentifyState::Classifying)
        };
        self.run(generation, image).await
    }

    /// Run a fresh identification with the image already selected.
    pub async fn reidentify(&self) -> RunResult<IdentifyTerminal> {
        let started = {
            let current = self.image.lock().unwrap_or_else(PoisonError::into_inner);
            current
                .clone()
                .map(|image| (self.cell.begin(IdentifyState::Classifying), image))
        };
        match started {
            Some((generation, image)) => self.run(generation, image).await,
            None => RunResult::Rejected(Notice::no_image()),
        }
    }

    /// Dismiss the current outcome and return to idle.
    ///
    /// Anything still in flight belongs to an older generation afterwards
    /// and is discarded when it returns.
    pub fn reset(&self) {
        let _image = self.image.lock().unwrap_or_else(PoisonError::into_inner);
        let generation = self.cell.begin(IdentifyState::Idle);
        debug!(generation = %generation, "identification session reset");
    }

    pub fn current_image(&self) -> Option<SelectedImage> {
        self.image
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn state(&self) -> IdentifyState {
        self.cell.state()
    }

    pub fn snapshot(&self) -> Snapshot<IdentifyState> {
        self.cell.snapshot()
    }

    /// Follow every state transition.
    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<Snapshot<IdentifyState>> {
        self.cell.subscribe()
    }

    /// Drive one attempt. The image lock must have been held while
    /// `generation` was allocated, so the newest generation always runs the
    /// image `current_image` reports.
    async fn run(
        &self,
        generation: Generation,
        image: SelectedImage,
    ) -> RunResult<IdentifyTerminal> {
        info!(generation = %generation, image = %image.filename, "starting identification");

        let payload = match ImagePayload::build(&image) {
            Ok(payload) => Arc::new(payload),
            Err(e) => {
                warn!(generation = %generation, "cannot build image payload: {}", e);
                let failure = StageFailure::from_error(Stage::SpeciesClassification, &e);
                let notice = Notice::for_failure(&failure);
                return self.finish(
                    generation,
                    IdentificationOutcome::SpeciesFailed(failure),
                    Some(notice),
                );
            }
        };

        // Stage 1: species.
        let request = DiagnosisRequest::new(
            Stage::SpeciesClassification,
            generation,
            Arc::clone(&payload),
        );
        let species = self
            .backend
            .classify_species(&request)
            .await
            .and_then(|p| p.into_prediction());

        if !self.cell.is_current(generation) {
            debug!(generation = %generation, "discarding stale species response");
            return RunResult::Superseded;
        }

        let species = match species {
            Ok(species) => species,
            Err(e) => {
                warn!(generation = %generation, stage = %Stage::SpeciesClassification, "{}", e);
                let failure = StageFailure::from_error(Stage::SpeciesClassification, &e);
                let notice = Notice::for_failure(&failure);
                return self.finish(
                    generation,
                    IdentificationOutcome::SpeciesFailed(failure),
                    Some(notice),
                );
            }
        };

        if !species.is_dog() {
            info!(generation = %generation, species = %species.label, "not a dog, skipping breed stage");
            return self.finish(generation, IdentificationOutcome::NotADog { species }, None);
        }

        if !self.cell.commit(
            generation,
            IdentifyState::BreedPending {
                species: species.clone(),
            },
        ) {
            return RunResult::Superseded;
        }

        // Stage 2: breed, strictly after a successful "Dog".
        let request = DiagnosisRequest::new(Stage::BreedIdentification, generation, payload);
        let breed = self
            .backend
            .identify_breed(&request)
            .await
            .and_then(|p| p.into_prediction());

        if !self.cell.is_current(generation) {
            debug!(generation = %generation, "discarding stale breed response");
            return RunResult::Superseded;
        }

        let (breed, notice) = match breed {
            Ok(breed) => (StageResult::Success(breed), None),
            Err(e) => {
                // Species stays valid; only the breed slot records the failure.
                warn!(generation = %generation, stage = %Stage::BreedIdentification, "{}", e);
                let failure = StageFailure::from_error(Stage::BreedIdentification, &e);
                let notice = Notice::for_failure(&failure);
                (StageResult::Failure(failure), Some(notice))
            }
        };

        self.finish(
            generation,
            IdentificationOutcome::Dog { species, breed },
            notice,
        )
    }

    fn finish(
        &self,
        generation: Generation,
        outcome: IdentificationOutcome,
        notice: Option<Notice>,
    ) -> RunResult<IdentifyTerminal> {
        let terminal = IdentifyTerminal { outcome, notice };
        if self
            .cell
            .commit(generation, IdentifyState::Terminal(terminal.clone()))
        {
            info!(generation = %generation, "identification finished");
            RunResult::Completed(terminal)
        } else {
            debug!(generation = %generation, "discarding stale identification outcome");
            RunResult::Superseded
        }
    }
}
