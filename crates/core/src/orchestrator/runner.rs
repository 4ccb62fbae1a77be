//! Batch orchestrator implementation.

use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info, warn};

use crate::batch::{Batch, BatchItem, Blob, ConversionResult, ItemStatus, RawFile};
use crate::download::DownloadTrigger;
use crate::engine::{EncodeProfile, EngineError, EngineLifecycle, ProgressFn, TranscodeEngine};
use crate::intake::IntakeFilter;

use super::config::OrchestratorConfig;
use super::types::{
    BatchEvent, BatchSnapshot, ConversionCause, ConversionError, ItemView, OrchestratorError,
    Phase,
};

/// Mutable state guarded by the orchestrator.
#[derive(Default)]
struct RunState {
    phase: Phase,
    batch: Option<Batch>,
    results: Vec<ConversionResult>,
    current: Option<usize>,
    progress_percent: u8,
    message: Option<String>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

fn item_views(batch: &Batch) -> Vec<ItemView> {
    batch
        .items()
        .iter()
        .map(|item| ItemView {
            index: item.index,
            name: item.display_name.clone(),
            target_name: item.target_name.clone(),
            status: item.status,
        })
        .collect()
}

fn percent_done(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    (done as f64 / total as f64 * 100.0).round() as u8
}

/// The batch orchestrator - sequences intake, engine load, per-file
/// conversion, downloads and reset.
pub struct BatchOrchestrator<E: TranscodeEngine + 'static> {
    config: OrchestratorConfig,
    intake: IntakeFilter,
    profile: EncodeProfile,
    engine: Arc<EngineLifecycle<E>>,
    downloads: DownloadTrigger,
    state: RwLock<RunState>,
    events: broadcast::Sender<BatchEvent>,
}

impl<E: TranscodeEngine + 'static> BatchOrchestrator<E> {
    /// Create a new orchestrator.
    pub fn new(
        config: OrchestratorConfig,
        intake: IntakeFilter,
        profile: EncodeProfile,
        engine: Arc<EngineLifecycle<E>>,
        downloads: DownloadTrigger,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            config,
            intake,
            profile,
            engine,
            downloads,
            state: RwLock::new(RunState::default()),
            events,
        }
    }

    /// Subscribe to orchestrator events.
    pub fn subscribe(&self) -> broadcast::Receiver<BatchEvent> {
        self.events.subscribe()
    }

    /// Current phase.
    pub async fn phase(&self) -> Phase {
        self.state.read().await.phase
    }

    /// Results held from the last run.
    pub async fn results(&self) -> Vec<ConversionResult> {
        self.state.read().await.results.clone()
    }

    /// Get a point-in-time view for rendering.
    pub async fn snapshot(&self) -> BatchSnapshot {
        let state = self.state.read().await;
        BatchSnapshot {
            phase: state.phase,
            accepted_extension: self.intake.config().source_extension.clone(),
            batch_id: state.batch.as_ref().map(Batch::id),
            items: state.batch.as_ref().map(item_views).unwrap_or_default(),
            current: state.current,
            progress_percent: state.progress_percent,
            converted: state.results.len(),
            message: state.message.clone(),
            started_at: state.started_at,
            finished_at: state.finished_at,
        }
    }

    fn emit(&self, event: BatchEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn set_phase(&self, state: &mut RunState, phase: Phase) {
        if state.phase != phase {
            debug!("Phase {} -> {}", state.phase, phase);
            state.phase = phase;
            self.emit(BatchEvent::PhaseChanged { phase });
        }
    }

    /// Accept a new selection of files, replacing the previous batch.
    ///
    /// When no file matches, the previous batch and results are left as they were.
    pub async fn submit(&self, files: Vec<RawFile>) -> Result<usize, OrchestratorError> {
        let mut state = self.state.write().await;
        if state.phase.is_running() {
            return Err(OrchestratorError::not_while(state.phase));
        }

        let batch = match self.intake.intake(files) {
            Ok(batch) => batch,
            Err(e) => {
                self.emit(BatchEvent::IntakeRejected {
                    message: e.to_string(),
                });
                return Err(e.into());
            }
        };

        let count = batch.len();
        let batch_id = batch.id();
        let items = item_views(&batch);
        let phase = state.phase;
        *state = RunState {
            phase,
            batch: Some(batch),
            ..Default::default()
        };
        self.set_phase(&mut state, Phase::Idle);
        self.emit(BatchEvent::BatchLoaded { batch_id, items });

        info!("Accepted batch {} with {} files", batch_id, count);
        Ok(count)
    }

    /// Convert every item of the current batch, in order.
    ///
    /// Each result is handed to the download trigger as soon as it is ready.
    /// The first failure stops the run; items after it are not attempted.
    pub async fn run_batch(&self) -> Result<Vec<ConversionResult>, OrchestratorError> {
        let items: Vec<BatchItem> = {
            let mut state = self.state.write().await;
            if state.phase.is_running() {
                return Err(OrchestratorError::not_while(state.phase));
            }
            let batch = state.batch.as_mut().ok_or(OrchestratorError::NoBatch)?;
            batch.reset_statuses();
            let items = batch.items().to_vec();

            state.results.clear();
            state.current = None;
            state.progress_percent = 0;
            state.message = None;
            state.started_at = Some(Utc::now());
            state.finished_at = None;
            self.set_phase(&mut state, Phase::LoadingEngine);
            items
        };
        let total = items.len();
        info!("Starting batch of {} files", total);

        if let Err(e) = self.load_engine().await {
            return Err(self.fail(OrchestratorError::EngineLoad(e), None).await);
        }

        {
            let mut state = self.state.write().await;
            self.set_phase(&mut state, Phase::Converting);
        }

        for item in &items {
            if let Err(e) = self.process_item(item, total).await {
                return Err(self.fail(e.into(), Some(item.index)).await);
            }
        }

        let results = {
            let mut state = self.state.write().await;
            let converted = state.results.len();
            state.current = None;
            state.message = Some(format!("Converted {} of {} files", converted, total));
            state.finished_at = Some(Utc::now());
            self.set_phase(&mut state, Phase::Completed);
            state.results.clone()
        };

        info!("Batch completed: {} files converted", results.len());
        self.emit(BatchEvent::Completed {
            converted: results.len(),
        });
        Ok(results)
    }

    /// Drop the batch and its results, back to the pre-intake state.
    ///
    /// Allowed from `Completed` and `Failed`, and also from `Idle`, where it
    /// discards a submitted batch that has not been run. Rejected while a
    /// batch is loading the engine or converting.
    pub async fn reset(&self) -> Result<(), OrchestratorError> {
        let mut state = self.state.write().await;
        if state.phase.is_running() {
            return Err(OrchestratorError::not_while(state.phase));
        }

        let previous = std::mem::take(&mut *state);
        let released = previous.results.len();
        drop(previous);

        self.emit(BatchEvent::Reset);
        info!("Reset orchestrator, released {} results", released);
        Ok(())
    }

    /// Waits for the engine, forwarding its load progress as events.
    async fn load_engine(&self) -> Result<(), Arc<EngineError>> {
        let mut progress = self.engine.subscribe_load_progress();
        let ready = self.engine.ensure_ready();
        tokio::pin!(ready);

        loop {
            tokio::select! {
                result = &mut ready => return result,
                changed = progress.changed() => {
                    if changed.is_err() {
                        return ready.await;
                    }
                    let ratio = *progress.borrow_and_update();
                    self.emit(BatchEvent::EngineLoadProgress { ratio });
                }
            }
        }
    }

    async fn process_item(&self, item: &BatchItem, total: usize) -> Result<(), ConversionError> {
        let index = item.index;
        {
            let mut state = self.state.write().await;
            if let Some(batch) = state.batch.as_mut() {
                batch.set_status(index, ItemStatus::Converting);
            }
            state.current = Some(index);
        }
        info!("Converting {}/{}: {}", index + 1, total, item.display_name);
        self.emit(BatchEvent::ItemStarted {
            index,
            total,
            name: item.display_name.clone(),
        });

        let failure = |cause: ConversionCause| ConversionError {
            index,
            total,
            file_name: item.display_name.clone(),
            cause,
        };

        let bytes = item
            .source
            .read()
            .await
            .map_err(|e| failure(ConversionCause::Source(e)))?;

        let intake = self.intake.config();
        let input_name = format!(
            "input_{}{}",
            index,
            intake.source_extension.to_ascii_lowercase()
        );
        let output_name = format!(
            "output_{}{}",
            index,
            intake.target_extension.to_ascii_lowercase()
        );

        let output = self.transcode(index, &input_name, &output_name, bytes).await;
        self.cleanup(&[input_name.as_str(), output_name.as_str()]).await;
        let output = output.map_err(|e| failure(ConversionCause::Engine(e)))?;

        let result = ConversionResult {
            index,
            target_name: item.target_name.clone(),
            blob: Blob::new(output, self.profile.media_type.clone()),
        };
        self.state.write().await.results.push(result.clone());

        self.downloads.trigger(&result.blob, &result.target_name);

        let delay = self.config.inter_item_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let percent = percent_done(index + 1, total);
        {
            let mut state = self.state.write().await;
            if let Some(batch) = state.batch.as_mut() {
                batch.set_status(index, ItemStatus::Done);
            }
            state.progress_percent = percent;
        }
        self.emit(BatchEvent::ItemCompleted {
            index,
            target_name: result.target_name,
        });
        self.emit(BatchEvent::Progress { percent });
        Ok(())
    }

    /// Write, run and read back one item. Only one input and one output
    /// buffer are alive at a time.
    async fn transcode(
        &self,
        index: usize,
        input_name: &str,
        output_name: &str,
        bytes: Cow<'_, [u8]>,
    ) -> Result<Vec<u8>, EngineError> {
        let engine = self.engine.engine();
        engine.write_input(input_name, &bytes).await?;
        drop(bytes);

        let events = self.events.clone();
        let progress: ProgressFn = Arc::new(move |ratio| {
            let _ = events.send(BatchEvent::ItemProgress { index, ratio });
        });
        let args = self.profile.to_args(input_name, output_name);
        engine.run(&args, progress).await?;

        engine.read_output(output_name).await
    }

    /// Removes working files; failures only cost disk space, so they are logged.
    async fn cleanup(&self, names: &[&str]) {
        for name in names {
            if let Err(e) = self.engine.engine().remove(name).await {
                warn!("Failed to remove working file {}: {}", name, e);
            }
        }
    }

    async fn fail(&self, err: OrchestratorError, failed_index: Option<usize>) -> OrchestratorError {
        let message = format!("Error: {}", err);
        {
            let mut state = self.state.write().await;
            if let (Some(index), Some(batch)) = (failed_index, state.batch.as_mut()) {
                batch.set_status(index, ItemStatus::Failed);
            }
            state.current = None;
            state.message = Some(message.clone());
            state.finished_at = Some(Utc::now());
            self.set_phase(&mut state, Phase::Failed);
        }
        error!("Batch aborted: {}", err);
        self.emit(BatchEvent::Failed { message });
        err
    }
}
