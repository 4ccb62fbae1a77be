//! Single-flight lifecycle of the transcoding engine.

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

use super::error::EngineError;
use super::traits::{ProgressFn, TranscodeEngine};

/// Load state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Uninitialized,
    Initializing,
    Ready,
}

type LoadFuture = Shared<BoxFuture<'static, Result<(), Arc<EngineError>>>>;

/// Owns the engine and guarantees it is loaded at most once at a time.
///
/// Concurrent [`ensure_ready`](Self::ensure_ready) callers share one in-flight
/// load and all observe its outcome. A failed load puts the state back to
/// [`EngineState::Uninitialized`], so the next call starts a fresh load.
pub struct EngineLifecycle<E: TranscodeEngine + 'static> {
    engine: Arc<E>,
    state: Arc<watch::Sender<EngineState>>,
    load_progress: Arc<watch::Sender<f32>>,
    inflight: Mutex<Option<LoadFuture>>,
}

impl<E: TranscodeEngine + 'static> EngineLifecycle<E> {
    /// Wraps an engine that has not been loaded yet.
    pub fn new(engine: E) -> Self {
        Self::from_arc(Arc::new(engine))
    }

    /// Wraps an engine shared with other owners.
    pub fn from_arc(engine: Arc<E>) -> Self {
        let (state, _) = watch::channel(EngineState::Uninitialized);
        let (load_progress, _) = watch::channel(0.0);
        Self {
            engine,
            state: Arc::new(state),
            load_progress: Arc::new(load_progress),
            inflight: Mutex::new(None),
        }
    }

    /// The managed engine.
    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// Current load state.
    pub fn state(&self) -> EngineState {
        *self.state.borrow()
    }

    /// Watches load state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<EngineState> {
        self.state.subscribe()
    }

    /// Watches load progress (`0.0..=1.0`). Separate from per-file conversion progress.
    pub fn subscribe_load_progress(&self) -> watch::Receiver<f32> {
        self.load_progress.subscribe()
    }

    /// Loads the engine unless it is already ready.
    pub async fn ensure_ready(&self) -> Result<(), Arc<EngineError>> {
        if self.state() == EngineState::Ready {
            return Ok(());
        }

        let load = {
            let mut inflight = self.inflight.lock().await;
            match (self.state(), inflight.as_ref()) {
                (EngineState::Ready, _) => return Ok(()),
                (EngineState::Initializing, Some(load)) => load.clone(),
                // Uninitialized: never loaded, or the previous attempt failed.
                _ => {
                    let load = self.start_load();
                    *inflight = Some(load.clone());
                    load
                }
            }
        };

        load.await
    }

    fn start_load(&self) -> LoadFuture {
        self.state.send_replace(EngineState::Initializing);
        self.load_progress.send_replace(0.0);

        let engine = Arc::clone(&self.engine);
        let state = Arc::clone(&self.state);
        let progress_tx = Arc::clone(&self.load_progress);
        let progress: ProgressFn = Arc::new(move |ratio| {
            progress_tx.send_replace(ratio.clamp(0.0, 1.0));
        });

        async move {
            info!("Loading {} engine", engine.name());
            match engine.load(progress).await {
                Ok(()) => {
                    state.send_replace(EngineState::Ready);
                    info!("{} engine ready", engine.name());
                    Ok(())
                }
                Err(e) => {
                    state.send_replace(EngineState::Uninitialized);
                    warn!("{} engine failed to load: {}", engine.name(), e);
                    Err(Arc::new(e))
                }
            }
        }
        .boxed()
        .shared()
    }
}
