//! Testing utilities and mock implementations.
//!
//! The mocks stand in for the ffmpeg engine and the host save-file
//! mechanism, so a whole batch can run without a binary or a filesystem.
//!
//! # Example
//!
//! ```rust,ignore
//! use movshift_core::testing::{fixtures, MockDownloadHost, MockEngine};
//!
//! let engine = MockEngine::new();
//! let host = Arc::new(MockDownloadHost::new());
//! let orchestrator = fixtures::orchestrator(engine.clone(), host.clone());
//!
//! orchestrator.submit(vec![fixtures::mov("a.mov", b"frames")]).await?;
//! orchestrator.run_batch().await?;
//! assert_eq!(host.filenames(), vec!["a.mp4"]);
//! ```

mod mock_download_host;
mod mock_engine;

pub use mock_download_host::{MockDownloadHost, RecordedDownload};
pub use mock_engine::{MockEngine, CORRUPT_MARKER, OUTPUT_PREFIX};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::sync::Arc;
    use std::time::Duration;

    use super::{MockDownloadHost, MockEngine};
    use crate::batch::RawFile;
    use crate::download::DownloadTrigger;
    use crate::engine::{EncodeProfile, EngineLifecycle};
    use crate::intake::{IntakeConfig, IntakeFilter};
    use crate::orchestrator::{BatchOrchestrator, OrchestratorConfig};

    /// An in-memory file with the given name and contents.
    pub fn mov(name: &str, bytes: &[u8]) -> RawFile {
        RawFile::in_memory(name, bytes.to_vec())
    }

    /// An in-memory file whose conversion will fail in [`MockEngine`].
    pub fn corrupt_mov(name: &str) -> RawFile {
        RawFile::in_memory(name, b"corrupt".to_vec())
    }

    /// Orchestrator config with no pause between items.
    pub fn fast_config() -> OrchestratorConfig {
        OrchestratorConfig {
            inter_item_delay_ms: 0,
            ..OrchestratorConfig::default()
        }
    }

    /// An orchestrator over the given mocks with default intake and profile.
    pub fn orchestrator(
        engine: MockEngine,
        host: Arc<MockDownloadHost>,
    ) -> BatchOrchestrator<MockEngine> {
        orchestrator_with(fast_config(), engine, host)
    }

    /// Like [`orchestrator`], with an explicit orchestrator config.
    pub fn orchestrator_with(
        config: OrchestratorConfig,
        engine: MockEngine,
        host: Arc<MockDownloadHost>,
    ) -> BatchOrchestrator<MockEngine> {
        BatchOrchestrator::new(
            config,
            IntakeFilter::new(IntakeConfig::default()),
            EncodeProfile::default(),
            Arc::new(EngineLifecycle::new(engine)),
            DownloadTrigger::new(host, Duration::from_millis(100)),
        )
    }
}
