pub mod batch;
pub mod config;
pub mod download;
pub mod engine;
pub mod intake;
pub mod orchestrator;
pub mod testing;
pub mod ui;

pub use batch::{Batch, BatchItem, Blob, ConversionResult, ItemStatus, RawFile, SourceHandle};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config, ConfigError,
};
pub use download::{
    DirectoryHost, DownloadConfig, DownloadError, DownloadHost, DownloadTrigger, ObjectRef,
    ReferenceGuard,
};
pub use engine::{
    EncodeProfile, EngineConfig, EngineError, EngineLifecycle, EngineState, FfmpegEngine,
    ProgressFn, TranscodeEngine,
};
pub use intake::{IntakeConfig, IntakeError, IntakeFilter};
pub use orchestrator::{
    BatchEvent, BatchOrchestrator, BatchSnapshot, ConversionError, OrchestratorConfig,
    OrchestratorError, Phase,
};
pub use ui::{project, UiView};
