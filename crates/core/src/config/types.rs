use serde::{Deserialize, Serialize};

use crate::download::DownloadConfig;
use crate::engine::{EncodeProfile, EngineConfig};
use crate::intake::IntakeConfig;
use crate::orchestrator::OrchestratorConfig;

/// Root configuration
///
/// Every section is optional; a missing section falls back to the defaults
/// that convert `.mov` files into H.264/AAC `.mp4` files.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub intake: IntakeConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub profile: EncodeProfile,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}
