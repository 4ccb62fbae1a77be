use serde::{Deserialize, Serialize};

/// Accepted source extension and the extension produced files get.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeConfig {
    /// Extension (with leading dot) a file must end with, compared case-insensitively.
    #[serde(default = "default_source_extension")]
    pub source_extension: String,

    /// Extension (with leading dot) substituted into target names.
    #[serde(default = "default_target_extension")]
    pub target_extension: String,
}

fn default_source_extension() -> String {
    ".mov".to_string()
}

fn default_target_extension() -> String {
    ".mp4".to_string()
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            source_extension: default_source_extension(),
            target_extension: default_target_extension(),
        }
    }
}
