use thiserror::Error;
use tracing::debug;

use crate::batch::{Batch, BatchItem, ItemStatus, RawFile};

use super::config::IntakeConfig;

/// Errors raised while accepting files.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// None of the supplied files has the accepted extension.
    #[error("no {extension} files were selected")]
    NoMatchingFiles { extension: String },
}

/// Filters raw files by extension and derives their target names.
#[derive(Debug, Clone, Default)]
pub struct IntakeFilter {
    config: IntakeConfig,
}

impl IntakeFilter {
    pub fn new(config: IntakeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IntakeConfig {
        &self.config
    }

    /// Byte offset where the source extension starts, if `name` ends with it.
    fn suffix_start(&self, name: &str) -> Option<usize> {
        let ext = &self.config.source_extension;
        let start = name.len().checked_sub(ext.len())?;
        if !name.is_char_boundary(start) {
            return None;
        }
        name[start..].eq_ignore_ascii_case(ext).then_some(start)
    }

    /// Whether `name` ends with the source extension (ASCII case-insensitive).
    pub fn accepts(&self, name: &str) -> bool {
        self.suffix_start(name).is_some()
    }

    /// Replaces the trailing source extension with the target extension.
    ///
    /// Only the final suffix is replaced: `a.mov.mov` becomes `a.mov.mp4`.
    pub fn target_name(&self, name: &str) -> Option<String> {
        let start = self.suffix_start(name)?;
        Some(format!("{}{}", &name[..start], self.config.target_extension))
    }

    /// Builds a batch from the accepted files, keeping their relative order.
    pub fn intake(&self, files: Vec<RawFile>) -> Result<Batch, IntakeError> {
        let total = files.len();
        let items: Vec<BatchItem> = files
            .into_iter()
            .filter_map(|file| {
                let target_name = self.target_name(&file.name)?;
                Some((file, target_name))
            })
            .enumerate()
            .map(|(index, (file, target_name))| BatchItem {
                index,
                display_name: file.name,
                target_name,
                source: file.source,
                status: ItemStatus::Pending,
            })
            .collect();

        if items.is_empty() {
            return Err(IntakeError::NoMatchingFiles {
                extension: self.config.source_extension.clone(),
            });
        }

        debug!(
            "Accepted {} of {} files ({})",
            items.len(),
            total,
            self.config.source_extension
        );
        Ok(Batch::new(items))
    }
}
