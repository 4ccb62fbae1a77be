//! Batch data model: the files moving through one conversion run.

mod types;

pub use types::{Batch, BatchItem, Blob, ConversionResult, ItemStatus, RawFile, SourceHandle};
