//! File intake: turns a raw selection of files into a batch.
//!
//! Files whose names do not end with the configured source extension are
//! dropped silently; a selection with no matching file at all is rejected.

mod config;
mod filter;

pub use config::IntakeConfig;
pub use filter::{IntakeError, IntakeFilter};
