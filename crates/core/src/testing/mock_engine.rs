//! Mock transcoding engine for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::engine::{EngineError, ProgressFn, TranscodeEngine};

/// Input bytes starting with this marker make `run` fail.
pub const CORRUPT_MARKER: &[u8] = b"corrupt";

/// Prefix the mock prepends to an input to produce its output.
pub const OUTPUT_PREFIX: &[u8] = b"mp4:";

/// Mock implementation of the TranscodeEngine trait.
///
/// Keeps its working namespace in memory. `run` looks for `-i <input>` and
/// treats the final argument as the output name; the output is the input
/// bytes prefixed with [`OUTPUT_PREFIX`].
///
/// Clones share state, so a test can keep one handle for assertions while
/// the lifecycle owns another.
#[derive(Debug, Clone, Default)]
pub struct MockEngine {
    loads: Arc<AtomicUsize>,
    failing_loads: Arc<RwLock<usize>>,
    load_delay: Arc<RwLock<Duration>>,
    run_delay: Arc<RwLock<Duration>>,
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    runs: Arc<RwLock<Vec<Vec<String>>>>,
    written: Arc<RwLock<Vec<String>>>,
    removed: Arc<RwLock<Vec<String>>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `load` has been called.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Make the next `n` loads fail.
    pub async fn fail_next_loads(&self, n: usize) {
        *self.failing_loads.write().await = n;
    }

    pub async fn set_load_delay(&self, delay: Duration) {
        *self.load_delay.write().await = delay;
    }

    pub async fn set_run_delay(&self, delay: Duration) {
        *self.run_delay.write().await = delay;
    }

    /// Argument lists of every `run` call, in order.
    pub async fn runs(&self) -> Vec<Vec<String>> {
        self.runs.read().await.clone()
    }

    /// Names passed to `write_input`, in order.
    pub async fn written(&self) -> Vec<String> {
        self.written.read().await.clone()
    }

    /// Names passed to `remove`, in order.
    pub async fn removed(&self) -> Vec<String> {
        self.removed.read().await.clone()
    }

    /// Names currently present in the working namespace.
    pub async fn entries(&self) -> Vec<String> {
        let mut names: Vec<String> = self.files.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    fn input_arg(args: &[String]) -> Option<&str> {
        args.windows(2)
            .find(|pair| pair[0] == "-i")
            .map(|pair| pair[1].as_str())
    }
}

#[async_trait]
impl TranscodeEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn load(&self, progress: ProgressFn) -> Result<(), EngineError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        progress(0.0);

        let delay = *self.load_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        {
            let mut failing = self.failing_loads.write().await;
            if *failing > 0 {
                *failing -= 1;
                return Err(EngineError::load_failed("mock load failure"));
            }
        }

        progress(1.0);
        Ok(())
    }

    async fn write_input(&self, name: &str, bytes: &[u8]) -> Result<(), EngineError> {
        self.written.write().await.push(name.to_string());
        self.files
            .write()
            .await
            .insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn run(&self, args: &[String], progress: ProgressFn) -> Result<(), EngineError> {
        self.runs.write().await.push(args.to_vec());

        let input_name = Self::input_arg(args)
            .ok_or_else(|| EngineError::run_failed("no input argument", None))?;
        let output_name = args
            .last()
            .ok_or_else(|| EngineError::run_failed("no output argument", None))?;

        let input = self
            .files
            .read()
            .await
            .get(input_name)
            .cloned()
            .ok_or_else(|| EngineError::MissingEntry {
                name: input_name.to_string(),
            })?;

        let delay = *self.run_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if input.starts_with(CORRUPT_MARKER) {
            return Err(EngineError::run_failed(
                "exit status: 1",
                Some(format!("{}: Invalid data found when processing input", input_name)),
            ));
        }

        progress(0.5);
        let mut output = OUTPUT_PREFIX.to_vec();
        output.extend_from_slice(&input);
        self.files.write().await.insert(output_name.clone(), output);
        progress(1.0);
        Ok(())
    }

    async fn read_output(&self, name: &str) -> Result<Vec<u8>, EngineError> {
        self.files
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::MissingEntry {
                name: name.to_string(),
            })
    }

    async fn remove(&self, name: &str) -> Result<(), EngineError> {
        self.removed.write().await.push(name.to_string());
        self.files.write().await.remove(name);
        Ok(())
    }
}
