//! External process predictor
//!
//! Writes the feature rows as one JSON array to the child's stdin, closes it,
//! and reads a JSON array of powers from stdout. The exchange runs under a
//! deadline; the child is killed if the deadline passes or the caller goes
//! away.

use crate::{ensure_non_empty, InferenceError, Predictor};
use async_trait::async_trait;
use feature_engine::FeatureRow;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// How to launch the external model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubprocessConfig {
    /// Executable, resolved through `PATH`
    pub program: String,
    /// Arguments, e.g. the model script
    pub args: Vec<String>,
    /// Working directory for the child
    pub working_dir: Option<PathBuf>,
    /// Deadline for the whole exchange (ms)
    pub timeout_ms: u64,
}

impl Default for SubprocessConfig {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            args: vec!["predict.py".to_string()],
            working_dir: None,
            timeout_ms: 30_000,
        }
    }
}

/// Predictor backed by a one-shot child process per request
pub struct SubprocessPredictor {
    config: SubprocessConfig,
}

impl SubprocessPredictor {
    /// Create a new subprocess predictor
    pub fn new(config: SubprocessConfig) -> Self {
        info!(
            "Creating subprocess predictor: {} {:?} (timeout={}ms)",
            config.program, config.args, config.timeout_ms
        );
        Self { config }
    }

    pub fn config(&self) -> &SubprocessConfig {
        &self.config
    }

    async fn exchange(&self, payload: Vec<u8>) -> Result<Output, InferenceError> {
        let mut command = Command::new(&self.config.program);
        command
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.config.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| InferenceError::Spawn {
            program: self.config.program.clone(),
            source,
        })?;

        let stdin = child.stdin.take();
        let write = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(&payload).await?;
                stdin.shutdown().await?;
            }
            Ok::<(), std::io::Error>(())
        };

        // stdout is drained while stdin is written so neither pipe can fill up
        let (written, output) = tokio::join!(write, child.wait_with_output());
        match written {
            Ok(()) => {}
            // child exited without reading its input; its status tells the story
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                debug!("Predictor closed stdin early");
            }
            Err(e) => return Err(e.into()),
        }
        Ok(output?)
    }
}

fn parse_output(output: &Output, expected: usize) -> Result<Vec<f64>, InferenceError> {
    if !output.status.success() {
        return Err(InferenceError::ProcessFailed {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let powers: Vec<f64> = serde_json::from_slice(&output.stdout)
        .map_err(|e| InferenceError::MalformedOutput(e.to_string()))?;

    if powers.len() != expected {
        return Err(InferenceError::OutputLength {
            expected,
            actual: powers.len(),
        });
    }
    Ok(powers)
}

#[async_trait]
impl Predictor for SubprocessPredictor {
    fn name(&self) -> &'static str {
        "subprocess"
    }

    async fn predict(&self, features: &[FeatureRow]) -> Result<Vec<f64>, InferenceError> {
        ensure_non_empty(features)?;
        let payload = serde_json::to_vec(features)
            .map_err(|e| InferenceError::InvalidInput(e.to_string()))?;

        let start = Instant::now();
        let deadline = Duration::from_millis(self.config.timeout_ms);
        let output = match timeout(deadline, self.exchange(payload)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    "Predictor {} did not finish within {}ms, killed",
                    self.config.program, self.config.timeout_ms
                );
                return Err(InferenceError::Timeout(self.config.timeout_ms));
            }
        };

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            debug!("Predictor stderr: {}", stderr.trim());
        }

        let powers = parse_output(&output, features.len())?;
        debug!(
            "Predicted {} rows in {}ms",
            powers.len(),
            start.elapsed().as_millis()
        );
        Ok(powers)
    }
}
