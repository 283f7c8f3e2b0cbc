//! Mock services for testing
//!
//! A [`MirrorOperations`] implementation that records its calls instead of
//! touching git, and tracks how many calls overlapped.

use async_trait::async_trait;
use repomirror::infrastructure::scm::scm_interface::{MirrorOperations, MirrorOutcome, ScmError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorCall {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub default_branch: String,
}

/// Recording mirror executor
pub struct RecordingMirror {
    calls: Mutex<Vec<MirrorCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Duration,
}

impl RecordingMirror {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    /// Hold every call for `delay` so that overlapping calls can be observed
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            delay,
        }
    }

    pub fn calls(&self) -> Vec<MirrorCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MirrorOperations for RecordingMirror {
    async fn mirror(
        &self,
        source: &Path,
        destination: &Path,
        default_branch: &str,
    ) -> Result<MirrorOutcome, ScmError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        self.calls.lock().unwrap().push(MirrorCall {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            default_branch: default_branch.to_string(),
        });

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(MirrorOutcome::Created)
    }
}
