//! Progress side-channel for generation runs.
//!
//! Each run is tracked under a caller-supplied (or generated) process id:
//! a coarse progress percentage with last-writer-wins semantics, a status,
//! and a timestamped message trail. A separate status endpoint polls this
//! state; readers must accept stale values.

use crate::scheduler::ProgressSink;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Progress value signalling that the run crashed.
pub const PROGRESS_CRASHED: i32 = -1;

/// Lifecycle state of one generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

/// A single log entry with timestamp and message.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RunMessage {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub message: String,
}

/// Tracked state of one run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RunRecord {
    pub process_id: String,
    pub status: RunStatus,
    /// 0..=100 during a healthy run, [`PROGRESS_CRASHED`] after a crash.
    pub progress: i32,
    pub messages: Vec<RunMessage>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// In-memory run tracker shared between the generation service and the
/// status readers.
#[derive(Clone, Default)]
pub struct ProgressTracker {
    runs: Arc<RwLock<HashMap<String, RunRecord>>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a run and return its process id. A fresh id is generated
    /// when the caller does not supply one.
    pub fn start_run(&self, process_id: Option<String>) -> String {
        let process_id = process_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let record = RunRecord {
            process_id: process_id.clone(),
            status: RunStatus::Running,
            progress: 0,
            messages: Vec::new(),
            created_at: chrono::Utc::now(),
            completed_at: None,
        };
        self.runs.write().insert(process_id.clone(), record);
        process_id
    }

    /// Set the progress percentage. Last writer wins.
    pub fn update(&self, process_id: &str, value: i32) {
        let mut runs = self.runs.write();
        if let Some(run) = runs.get_mut(process_id) {
            run.progress = value;
        }
    }

    /// Append a message to the run's trail.
    pub fn log(&self, process_id: &str, message: impl Into<String>) {
        let mut runs = self.runs.write();
        if let Some(run) = runs.get_mut(process_id) {
            run.messages.push(RunMessage {
                timestamp: chrono::Utc::now(),
                message: message.into(),
            });
        }
    }

    /// Mark the run successful.
    pub fn complete(&self, process_id: &str) {
        let mut runs = self.runs.write();
        if let Some(run) = runs.get_mut(process_id) {
            run.status = RunStatus::Completed;
            run.completed_at = Some(chrono::Utc::now());
        }
    }

    /// Mark the run failed. Progress keeps its last value so callers can see
    /// how far the run got before the infeasibility.
    pub fn fail(&self, process_id: &str, message: impl Into<String>) {
        let mut runs = self.runs.write();
        if let Some(run) = runs.get_mut(process_id) {
            run.status = RunStatus::Failed;
            run.completed_at = Some(chrono::Utc::now());
            run.messages.push(RunMessage {
                timestamp: chrono::Utc::now(),
                message: message.into(),
            });
        }
    }

    /// Mark the run crashed: failed status and progress [`PROGRESS_CRASHED`].
    pub fn crash(&self, process_id: &str, message: impl Into<String>) {
        self.fail(process_id, message);
        self.update(process_id, PROGRESS_CRASHED);
    }

    /// Current progress value, `None` for unknown process ids.
    pub fn progress(&self, process_id: &str) -> Option<i32> {
        self.runs.read().get(process_id).map(|run| run.progress)
    }

    pub fn get(&self, process_id: &str) -> Option<RunRecord> {
        self.runs.read().get(process_id).cloned()
    }

    /// A sink bound to one process id, handed to the scheduler by reference.
    pub fn handle(&self, process_id: &str) -> ProgressHandle {
        ProgressHandle {
            tracker: self.clone(),
            process_id: process_id.to_string(),
        }
    }
}

/// [`ProgressSink`] bound to a single run.
#[derive(Clone)]
pub struct ProgressHandle {
    tracker: ProgressTracker,
    process_id: String,
}

impl ProgressSink for ProgressHandle {
    fn update(&self, value: i32) {
        self.tracker.update(&self.process_id, value);
    }
}
