//! Service layer: run tracking, schedule publication, and the async
//! generation entry point that ties the core scheduler to its collaborators.

pub mod board;
pub mod generation;
pub mod progress;

pub use board::ScheduleBoard;
pub use generation::generate_schedule;
pub use progress::{ProgressHandle, ProgressTracker, RunRecord, RunStatus, PROGRESS_CRASHED};
