//! Async schedule generation service.
//!
//! Wires the snapshot repository, the hierarchical scheduler, the progress
//! tracker, and the publication board into one background-friendly entry
//! point. The CPU-bound solve runs on the blocking pool; the caller gets
//! either the full event list or the infeasibility sentinel.

use super::board::ScheduleBoard;
use super::progress::ProgressTracker;
use crate::api::GenerationOutcome;
use crate::config::SchedulerConfig;
use crate::scheduler::HierarchicalScheduler;
use crate::snapshot::SnapshotRepository;
use std::sync::Arc;
use tracing::{error, info};

/// Run one full generation pass.
///
/// On success the event list is published to the board, progress reaches
/// 100, and the events are returned. An infeasible phase yields
/// [`GenerationOutcome::Impossible`] with progress left at its last value;
/// unexpected failures (snapshot errors, solver panics) additionally set
/// progress to -1. Previously published schedules stay up on failure.
pub async fn generate_schedule(
    repo: Arc<dyn SnapshotRepository>,
    config: SchedulerConfig,
    tracker: &ProgressTracker,
    board: &ScheduleBoard,
    process_id: Option<String>,
) -> GenerationOutcome {
    let process_id = tracker.start_run(process_id);
    tracker.log(&process_id, "Loading input snapshots...");

    let load_handle = tracker.handle(&process_id);
    let scheduler =
        match HierarchicalScheduler::load(repo.as_ref(), config, &load_handle).await {
            Ok(scheduler) => scheduler,
            Err(e) => {
                error!(process_id = %process_id, error = %e, "snapshot loading failed");
                tracker.crash(&process_id, format!("Failed to load snapshots: {}", e));
                return GenerationOutcome::Impossible;
            }
        };

    tracker.log(&process_id, "Solving scheduling phases...");
    let solve_handle = tracker.handle(&process_id);
    let solved = tokio::task::spawn_blocking(move || scheduler.solve(&solve_handle)).await;

    match solved {
        Ok(Ok(events)) => {
            board.publish(&events);
            tracker.update(&process_id, 100);
            tracker.log(
                &process_id,
                format!("Published {} schedule events", events.len()),
            );
            tracker.complete(&process_id);
            info!(process_id = %process_id, events = events.len(), "generation complete");
            GenerationOutcome::Scheduled(events)
        }
        Ok(Err(e)) => {
            error!(process_id = %process_id, error = %e, "generation infeasible");
            tracker.fail(&process_id, e.to_string());
            GenerationOutcome::Impossible
        }
        Err(join_error) => {
            error!(process_id = %process_id, error = %join_error, "solver task aborted");
            tracker.crash(&process_id, format!("Solver task aborted: {}", join_error));
            GenerationOutcome::Impossible
        }
    }
}
