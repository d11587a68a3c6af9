//! Per-phase model assembly and solve.
//!
//! Each phase compiles into a pure-binary program: one variable per
//! candidate placement `(day, start offset, optional room)` of each session.
//! No-overlap becomes a `<= 1` row per resource and global slot, the
//! structural group constraints become aggregate equality rows over
//! candidate subsets, and prior-phase room occupancy is injected by
//! filtering room candidates against the ledger's coalesced runs. The
//! objective minimises lunch-relaxed placements; any feasible assignment is
//! otherwise accepted.

use super::occupancy::OccupancyLedger;
use super::partition::Phase;
use super::sessions::{CoursePlan, SessionGroup, SessionPlan};
use super::SchedulerError;
use crate::config::SchedulerConfig;
use crate::models::{RoomPool, SectionKey, TimeGrid};
use good_lp::solvers::highs::{highs, HighsParallelType};
use good_lp::{
    variable, Constraint, Expression, ProblemVariables, ResolutionError, Solution, SolverModel,
    Variable,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info};

/// Parallel search workers handed to the solver.
const SOLVER_THREADS: u32 = 8;

/// A fully determined placement for one session, pointing back into the
/// phase's course plans.
#[derive(Debug, Clone)]
pub(crate) struct PlacedSession {
    pub plan_index: usize,
    pub group_index: usize,
    pub sid: u32,
    pub start: u32,
    pub day: u32,
    pub duration: u32,
    /// Index into the room pool of the group's room kind.
    pub room: Option<usize>,
}

struct Candidate {
    var: Variable,
    start: u32,
    day: u32,
    offset: u32,
    room: Option<usize>,
    relaxed: bool,
}

struct SessionVars<'p> {
    plan_index: usize,
    group_index: usize,
    plan: &'p CoursePlan,
    group: &'p SessionGroup,
    session: &'p SessionPlan,
    cands: Vec<Candidate>,
}

/// Solve one phase. Returns a placement per session, or the phase-level
/// infeasibility that fails the whole run.
pub(crate) fn solve_phase(
    grid: &TimeGrid,
    rooms: &RoomPool,
    ledger: &OccupancyLedger,
    config: &SchedulerConfig,
    phase: Phase,
    plans: &[CoursePlan],
    timeout_secs: u64,
) -> Result<Vec<PlacedSession>, SchedulerError> {
    let mut vars = ProblemVariables::new();

    // Room occupancy from earlier phases, one sorted run list per room.
    let mut blocked_runs: HashMap<(&'static str, usize), Vec<(u32, u32)>> = HashMap::new();
    for kind in ["lecture", "lab"] {
        for index in 0..rooms.count(kind) {
            let runs = ledger.coalesced_room_runs(kind, index);
            if !runs.is_empty() {
                blocked_runs.insert((kind, index), runs);
            }
        }
    }

    let mut sessions: Vec<SessionVars> = Vec::new();
    for (plan_index, plan) in plans.iter().enumerate() {
        for (group_index, group) in plan.groups.iter().enumerate() {
            let room_kind = group.kind.room_kind();
            for session in &group.sessions {
                let room_count = room_kind.map(|k| rooms.count(k)).unwrap_or(0);
                let mut cands = Vec::new();
                for (slot, relaxed) in session.domain.iter() {
                    let day = grid.day_of(slot);
                    let offset = grid.offset_of(slot);
                    if session.physical && room_count > 0 {
                        let kind = room_kind.unwrap_or_default();
                        for room in 0..room_count {
                            if let Some(runs) = blocked_runs.get(&(kind, room)) {
                                if overlaps_run(runs, slot, slot + session.duration) {
                                    continue;
                                }
                            }
                            cands.push(Candidate {
                                var: vars.add(variable().binary()),
                                start: slot,
                                day,
                                offset,
                                room: Some(room),
                                relaxed,
                            });
                        }
                    } else {
                        cands.push(Candidate {
                            var: vars.add(variable().binary()),
                            start: slot,
                            day,
                            offset,
                            room: None,
                            relaxed,
                        });
                    }
                }
                sessions.push(SessionVars {
                    plan_index,
                    group_index,
                    plan,
                    group,
                    session,
                    cands,
                });
            }
        }
    }

    let mut constraints: Vec<Constraint> = Vec::new();

    // Every session takes exactly one placement.
    for sv in &sessions {
        let mut pick = Expression::from(0.0);
        for c in &sv.cands {
            pick += c.var;
        }
        constraints.push(pick.eq(1.0));
    }

    // Section no-overlap: one meeting per section per global slot. A shared
    // session counts for both of its sections.
    let mut section_usage: BTreeMap<(SectionKey, u32), Vec<(usize, Variable)>> = BTreeMap::new();
    for (si, sv) in sessions.iter().enumerate() {
        for block in &sv.group.blocks {
            let key = sv.plan.section_key(*block);
            for c in &sv.cands {
                for slot in c.start..c.start + sv.session.duration {
                    section_usage
                        .entry((key.clone(), slot))
                        .or_default()
                        .push((si, c.var));
                }
            }
        }
    }
    push_capacity_rows(&mut constraints, section_usage.into_values(), 1);

    // Room no-overlap: one meeting per physical room per global slot.
    let mut room_usage: BTreeMap<(usize, u32), Vec<(usize, Variable)>> = BTreeMap::new();
    for (si, sv) in sessions.iter().enumerate() {
        for c in &sv.cands {
            let Some(room) = c.room else { continue };
            // Lab rooms live in their own pool; offset their indices past
            // the lecture pool so the two kinds never share a row.
            let room_id = match sv.group.kind.room_kind() {
                Some("lab") => rooms.count("lecture") + room,
                _ => room,
            };
            for slot in c.start..c.start + sv.session.duration {
                room_usage
                    .entry((room_id, slot))
                    .or_default()
                    .push((si, c.var));
            }
        }
    }
    push_capacity_rows(&mut constraints, room_usage.into_values(), 1);

    // Daily in-person cap per course block.
    let mut daily_physical: BTreeMap<(usize, char, u32), Vec<(usize, Variable)>> = BTreeMap::new();
    for (si, sv) in sessions.iter().enumerate() {
        for c in &sv.cands {
            if c.room.is_none() {
                continue;
            }
            for block in &sv.group.blocks {
                daily_physical
                    .entry((sv.plan_index, *block, c.day))
                    .or_default()
                    .push((si, c.var));
            }
        }
    }
    push_capacity_rows(
        &mut constraints,
        daily_physical.into_values(),
        config.max_physical_sessions_per_day as usize,
    );

    // Group structure: distinct days, GEC pairing, practicum chains, and
    // room consistency.
    let mut group_members: BTreeMap<(usize, usize), Vec<usize>> = BTreeMap::new();
    for (si, sv) in sessions.iter().enumerate() {
        group_members
            .entry((sv.plan_index, sv.group_index))
            .or_default()
            .push(si);
    }

    let day_usage = |si: usize, day: u32| -> Expression {
        let mut sum = Expression::from(0.0);
        for c in &sessions[si].cands {
            if c.day == day {
                sum += c.var;
            }
        }
        sum
    };
    let offset_usage = |si: usize, offset: u32| -> Expression {
        let mut sum = Expression::from(0.0);
        for c in &sessions[si].cands {
            if c.offset == offset {
                sum += c.var;
            }
        }
        sum
    };
    let room_usage_of = |si: usize, room: usize| -> Expression {
        let mut sum = Expression::from(0.0);
        for c in &sessions[si].cands {
            if c.room == Some(room) {
                sum += c.var;
            }
        }
        sum
    };

    for members in group_members.values() {
        let first = &sessions[members[0]];
        let group = first.group;

        if group.consecutive_days {
            // Session i sits on the day after session i-1. Summed over all
            // days with the pick-one rows, this also forbids the earlier
            // session from taking the last day.
            for pair in members.windows(2) {
                for day in 0..grid.num_days() {
                    let current = day_usage(pair[1], day);
                    let previous = if day == 0 {
                        Expression::from(0.0)
                    } else {
                        day_usage(pair[0], day - 1)
                    };
                    constraints.push((current - previous).eq(0.0));
                }
            }
        } else if members.len() >= 2 {
            // Distinct days within the group.
            for day in 0..grid.num_days() {
                let mut sum = Expression::from(0.0);
                let mut hits = 0usize;
                for &si in members {
                    for c in &sessions[si].cands {
                        if c.day == day {
                            sum += c.var;
                            hits += 1;
                        }
                    }
                }
                if hits > 1 {
                    constraints.push(sum.leq(1.0));
                }
            }
        }

        if group.gec_paired && members.len() == 2 {
            // Both meetings in the same half of Mon-Thu: either the Mon/Tue
            // pair or the Wed/Thu pair, order-free given distinct days.
            let early_a = day_usage(members[0], 0) + day_usage(members[0], 1);
            let early_b = day_usage(members[1], 0) + day_usage(members[1], 1);
            constraints.push((early_a - early_b).eq(0.0));

            // Same in-day start offset on both days.
            let offsets: BTreeSet<u32> = members
                .iter()
                .flat_map(|&si| sessions[si].cands.iter().map(|c| c.offset))
                .collect();
            for offset in offsets {
                let a = offset_usage(members[0], offset);
                let b = offset_usage(members[1], offset);
                constraints.push((a - b).eq(0.0));
            }
        }

        // All physical sessions of the group share one room.
        let physical: Vec<usize> = members
            .iter()
            .copied()
            .filter(|&si| sessions[si].cands.iter().any(|c| c.room.is_some()))
            .collect();
        if physical.len() >= 2 {
            let room_count = group.kind.room_kind().map(|k| rooms.count(k)).unwrap_or(0);
            for &si in &physical[1..] {
                for room in 0..room_count {
                    let lead = room_usage_of(physical[0], room);
                    let follow = room_usage_of(si, room);
                    constraints.push((lead - follow).eq(0.0));
                }
            }
        }
    }

    // Prefer lunch-free placements; relaxed candidates only enter when
    // nothing else satisfies the model.
    let mut objective = Expression::from(0.0);
    let mut variable_count = 0usize;
    for sv in &sessions {
        variable_count += sv.cands.len();
        for c in &sv.cands {
            if c.relaxed {
                objective += c.var;
            }
        }
    }

    info!(
        phase = phase.name(),
        sessions = sessions.len(),
        variables = variable_count,
        constraints = constraints.len(),
        timeout_secs,
        "solving phase model"
    );

    let mut model = vars
        .minimise(objective)
        .using(highs)
        .set_verbose(false)
        .set_time_limit(timeout_secs as f64)
        .set_threads(SOLVER_THREADS)
        .set_parallel(HighsParallelType::On);
    for constraint in constraints {
        model = model.with(constraint);
    }

    let solution = match model.solve() {
        Ok(solution) => solution,
        Err(ResolutionError::Infeasible) => {
            return Err(SchedulerError::PhaseInfeasible(phase));
        }
        Err(e) => {
            return Err(SchedulerError::Solver {
                phase,
                message: e.to_string(),
            });
        }
    };

    let mut placed = Vec::with_capacity(sessions.len());
    for sv in &sessions {
        let chosen = sv
            .cands
            .iter()
            .find(|c| solution.value(c.var) > 0.5)
            .ok_or_else(|| SchedulerError::Solver {
                phase,
                message: format!("session {} has no selected placement", sv.session.sid),
            })?;
        debug!(
            sid = sv.session.sid,
            day = chosen.day,
            offset = chosen.offset,
            room = ?chosen.room,
            "placed session"
        );
        placed.push(PlacedSession {
            plan_index: sv.plan_index,
            group_index: sv.group_index,
            sid: sv.session.sid,
            start: chosen.start,
            day: chosen.day,
            duration: sv.session.duration,
            room: chosen.room,
        });
    }
    Ok(placed)
}

/// Add a `sum <= capacity` row for every usage list that could exceed the
/// capacity. Lists where fewer distinct sessions contribute than the
/// capacity allows are vacuous because each session picks one placement.
fn push_capacity_rows(
    constraints: &mut Vec<Constraint>,
    usage: impl Iterator<Item = Vec<(usize, Variable)>>,
    capacity: usize,
) {
    for vars_at in usage {
        let mut distinct = 0usize;
        let mut last: Option<usize> = None;
        for (si, _) in &vars_at {
            if last != Some(*si) {
                distinct += 1;
                last = Some(*si);
            }
        }
        if distinct <= capacity {
            continue;
        }
        let mut sum = Expression::from(0.0);
        for (_, var) in vars_at {
            sum += var;
        }
        constraints.push(sum.leq(capacity as f64));
    }
}

/// True when `[start, end)` intersects any run in a sorted, disjoint run
/// list.
fn overlaps_run(runs: &[(u32, u32)], start: u32, end: u32) -> bool {
    runs.binary_search_by(|&(run_start, len)| {
        if run_start + len <= start {
            std::cmp::Ordering::Less
        } else if run_start >= end {
            std::cmp::Ordering::Greater
        } else {
            std::cmp::Ordering::Equal
        }
    })
    .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlaps_run() {
        let runs = vec![(3, 5), (12, 1)];
        assert!(overlaps_run(&runs, 0, 4));
        assert!(overlaps_run(&runs, 7, 9));
        assert!(!overlaps_run(&runs, 8, 12));
        assert!(overlaps_run(&runs, 12, 13));
        assert!(!overlaps_run(&runs, 13, 20));
        assert!(!overlaps_run(&runs, 0, 3));
    }
}
