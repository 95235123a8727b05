use crate::model::{Phase, StepInterval};

type Point = (i64, i64);

fn start_point(step: &StepInterval) -> Point {
    (step.start_ms, step.start_position)
}

fn end_point(step: &StepInterval) -> Option<Point> {
    Some((step.end_ms?, step.end_position?))
}

/// Whether `child` lies within the window of `seed`. An open seed owns
/// everything that starts after it; an open child only needs to start
/// inside a closed seed.
fn contains(seed: &StepInterval, child: &StepInterval) -> bool {
    if start_point(child) < start_point(seed) {
        return false;
    }
    match end_point(seed) {
        None => true,
        Some(seed_end) => {
            start_point(child) <= seed_end
                && end_point(child).map_or(true, |child_end| child_end <= seed_end)
        }
    }
}

pub fn percent_of(total_ms: u64, total_elapsed_ms: u64) -> f64 {
    if total_elapsed_ms == 0 {
        return 0.0;
    }
    let raw = total_ms as f64 / total_elapsed_ms as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}

/// Seeds one phase per depth-0 step (in the given order) and folds nested
/// steps into the first phase whose window contains them. `steps` must be
/// sorted by start.
pub fn aggregate_phases(steps: &[StepInterval], total_elapsed_ms: u64) -> Vec<Phase> {
    let mut claimed = vec![false; steps.len()];
    let mut phases = Vec::new();

    for (seed_idx, seed) in steps.iter().enumerate() {
        if seed.depth != 0 {
            continue;
        }
        let total_ms = seed.duration_ms.unwrap_or(0);
        let mut phase = Phase {
            name: seed.name.clone(),
            kind: seed.kind.clone(),
            start_ms: seed.start_ms,
            end_ms: seed.end_ms,
            total_ms,
            percent_of_total: percent_of(total_ms, total_elapsed_ms),
            status: seed.status,
            steps: vec![seed_idx],
        };
        for (child_idx, child) in steps.iter().enumerate() {
            if child.depth == 0 || claimed[child_idx] || !contains(seed, child) {
                continue;
            }
            claimed[child_idx] = true;
            phase.status = phase.status.worst(child.status);
            phase.steps.push(child_idx);
        }
        phases.push(phase);
    }
    phases
}
