//! Eisenhower Matrix priority engine.
//!
//! Pure functions over one task and an explicit `now`:
//! - [`update_time_pressure`]: deadline proximity scaled by estimated effort
//! - [`recalculate_priority`]: quadrant classification plus deadline boosts
//! - [`effort_level_for`]: coarse effort bucket from estimated hours
//!
//! Callers run time pressure before priority, with the same `now`; [`refresh`]
//! does both. Nothing here performs I/O or fails.

use chrono::{DateTime, Duration, Utc};

use crate::task::{duration_hours, EffortLevel, MatrixType, Task, TaskStatus};

/// Urgency/importance at or above this are "high".
pub const HIGH_THRESHOLD: i32 = 7;

pub const MIN_PRIORITY: i32 = 1;
pub const MAX_PRIORITY: i32 = 10;

const DUE_SOON_WINDOW_HOURS: i64 = 24;
const DUE_SOON_BOOST: i64 = 2;
const OVERDUE_BOOST: i64 = 3;

/// Base pressure by hours to deadline. First match wins.
const PRESSURE_STEPS: [(f64, f64); 7] = [
    (0.0, 5.0),
    (2.0, 4.5),
    (6.0, 4.0),
    (12.0, 3.5),
    (24.0, 3.0),
    (72.0, 2.0),
    (168.0, 1.0),
];
const FAR_PRESSURE: f64 = 0.5;

/// Step function over (possibly negative) hours to deadline.
pub fn base_pressure(hours_to_deadline: f64) -> f64 {
    PRESSURE_STEPS
        .iter()
        .find(|(limit, _)| hours_to_deadline <= *limit)
        .map(|(_, pressure)| *pressure)
        .unwrap_or(FAR_PRESSURE)
}

/// Time pressure for a deadline and effort, unclamped above.
pub fn time_pressure_at(deadline: Option<DateTime<Utc>>, estimated_hours: f64, now: DateTime<Utc>) -> f64 {
    let Some(deadline) = deadline else {
        return 0.0;
    };
    debug_assert!(
        estimated_hours >= 0.0,
        "estimated_hours must be non-negative, got {estimated_hours}"
    );

    let hours_to_deadline = duration_hours(deadline - now);
    base_pressure(hours_to_deadline) * estimated_hours.sqrt() / 2.0
}

pub fn update_time_pressure(task: &mut Task, now: DateTime<Utc>) {
    task.time_pressure = time_pressure_at(task.deadline, task.estimated_hours, now);
}

/// Deadline set, already passed, and the task not completed.
pub fn is_overdue_at(deadline: Option<DateTime<Utc>>, status: TaskStatus, now: DateTime<Utc>) -> bool {
    status != TaskStatus::Completed && deadline.is_some_and(|d| d < now)
}

/// Deadline set, still ahead but less than 24h away, and the task not completed.
pub fn is_due_soon_at(deadline: Option<DateTime<Utc>>, status: TaskStatus, now: DateTime<Utc>) -> bool {
    status != TaskStatus::Completed
        && deadline.is_some_and(|d| d > now && d - now < Duration::hours(DUE_SOON_WINDOW_HOURS))
}

pub fn classify(urgency: i32, importance: i32) -> MatrixType {
    match (urgency >= HIGH_THRESHOLD, importance >= HIGH_THRESHOLD) {
        (true, true) => MatrixType::Do,
        (false, true) => MatrixType::Schedule,
        (true, false) => MatrixType::Delegate,
        (false, false) => MatrixType::Delete,
    }
}

/// Quadrant score before deadline adjustment. Not yet clamped to [1,10].
///
/// Widened to `i64` so out-of-range scales cannot overflow before the clamp.
pub fn quadrant_score(matrix: MatrixType, urgency: i32, importance: i32, time_pressure: f64) -> i64 {
    // Both operands are positive in the valid domain, so `/` is floor.
    let mean = (i64::from(urgency) + i64::from(importance)) / 2;
    match matrix {
        MatrixType::Do => (mean + (time_pressure * 2.0) as i64).min(MAX_PRIORITY.into()),
        MatrixType::Schedule => mean.max(3),
        MatrixType::Delegate => mean.min(7),
        MatrixType::Delete => (mean - 2).max(MIN_PRIORITY.into()),
    }
}

/// Requires `task.time_pressure` to be current for `now`.
pub fn recalculate_priority(task: &mut Task, now: DateTime<Utc>) {
    let matrix = classify(task.urgency, task.importance);
    let mut score = quadrant_score(matrix, task.urgency, task.importance, task.time_pressure);

    if is_due_soon_at(task.deadline, task.status, now) {
        score += DUE_SOON_BOOST;
    }
    if is_overdue_at(task.deadline, task.status, now) {
        score += OVERDUE_BOOST;
    }

    task.matrix_type = matrix;
    // Clamped into [1,10], so the narrowing cast is lossless.
    task.calculated_priority = score.clamp(MIN_PRIORITY.into(), MAX_PRIORITY.into()) as i32;
}

/// Time pressure, then priority, at one instant.
pub fn refresh(task: &mut Task, now: DateTime<Utc>) {
    update_time_pressure(task, now);
    recalculate_priority(task, now);
    tracing::debug!(
        task_id = %task.id,
        matrix = %task.matrix_type,
        priority = task.calculated_priority,
        time_pressure = task.time_pressure,
        "recalculated priority"
    );
}

pub fn effort_level_for(estimated_hours: f64) -> EffortLevel {
    if estimated_hours <= 1.0 {
        EffortLevel::Low
    } else if estimated_hours <= 4.0 {
        EffortLevel::Medium
    } else {
        EffortLevel::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    fn task(urgency: i32, importance: i32) -> Task {
        Task::new("t", "ana", "task", now())
            .with_urgency(urgency)
            .with_importance(importance)
    }

    #[test]
    fn no_deadline_means_zero_pressure() {
        let mut t = task(10, 10).with_hours(100.0);
        t.time_pressure = 3.0;
        update_time_pressure(&mut t, now());
        assert_eq!(t.time_pressure, 0.0);
    }

    #[test]
    fn deadline_exactly_now_is_max_pressure() {
        assert_eq!(base_pressure(0.0), 5.0);
        let mut t = task(5, 5).with_hours(4.0).with_deadline(now());
        update_time_pressure(&mut t, now());
        assert_eq!(t.time_pressure, 5.0);
    }

    #[test]
    fn pressure_steps_are_inclusive_upper_bounds() {
        assert_eq!(base_pressure(-30.0), 5.0);
        assert_eq!(base_pressure(0.5), 4.5);
        assert_eq!(base_pressure(2.0), 4.5);
        assert_eq!(base_pressure(2.01), 4.0);
        assert_eq!(base_pressure(6.0), 4.0);
        assert_eq!(base_pressure(12.0), 3.5);
        assert_eq!(base_pressure(24.0), 3.0);
        assert_eq!(base_pressure(72.0), 2.0);
        assert_eq!(base_pressure(168.0), 1.0);
        assert_eq!(base_pressure(168.5), 0.5);
    }

    #[test]
    fn pressure_scales_with_sqrt_of_effort() {
        let deadline = Some(now() + Duration::days(30));
        assert_eq!(time_pressure_at(deadline, 1.0, now()), 0.25);
        assert_eq!(time_pressure_at(deadline, 16.0, now()), 1.0);
        // unbounded above
        let overdue = Some(now() - Duration::hours(1));
        assert_eq!(time_pressure_at(overdue, 100.0, now()), 25.0);
    }

    #[test]
    fn classification_boundaries() {
        assert_eq!(classify(7, 7), MatrixType::Do);
        assert_eq!(classify(6, 10), MatrixType::Schedule);
        assert_eq!(classify(10, 6), MatrixType::Delegate);
        assert_eq!(classify(6, 6), MatrixType::Delete);
    }

    #[test]
    fn quadrant_floors_and_caps() {
        // schedule floor of 3
        assert_eq!(quadrant_score(MatrixType::Schedule, 1, 7, 0.0), 4);
        assert_eq!(quadrant_score(MatrixType::Schedule, -5, 7, 0.0), 3);
        // delegate cap of 7
        assert_eq!(quadrant_score(MatrixType::Delegate, 10, 6, 0.0), 7);
        // delete: mean - 2, floor of 1
        assert_eq!(quadrant_score(MatrixType::Delete, 6, 6, 0.0), 4);
        assert_eq!(quadrant_score(MatrixType::Delete, 1, 1, 0.0), 1);
        // do: mean + floor(pressure*2), capped at 10
        assert_eq!(quadrant_score(MatrixType::Do, 7, 7, 0.74), 8);
        assert_eq!(quadrant_score(MatrixType::Do, 7, 8, 9.0), 10);
    }

    #[test]
    fn urgent_important_task_due_in_an_hour() {
        let mut t = task(8, 9).with_hours(4.0).with_deadline(now() + Duration::hours(1));
        refresh(&mut t, now());

        assert_eq!(t.time_pressure, 4.5);
        assert_eq!(t.matrix_type, MatrixType::Do);
        assert!(t.is_due_soon(now()));
        assert!(!t.is_overdue(now()));
        assert_eq!(t.calculated_priority, 10);
    }

    #[test]
    fn overdue_boost_applies_to_low_quadrant() {
        // delete quadrant: (4+4)/2 - 2 = 2, +3 overdue = 5
        let mut t = task(4, 4).with_deadline(now() - Duration::hours(3));
        refresh(&mut t, now());
        assert_eq!(t.matrix_type, MatrixType::Delete);
        assert_eq!(t.calculated_priority, 5);
    }

    #[test]
    fn due_soon_boost_applies_to_schedule_quadrant() {
        // schedule: (5+8)/2 = 6, +2 due soon = 8
        let mut t = task(5, 8).with_deadline(now() + Duration::hours(10));
        refresh(&mut t, now());
        assert_eq!(t.matrix_type, MatrixType::Schedule);
        assert_eq!(t.calculated_priority, 8);
    }

    #[test]
    fn completed_tasks_get_no_deadline_boost_but_are_still_rescored() {
        let mut t = task(4, 4)
            .with_deadline(now() - Duration::hours(3))
            .with_status(TaskStatus::Completed);
        t.matrix_type = MatrixType::Do;
        refresh(&mut t, now());
        assert_eq!(t.matrix_type, MatrixType::Delete);
        assert_eq!(t.calculated_priority, 2);
    }

    #[test]
    fn priority_always_within_bounds() {
        let deadlines = [
            None,
            Some(now() - Duration::hours(5)),
            Some(now() + Duration::minutes(30)),
            Some(now() + Duration::days(10)),
        ];
        for u in 1..=10 {
            for i in 1..=10 {
                for d in deadlines {
                    for hours in [0.1, 1.0, 100.0] {
                        let mut t = task(u, i).with_hours(hours);
                        t.deadline = d;
                        refresh(&mut t, now());
                        assert!(
                            (MIN_PRIORITY..=MAX_PRIORITY).contains(&t.calculated_priority),
                            "u={u} i={i} d={d:?} h={hours} -> {}",
                            t.calculated_priority
                        );
                        assert!(t.time_pressure >= 0.0);
                    }
                }
            }
        }
    }

    #[test]
    fn out_of_range_inputs_are_still_clamped() {
        let mut t = task(40, 40).with_deadline(now() - Duration::hours(1));
        refresh(&mut t, now());
        assert_eq!(t.calculated_priority, MAX_PRIORITY);

        let mut t = task(-10, -10);
        refresh(&mut t, now());
        assert_eq!(t.calculated_priority, MIN_PRIORITY);
    }

    #[test]
    fn extreme_scales_do_not_overflow() {
        let mut t = task(i32::MAX, i32::MAX).with_deadline(now() - Duration::hours(1));
        refresh(&mut t, now());
        assert_eq!(t.matrix_type, MatrixType::Do);
        assert_eq!(t.calculated_priority, MAX_PRIORITY);

        // schedule is uncapped before the boost
        let mut t = task(6, i32::MAX).with_deadline(now() + Duration::hours(3));
        refresh(&mut t, now());
        assert_eq!(t.matrix_type, MatrixType::Schedule);
        assert_eq!(t.calculated_priority, MAX_PRIORITY);

        let mut t = task(i32::MIN, i32::MIN);
        refresh(&mut t, now());
        assert_eq!(t.matrix_type, MatrixType::Delete);
        assert_eq!(t.calculated_priority, MIN_PRIORITY);
    }

    #[test]
    fn sub_millisecond_offsets_respect_step_boundaries() {
        let just_ahead = now() + Duration::microseconds(500);
        let mut t = task(5, 5).with_hours(4.0).with_deadline(just_ahead);
        update_time_pressure(&mut t, now());
        assert_eq!(t.time_pressure, 4.5);
        assert!(t.is_due_soon(now()));
        assert!(!t.is_overdue(now()));

        let past_two_hours = now() + Duration::hours(2) + Duration::microseconds(500);
        let mut t = task(5, 5).with_hours(4.0).with_deadline(past_two_hours);
        update_time_pressure(&mut t, now());
        assert_eq!(t.time_pressure, 4.0);

        let just_behind = now() - Duration::nanoseconds(1);
        assert_eq!(time_pressure_at(Some(just_behind), 4.0, now()), 5.0);
    }

    #[test]
    fn recalculation_is_idempotent() {
        let mut t = task(8, 3).with_hours(2.0).with_deadline(now() + Duration::hours(30));
        refresh(&mut t, now());
        let first = t.clone();

        refresh(&mut t, now() + Duration::milliseconds(5));
        assert_eq!(t.matrix_type, first.matrix_type);
        assert_eq!(t.calculated_priority, first.calculated_priority);
        assert_eq!(t.reschedule_count, 0);
    }

    #[test]
    fn effort_buckets() {
        assert_eq!(effort_level_for(0.1), EffortLevel::Low);
        assert_eq!(effort_level_for(1.0), EffortLevel::Low);
        assert_eq!(effort_level_for(1.5), EffortLevel::Medium);
        assert_eq!(effort_level_for(4.0), EffortLevel::Medium);
        assert_eq!(effort_level_for(4.01), EffortLevel::High);
    }
}
