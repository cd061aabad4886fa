//! Read-time projections of tasks.
//!
//! Stored priority is a write-time snapshot; the indicators here are evaluated
//! at the `now` of the read, so the two can disagree (e.g. a task that became
//! overdue since its last recalculation).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{EffortLevel, MatrixType, Task, TaskStatus};

/// A task with its derived indicators, as handed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub urgency: i32,
    pub importance: i32,
    pub matrix_type: MatrixType,
    pub calculated_priority: i32,
    pub estimated_hours: f64,
    pub actual_hours: f64,
    pub effort_level: EffortLevel,
    pub deadline: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub time_pressure: f64,
    pub reschedule_count: u32,

    pub is_overdue: bool,
    pub is_due_soon: bool,
    pub completion_percentage: f64,
    pub time_remaining_hours: f64,
}

impl TaskView {
    pub fn at(task: &Task, now: DateTime<Utc>) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            urgency: task.urgency,
            importance: task.importance,
            matrix_type: task.matrix_type,
            calculated_priority: task.calculated_priority,
            estimated_hours: task.estimated_hours,
            actual_hours: task.actual_hours,
            effort_level: task.effort_level,
            deadline: task.deadline,
            start_date: task.start_date,
            completed_at: task.completed_at,
            status: task.status,
            category: task.category.clone(),
            tags: task.tags.clone(),
            created_at: task.created_at,
            updated_at: task.updated_at,
            time_pressure: task.time_pressure,
            reschedule_count: task.reschedule_count,
            is_overdue: task.is_overdue(now),
            is_due_soon: task.is_due_soon(now),
            completion_percentage: task.completion_percentage(),
            time_remaining_hours: task.time_remaining_hours(now),
        }
    }
}

/// Result of a manual priority override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityOutcome {
    pub task_id: String,
    pub matrix_type: MatrixType,
    pub calculated_priority: i32,
    pub time_pressure: f64,
}

impl From<&Task> for PriorityOutcome {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.id.clone(),
            matrix_type: task.matrix_type,
            calculated_priority: task.calculated_priority,
            time_pressure: task.time_pressure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::priority;
    use chrono::{Duration, TimeZone};

    #[test]
    fn view_can_diverge_from_stored_snapshot() {
        let written = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let mut t = Task::new("t1", "ana", "file taxes", written)
            .with_urgency(5)
            .with_importance(8)
            .with_deadline(written + Duration::hours(30));
        priority::refresh(&mut t, written);
        assert_eq!(t.calculated_priority, 6);

        // Two days later the task is overdue at read time, but the stored
        // priority still reflects the write.
        let read = written + Duration::hours(48);
        let v = TaskView::at(&t, read);
        assert!(v.is_overdue);
        assert!(!v.is_due_soon);
        assert_eq!(v.calculated_priority, 6);
        assert_eq!(v.time_remaining_hours, -18.0);
    }

    #[test]
    fn view_serializes_camel_case() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let t = Task::new("t1", "ana", "x", now);
        let json = serde_json::to_value(TaskView::at(&t, now)).unwrap();
        assert_eq!(json["matrixType"], "do");
        assert_eq!(json["status"], "todo");
        assert_eq!(json["timeRemainingHours"], 0.0);
        assert_eq!(json["isOverdue"], false);
    }
}
