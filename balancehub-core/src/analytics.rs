//! Productivity summary over one owner's tasks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::task::{duration_hours, Task, TaskStatus};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAnalytics {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    /// Everything not completed, cancelled included.
    pub pending_tasks: usize,
    pub overdue_tasks: usize,
    /// Mean start-to-completion hours; 0 when no task has both stamps.
    pub average_completion_hours: f64,
    pub tasks_by_matrix: BTreeMap<String, usize>,
    pub tasks_by_category: BTreeMap<String, usize>,
    pub tasks_by_status: BTreeMap<String, usize>,
}

impl TaskAnalytics {
    pub fn collect<'a>(tasks: impl IntoIterator<Item = &'a Task>, now: DateTime<Utc>) -> Self {
        let mut out = TaskAnalytics::default();
        let mut completion_hours = Vec::new();

        for t in tasks {
            out.total_tasks += 1;
            if t.status == TaskStatus::Completed {
                out.completed_tasks += 1;
                if let (Some(start), Some(done)) = (t.start_date, t.completed_at) {
                    completion_hours.push(duration_hours(done - start));
                }
            } else {
                out.pending_tasks += 1;
            }
            if t.is_overdue(now) {
                out.overdue_tasks += 1;
            }

            *out.tasks_by_matrix.entry(t.matrix_type.to_string()).or_default() += 1;
            *out.tasks_by_status.entry(t.status.to_string()).or_default() += 1;
            if let Some(category) = &t.category {
                *out.tasks_by_category.entry(category.clone()).or_default() += 1;
            }
        }

        if !completion_hours.is_empty() {
            out.average_completion_hours =
                completion_hours.iter().sum::<f64>() / completion_hours.len() as f64;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::MatrixType;
    use chrono::{Duration, TimeZone};

    #[test]
    fn counts_and_average_completion() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();

        let mut a = Task::new("a", "ana", "a", now);
        a.start(now - Duration::hours(6));
        a.mark_completed(5.0, now - Duration::hours(2));

        let mut b = Task::new("b", "ana", "b", now);
        b.start(now - Duration::hours(10));
        b.mark_completed(1.0, now);

        // completed without ever being started: excluded from the average
        let mut c = Task::new("c", "ana", "c", now);
        c.mark_completed(1.0, now);

        let mut d = Task::new("d", "ana", "d", now).with_deadline(now - Duration::hours(1));
        d.matrix_type = MatrixType::Schedule;
        d.category = Some("work".into());

        let stats = TaskAnalytics::collect(&[a, b, c, d], now);
        assert_eq!(stats.total_tasks, 4);
        assert_eq!(stats.completed_tasks, 3);
        assert_eq!(stats.pending_tasks, 1);
        assert_eq!(stats.overdue_tasks, 1);
        assert_eq!(stats.average_completion_hours, 7.0);
        assert_eq!(stats.tasks_by_matrix.get("do"), Some(&3));
        assert_eq!(stats.tasks_by_matrix.get("schedule"), Some(&1));
        assert_eq!(stats.tasks_by_status.get("completed"), Some(&3));
        assert_eq!(stats.tasks_by_category.get("work"), Some(&1));
        assert_eq!(stats.tasks_by_category.len(), 1);
    }

    #[test]
    fn empty_input_is_all_zero() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let stats = TaskAnalytics::collect(std::iter::empty::<&Task>(), now);
        assert_eq!(stats, TaskAnalytics::default());
    }
}
