//! Task model: the record the priority engine reads and writes, its status
//! state machine, and the read-time indicators derived from it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;
use crate::priority;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Completed and cancelled tasks take no further lifecycle transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }
}

/// Eisenhower quadrant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatrixType {
    /// Urgent and important.
    Do,
    /// Important, not urgent.
    Schedule,
    /// Urgent, not important.
    Delegate,
    /// Neither.
    Delete,
}

impl MatrixType {
    pub fn as_str(self) -> &'static str {
        match self {
            MatrixType::Do => "do",
            MatrixType::Schedule => "schedule",
            MatrixType::Delegate => "delegate",
            MatrixType::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffortLevel {
    Low,
    Medium,
    High,
}

impl EffortLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            EffortLevel::Low => "low",
            EffortLevel::Medium => "medium",
            EffortLevel::High => "high",
        }
    }
}

macro_rules! wire_enum {
    ($ty:ident, $kind:literal, [$($variant:ident),+]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = StoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $(
                    if s.eq_ignore_ascii_case($ty::$variant.as_str()) {
                        return Ok($ty::$variant);
                    }
                )+
                Err(StoreError::InvalidValue {
                    kind: $kind,
                    value: s.to_string(),
                })
            }
        }
    };
}

wire_enum!(TaskStatus, "status", [Todo, InProgress, Completed, Cancelled]);
wire_enum!(MatrixType, "matrix type", [Do, Schedule, Delegate, Delete]);
wire_enum!(EffortLevel, "effort level", [Low, Medium, High]);

/// A user-owned task.
///
/// `matrix_type`, `calculated_priority` and `time_pressure` are a snapshot
/// written by [`priority::refresh`]; they are not live with respect to the
/// clock and may go stale between recalculations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub owner: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,

    /// 1-10.
    pub urgency: i32,
    /// 1-10.
    pub importance: i32,

    pub matrix_type: MatrixType,
    /// 1-10, always clamped.
    pub calculated_priority: i32,

    pub estimated_hours: f64,
    /// 0 means not started.
    pub actual_hours: f64,
    pub effort_level: EffortLevel,

    pub deadline: Option<DateTime<Utc>>,
    /// First start, not most recent.
    pub start_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,

    pub status: TaskStatus,

    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,

    /// >= 0; zero without a deadline.
    pub time_pressure: f64,
    /// Bumped by explicit priority overrides only.
    pub reschedule_count: u32,
}

impl Task {
    /// A fresh `todo` task with the defaults new records get before scoring.
    pub fn new(id: impl Into<String>, owner: impl Into<String>, title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            owner: owner.into(),
            title: title.into(),
            description: None,
            urgency: 5,
            importance: 5,
            matrix_type: MatrixType::Do,
            calculated_priority: 5,
            estimated_hours: 1.0,
            actual_hours: 0.0,
            effort_level: EffortLevel::Medium,
            deadline: None,
            start_date: None,
            completed_at: None,
            status: TaskStatus::Todo,
            category: None,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
            is_deleted: false,
            deleted_at: None,
            time_pressure: 0.0,
            reschedule_count: 0,
        }
    }

    pub fn with_urgency(mut self, urgency: i32) -> Self {
        self.urgency = urgency;
        self
    }

    pub fn with_importance(mut self, importance: i32) -> Self {
        self.importance = importance;
        self
    }

    pub fn with_hours(mut self, estimated_hours: f64) -> Self {
        self.estimated_hours = estimated_hours;
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// todo -> in-progress. `start_date` keeps the first start across pauses.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.status = TaskStatus::InProgress;
        self.start_date.get_or_insert(now);
        self.updated_at = now;
    }

    /// in-progress -> todo.
    pub fn pause(&mut self, now: DateTime<Utc>) {
        self.status = TaskStatus::Todo;
        self.updated_at = now;
    }

    /// Terminal. `actual_hours` is stored as given, even when it differs from
    /// the estimate.
    pub fn mark_completed(&mut self, actual_hours: f64, now: DateTime<Utc>) {
        self.status = TaskStatus::Completed;
        self.actual_hours = actual_hours;
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) {
        self.status = TaskStatus::Cancelled;
        self.updated_at = now;
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        priority::is_overdue_at(self.deadline, self.status, now)
    }

    pub fn is_due_soon(&self, now: DateTime<Utc>) -> bool {
        priority::is_due_soon_at(self.deadline, self.status, now)
    }

    pub fn completion_percentage(&self) -> f64 {
        if self.estimated_hours > 0.0 {
            (self.actual_hours / self.estimated_hours) * 100.0
        } else {
            0.0
        }
    }

    /// Signed: negative when overdue. Zero without a deadline.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Duration {
        self.deadline.map(|d| d - now).unwrap_or_else(Duration::zero)
    }

    /// Negative values are the overdue magnitude, not floored to zero.
    pub fn time_remaining_hours(&self, now: DateTime<Utc>) -> f64 {
        duration_hours(self.time_remaining(now))
    }
}

/// Full nanosecond precision; spans beyond ~292 years fall back to seconds.
pub(crate) fn duration_hours(delta: Duration) -> f64 {
    let seconds = delta
        .num_nanoseconds()
        .map_or(delta.num_seconds() as f64, |n| n as f64 / 1e9);
    seconds / 3600.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    #[test]
    fn start_keeps_first_start_date_across_pause() {
        let mut t = Task::new("t1", "ana", "write report", t0());
        t.start(t0());
        t.pause(t0() + Duration::hours(1));
        assert_eq!(t.status, TaskStatus::Todo);
        assert_eq!(t.start_date, Some(t0()));

        t.start(t0() + Duration::hours(2));
        assert_eq!(t.status, TaskStatus::InProgress);
        assert_eq!(t.start_date, Some(t0()));
        assert_eq!(t.updated_at, t0() + Duration::hours(2));
    }

    #[test]
    fn mark_completed_stores_hours_verbatim() {
        let mut t = Task::new("t1", "ana", "write report", t0()).with_hours(2.0);
        let done_at = t0() + Duration::hours(5);
        t.mark_completed(3.5, done_at);
        assert_eq!(t.status, TaskStatus::Completed);
        assert_eq!(t.actual_hours, 3.5);
        assert_eq!(t.completed_at, Some(done_at));
        assert_eq!(t.completion_percentage(), 175.0);
    }

    #[test]
    fn time_remaining_is_signed() {
        let t = Task::new("t1", "ana", "x", t0()).with_deadline(t0() - Duration::minutes(90));
        assert_eq!(t.time_remaining(t0()), Duration::minutes(-90));
        assert_eq!(t.time_remaining_hours(t0()), -1.5);

        let none = Task::new("t2", "ana", "y", t0());
        assert_eq!(none.time_remaining(t0()), Duration::zero());
    }

    #[test]
    fn completed_task_is_never_overdue() {
        let t = Task::new("t1", "ana", "x", t0())
            .with_deadline(t0() - Duration::hours(1))
            .with_status(TaskStatus::Completed);
        assert!(!t.is_overdue(t0()));
        assert!(!t.is_due_soon(t0()));
    }

    #[test]
    fn wire_names_round_trip_through_from_str() {
        assert_eq!("in-progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("Schedule".parse::<MatrixType>().unwrap(), MatrixType::Schedule);
        assert_eq!(TaskStatus::InProgress.to_string(), "in-progress");
        assert!("paused".parse::<TaskStatus>().is_err());

        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
    }
}
