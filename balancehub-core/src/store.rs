//! TaskStore: owner-scoped task repository that sequences the priority
//! engine around every mutation.
//!
//! Design:
//! - Canonical Task copies in a map (id -> Task).
//! - A secondary index by Eisenhower quadrant, kept in step on every upsert
//!   and remove, so quadrant listings don't scan the whole map.
//! - Every operation takes the acting owner and an explicit `now`. Tasks of
//!   other owners and soft-deleted tasks are reported as not found.
//!
//! Recalculation order is always time pressure, then priority, at the same
//! `now` (see [`priority::refresh`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analytics::TaskAnalytics;
use crate::error::{Result, StoreError};
use crate::priority;
use crate::query::{TaskPage, TaskQuery};
use crate::task::{MatrixType, Task, TaskStatus};
use crate::view::PriorityOutcome;

const MAX_TITLE_LEN: usize = 500;
const MAX_DESCRIPTION_LEN: usize = 2000;
const MAX_CATEGORY_LEN: usize = 100;

/// Input for [`TaskStore::create`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub urgency: i32,
    pub importance: i32,
    pub estimated_hours: f64,
    pub deadline: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub tags: Vec<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            urgency: 5,
            importance: 5,
            estimated_hours: 1.0,
            deadline: None,
            category: None,
            tags: Vec::new(),
        }
    }
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdate {
    /// Blank titles are ignored.
    pub title: Option<String>,
    pub description: Option<String>,
    pub urgency: Option<i32>,
    pub importance: Option<i32>,
    pub estimated_hours: Option<f64>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: Option<TaskStatus>,
    pub category: Option<String>,
}

/// Manual re-prioritization. Counts as a reschedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityOverride {
    pub urgency: i32,
    pub importance: i32,
    /// `None` keeps the current deadline.
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Clone)]
pub struct TaskStore {
    tasks: HashMap<String, Task>,

    // idx[matrix_type] = set(task_id)
    idx: HashMap<MatrixType, HashSet<String>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from persisted records, stored fields taken as-is.
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut store = Self::new();
        for t in tasks {
            store.upsert(t);
        }
        store
    }

    /// Every record, deleted and foreign-owned included, oldest first.
    pub fn to_records(&self) -> Vec<Task> {
        let mut out: Vec<Task> = self.tasks.values().cloned().collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        out
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, owner: &str, id: &str) -> Result<&Task> {
        self.tasks
            .get(id)
            .filter(|t| t.owner == owner && !t.is_deleted)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    /// Resolve a full id or a unique id prefix to the owner's live task.
    pub fn find_by_prefix<'a>(&'a self, owner: &'a str, prefix: &str) -> Result<&'a Task> {
        if let Ok(t) = self.get(owner, prefix) {
            return Ok(t);
        }
        let mut hits = self.live(owner).filter(|t| t.id.starts_with(prefix));
        match (hits.next(), hits.next()) {
            (Some(t), None) if !prefix.is_empty() => Ok(t),
            (Some(_), Some(_)) => Err(StoreError::validation(
                "id",
                format!("prefix '{prefix}' matches more than one task"),
            )),
            _ => Err(StoreError::NotFound {
                id: prefix.to_string(),
            }),
        }
    }

    pub fn create(&mut self, owner: &str, input: NewTask, now: DateTime<Utc>) -> Result<Task> {
        validate_title(&input.title)?;
        validate_description(input.description.as_deref())?;
        validate_category(input.category.as_deref())?;
        validate_scale("urgency", input.urgency)?;
        validate_scale("importance", input.importance)?;
        validate_estimate(input.estimated_hours)?;

        let mut task = Task::new(Uuid::new_v4().to_string(), owner, input.title.trim(), now);
        task.description = input.description;
        task.urgency = input.urgency;
        task.importance = input.importance;
        task.estimated_hours = input.estimated_hours;
        task.deadline = input.deadline;
        task.category = input.category;
        task.tags = input.tags;

        priority::refresh(&mut task, now);
        task.effort_level = priority::effort_level_for(task.estimated_hours);

        info!(task_id = %task.id, owner, matrix = %task.matrix_type, priority = task.calculated_priority, "created task");
        self.upsert(task.clone());
        Ok(task)
    }

    pub fn update(&mut self, owner: &str, id: &str, patch: TaskUpdate, now: DateTime<Utc>) -> Result<Task> {
        validate_description(patch.description.as_deref())?;
        validate_category(patch.category.as_deref())?;
        if let Some(title) = patch.title.as_deref().filter(|t| !t.trim().is_empty()) {
            validate_title(title)?;
        }
        if let Some(u) = patch.urgency {
            validate_scale("urgency", u)?;
        }
        if let Some(i) = patch.importance {
            validate_scale("importance", i)?;
        }
        if let Some(h) = patch.estimated_hours {
            validate_estimate(h)?;
        }

        let mut task = self.get(owner, id)?.clone();

        if let Some(title) = patch.title.filter(|t| !t.trim().is_empty()) {
            task.title = title.trim().to_string();
        }
        if let Some(description) = patch.description {
            task.description = Some(description);
        }
        if let Some(u) = patch.urgency {
            task.urgency = u;
        }
        if let Some(i) = patch.importance {
            task.importance = i;
        }
        if let Some(h) = patch.estimated_hours {
            task.estimated_hours = h;
            task.effort_level = priority::effort_level_for(h);
        }
        if let Some(deadline) = patch.deadline {
            task.deadline = Some(deadline);
        }
        if let Some(status) = patch.status {
            if status == TaskStatus::InProgress && task.status != TaskStatus::InProgress {
                task.start(now);
            } else if status == TaskStatus::Todo && task.status == TaskStatus::InProgress {
                task.pause(now);
            }
            task.status = status;
        }
        if let Some(category) = patch.category {
            task.category = Some(category);
        }

        if task.status.is_terminal() {
            warn!(task_id = %task.id, status = %task.status, "re-scoring task in terminal status");
        }
        priority::refresh(&mut task, now);
        task.updated_at = now;

        info!(task_id = %task.id, owner, "updated task");
        self.upsert(task.clone());
        Ok(task)
    }

    pub fn override_priority(
        &mut self,
        owner: &str,
        id: &str,
        input: PriorityOverride,
        now: DateTime<Utc>,
    ) -> Result<PriorityOutcome> {
        validate_scale("urgency", input.urgency)?;
        validate_scale("importance", input.importance)?;

        let mut task = self.get(owner, id)?.clone();
        task.urgency = input.urgency;
        task.importance = input.importance;
        task.deadline = input.deadline.or(task.deadline);

        priority::refresh(&mut task, now);
        task.updated_at = now;
        task.reschedule_count += 1;

        info!(
            task_id = %task.id,
            urgency = task.urgency,
            importance = task.importance,
            reschedules = task.reschedule_count,
            "overrode task priority"
        );
        let outcome = PriorityOutcome::from(&task);
        self.upsert(task);
        Ok(outcome)
    }

    /// `actual_hours` of `None` keeps the hours already recorded.
    pub fn complete(&mut self, owner: &str, id: &str, actual_hours: Option<f64>, now: DateTime<Utc>) -> Result<Task> {
        if let Some(h) = actual_hours {
            validate_actual(h)?;
        }
        let mut task = self.get(owner, id)?.clone();
        let hours = actual_hours.unwrap_or(task.actual_hours);
        task.mark_completed(hours, now);

        info!(task_id = %task.id, owner, actual_hours = hours, "completed task");
        self.upsert(task.clone());
        Ok(task)
    }

    pub fn start(&mut self, owner: &str, id: &str, now: DateTime<Utc>) -> Result<Task> {
        self.transition(owner, id, "start", now, Task::start)
    }

    pub fn pause(&mut self, owner: &str, id: &str, now: DateTime<Utc>) -> Result<Task> {
        self.transition(owner, id, "pause", now, Task::pause)
    }

    pub fn cancel(&mut self, owner: &str, id: &str, now: DateTime<Utc>) -> Result<Task> {
        self.transition(owner, id, "cancel", now, Task::cancel)
    }

    fn transition(
        &mut self,
        owner: &str,
        id: &str,
        action: &'static str,
        now: DateTime<Utc>,
        apply: fn(&mut Task, DateTime<Utc>),
    ) -> Result<Task> {
        let mut task = self.get(owner, id)?.clone();
        if task.status.is_terminal() {
            return Err(StoreError::Terminal {
                id: task.id,
                status: task.status.to_string(),
                action,
            });
        }
        apply(&mut task, now);
        info!(task_id = %task.id, status = %task.status, "{action} task");
        self.upsert(task.clone());
        Ok(task)
    }

    /// Soft delete keeps the record flagged; hard delete drops it.
    pub fn delete(&mut self, owner: &str, id: &str, hard: bool, now: DateTime<Utc>) -> Result<()> {
        let mut task = self.get(owner, id)?.clone();
        if hard {
            self.remove(id);
            info!(task_id = %id, owner, "hard deleted task");
        } else {
            task.is_deleted = true;
            task.deleted_at = Some(now);
            task.updated_at = now;
            self.upsert(task);
            info!(task_id = %id, owner, "soft deleted task");
        }
        Ok(())
    }

    /// Explicit recompute trigger. Leaves `reschedule_count` alone.
    pub fn recompute(&mut self, owner: &str, id: &str, now: DateTime<Utc>) -> Result<Task> {
        let mut task = self.get(owner, id)?.clone();
        priority::refresh(&mut task, now);
        self.upsert(task.clone());
        Ok(task)
    }

    /// Recompute every live task of `owner`; returns how many were touched.
    pub fn recompute_all(&mut self, owner: &str, now: DateTime<Utc>) -> usize {
        let ids: Vec<String> = self.live(owner).map(|t| t.id.clone()).collect();
        for id in &ids {
            if let Some(mut task) = self.tasks.get(id).cloned() {
                priority::refresh(&mut task, now);
                self.upsert(task);
            }
        }
        debug!(owner, count = ids.len(), "recomputed tasks");
        ids.len()
    }

    pub fn list(&self, owner: &str, query: &TaskQuery, now: DateTime<Utc>) -> Result<TaskPage> {
        match query.matrix_type {
            Some(matrix) => query.apply(self.in_quadrant(owner, matrix), now),
            None => query.apply(self.live(owner), now),
        }
    }

    pub fn analytics(&self, owner: &str, now: DateTime<Utc>) -> TaskAnalytics {
        TaskAnalytics::collect(self.live(owner), now)
    }

    fn live<'a>(&'a self, owner: &'a str) -> impl Iterator<Item = &'a Task> + 'a {
        self.tasks
            .values()
            .filter(move |t| t.owner == owner && !t.is_deleted)
    }

    fn in_quadrant<'a>(&'a self, owner: &'a str, matrix: MatrixType) -> impl Iterator<Item = &'a Task> + 'a {
        self.idx
            .get(&matrix)
            .into_iter()
            .flatten()
            .filter_map(|id| self.tasks.get(id))
            .filter(move |t| t.owner == owner && !t.is_deleted)
    }

    fn upsert(&mut self, task: Task) {
        if let Some(old) = self.tasks.get(&task.id).cloned() {
            self.deindex(&old);
        }
        self.index(&task);
        self.tasks.insert(task.id.clone(), task);
    }

    fn remove(&mut self, id: &str) -> Option<Task> {
        let t = self.tasks.remove(id);
        if let Some(ref task) = t {
            self.deindex(task);
        }
        t
    }

    fn index(&mut self, task: &Task) {
        self.idx
            .entry(task.matrix_type)
            .or_default()
            .insert(task.id.clone());
    }

    fn deindex(&mut self, task: &Task) {
        if let Some(set) = self.idx.get_mut(&task.matrix_type) {
            set.remove(&task.id);
            if set.is_empty() {
                self.idx.remove(&task.matrix_type);
            }
        }
    }
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(StoreError::validation("title", "must not be blank"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(StoreError::validation("title", format!("at most {MAX_TITLE_LEN} characters")));
    }
    Ok(())
}

fn validate_description(description: Option<&str>) -> Result<()> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LEN => Err(StoreError::validation(
            "description",
            format!("at most {MAX_DESCRIPTION_LEN} characters"),
        )),
        _ => Ok(()),
    }
}

fn validate_category(category: Option<&str>) -> Result<()> {
    match category {
        Some(c) if c.chars().count() > MAX_CATEGORY_LEN => Err(StoreError::validation(
            "category",
            format!("at most {MAX_CATEGORY_LEN} characters"),
        )),
        _ => Ok(()),
    }
}

fn validate_scale(field: &'static str, value: i32) -> Result<()> {
    if !(1..=10).contains(&value) {
        return Err(StoreError::validation(field, format!("must be 1..=10, got {value}")));
    }
    Ok(())
}

fn validate_estimate(hours: f64) -> Result<()> {
    if !(0.1..=100.0).contains(&hours) {
        return Err(StoreError::validation(
            "estimated_hours",
            format!("must be 0.1..=100, got {hours}"),
        ));
    }
    Ok(())
}

fn validate_actual(hours: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&hours) {
        return Err(StoreError::validation(
            "actual_hours",
            format!("must be 0..=100, got {hours}"),
        ));
    }
    Ok(())
}
