//! Listing: filters, ordering and pagination over an owner's tasks.

use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, StoreError};
use crate::task::{MatrixType, Task, TaskStatus};

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    CalculatedPriority,
    Deadline,
    CreatedAt,
    Title,
    Urgency,
    Importance,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::CalculatedPriority => "calculated-priority",
            SortKey::Deadline => "deadline",
            SortKey::CreatedAt => "created-at",
            SortKey::Title => "title",
            SortKey::Urgency => "urgency",
            SortKey::Importance => "importance",
        }
    }

    fn compare(self, a: &Task, b: &Task) -> Ordering {
        match self {
            SortKey::CalculatedPriority => a.calculated_priority.cmp(&b.calculated_priority),
            // No deadline sorts as the latest possible deadline.
            SortKey::Deadline => match (a.deadline, b.deadline) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::Title => a.title.cmp(&b.title),
            SortKey::Urgency => a.urgency.cmp(&b.urgency),
            SortKey::Importance => a.importance.cmp(&b.importance),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = StoreError;

    /// Accepts the kebab-case names plus the camelCase spellings
    /// (`calculatedPriority`, `createdAt`).
    fn from_str(s: &str) -> Result<Self> {
        let norm: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();
        match norm.as_str() {
            "calculatedpriority" | "priority" => Ok(SortKey::CalculatedPriority),
            "deadline" => Ok(SortKey::Deadline),
            "createdat" => Ok(SortKey::CreatedAt),
            "title" => Ok(SortKey::Title),
            "urgency" => Ok(SortKey::Urgency),
            "importance" => Ok(SortKey::Importance),
            _ => Err(StoreError::InvalidValue {
                kind: "sort key",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    pub matrix_type: Option<MatrixType>,
    pub category: Option<String>,
    /// Case-insensitive substring of title or description.
    pub search: Option<String>,
    pub overdue_only: bool,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
    pub sort_by: SortKey,
    pub descending: bool,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            status: None,
            matrix_type: None,
            category: None,
            search: None,
            overdue_only: false,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort_by: SortKey::default(),
            descending: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPage {
    pub items: Vec<Task>,
    /// Matches before pagination.
    pub total_count: usize,
    pub page: usize,
    pub page_size: usize,
}

impl TaskQuery {
    pub fn effective_page(&self) -> usize {
        self.page.max(1)
    }

    pub fn effective_page_size(&self) -> usize {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    fn search_regex(&self) -> Result<Option<Regex>> {
        let Some(term) = self.search.as_deref().filter(|s| !s.trim().is_empty()) else {
            return Ok(None);
        };
        RegexBuilder::new(&regex::escape(term.trim()))
            .case_insensitive(true)
            .build()
            .map(Some)
            .map_err(|e| StoreError::validation("search", e.to_string()))
    }

    /// Filter, order and slice. `tasks` must already be scoped to one owner
    /// with soft-deleted records removed.
    pub fn apply<'a>(&self, tasks: impl IntoIterator<Item = &'a Task>, now: DateTime<Utc>) -> Result<TaskPage> {
        let search = self.search_regex()?;

        let mut matched: Vec<&Task> = tasks
            .into_iter()
            .filter(|t| self.status.is_none_or(|s| t.status == s))
            .filter(|t| self.matrix_type.is_none_or(|m| t.matrix_type == m))
            .filter(|t| {
                self.category
                    .as_deref()
                    .is_none_or(|c| t.category.as_deref() == Some(c))
            })
            .filter(|t| {
                search.as_ref().is_none_or(|re| {
                    re.is_match(&t.title) || t.description.as_deref().is_some_and(|d| re.is_match(d))
                })
            })
            .filter(|t| !self.overdue_only || t.is_overdue(now))
            .collect();

        matched.sort_by(|a, b| {
            let primary = self.sort_by.compare(a, b);
            let primary = if self.descending { primary.reverse() } else { primary };
            primary
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });

        let page = self.effective_page();
        let page_size = self.effective_page_size();
        let total_count = matched.len();
        let items = matched
            .into_iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .cloned()
            .collect();

        Ok(TaskPage {
            items,
            total_count,
            page,
            page_size,
        })
    }
}
