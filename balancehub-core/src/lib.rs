//! balancehub-core: task model, Eisenhower Matrix priority engine and
//! owner-scoped task store for BalanceHub.

pub mod analytics;
pub mod error;
pub mod priority;
pub mod query;
pub mod store;
pub mod task;
pub mod time;
pub mod view;

pub use analytics::TaskAnalytics;
pub use error::{Result, StoreError};
pub use priority::{
    effort_level_for, is_due_soon_at, is_overdue_at, recalculate_priority, refresh,
    update_time_pressure,
};
pub use query::{SortKey, TaskPage, TaskQuery};
pub use store::{NewTask, PriorityOverride, TaskStore, TaskUpdate};
pub use task::{EffortLevel, MatrixType, Task, TaskStatus};
pub use time::{format_in_tz, parse_deadline, parse_local_deadline_to_utc, to_rfc3339_utc};
pub use view::{PriorityOutcome, TaskView};
