use anyhow::{bail, Context, Result};
use balancehub_core::{
    format_in_tz, parse_deadline, MatrixType, NewTask, PriorityOverride, SortKey, TaskQuery,
    TaskStatus, TaskUpdate, TaskView,
};
use chrono::{DateTime, Utc};
use clap::Subcommand;

use crate::config::Config;
use crate::state::{load_store, save_store};

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Create a task; it is classified and scored immediately
    Add {
        title: String,

        #[arg(long)]
        description: Option<String>,

        /// 1-10
        #[arg(long, short, default_value_t = 5, value_parser = clap::value_parser!(i32).range(1..=10))]
        urgency: i32,

        /// 1-10
        #[arg(long, short, default_value_t = 5, value_parser = clap::value_parser!(i32).range(1..=10))]
        importance: i32,

        /// Estimated effort in hours (0.1-100)
        #[arg(long, default_value_t = 1.0)]
        hours: f64,

        /// RFC 3339, or "YYYY-MM-DD HH:MM" in the configured timezone
        #[arg(long)]
        deadline: Option<String>,

        #[arg(long)]
        category: Option<String>,

        /// Repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List tasks (default: highest priority first)
    List {
        #[arg(long)]
        status: Option<TaskStatus>,

        /// do / schedule / delegate / delete
        #[arg(long)]
        matrix: Option<MatrixType>,

        #[arg(long)]
        category: Option<String>,

        /// Case-insensitive text in title or description
        #[arg(long)]
        search: Option<String>,

        #[arg(long, default_value_t = false)]
        overdue: bool,

        /// calculated-priority, deadline, created-at, title, urgency, importance
        #[arg(long)]
        sort: Option<SortKey>,

        /// Ascending order
        #[arg(long, default_value_t = false)]
        asc: bool,

        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Defaults to config list.page_size (max 100)
        #[arg(long)]
        page_size: Option<usize>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show one task with its derived indicators
    Show {
        /// Task id or unique prefix
        id: String,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Change fields; priority is recalculated afterwards
    Update {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long, short, value_parser = clap::value_parser!(i32).range(1..=10))]
        urgency: Option<i32>,

        #[arg(long, short, value_parser = clap::value_parser!(i32).range(1..=10))]
        importance: Option<i32>,

        #[arg(long)]
        hours: Option<f64>,

        #[arg(long)]
        deadline: Option<String>,

        /// todo / in-progress / completed / cancelled
        #[arg(long)]
        status: Option<TaskStatus>,

        #[arg(long)]
        category: Option<String>,
    },

    /// todo -> in-progress
    Start { id: String },

    /// in-progress -> todo
    Pause { id: String },

    /// Mark cancelled
    Cancel { id: String },

    /// Mark completed, optionally recording actual hours
    Complete {
        id: String,

        #[arg(long)]
        hours: Option<f64>,
    },

    /// Manually re-prioritize (counts as a reschedule)
    Priority {
        id: String,

        #[arg(long, short, value_parser = clap::value_parser!(i32).range(1..=10))]
        urgency: i32,

        #[arg(long, short, value_parser = clap::value_parser!(i32).range(1..=10))]
        importance: i32,

        /// Keeps the current deadline if omitted
        #[arg(long)]
        deadline: Option<String>,
    },

    /// Delete a task (soft by default)
    Delete {
        id: String,

        #[arg(long, default_value_t = false)]
        hard: bool,
    },

    /// Recompute time pressure and priority against the current time
    Recalc {
        /// Only this task; all tasks if omitted
        id: Option<String>,
    },

    /// Productivity summary
    Analytics {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

pub fn run(cmd: TaskCommand, cfg: &Config) -> Result<()> {
    let now = Utc::now();
    let owner = cfg.profile.owner.as_str();
    let tz = cfg.profile.timezone.as_str();
    let mut store = load_store()?;

    match cmd {
        TaskCommand::Add {
            title,
            description,
            urgency,
            importance,
            hours,
            deadline,
            category,
            tags,
            json,
        } => {
            let input = NewTask {
                title,
                description,
                urgency,
                importance,
                estimated_hours: hours,
                deadline: deadline.as_deref().map(|d| parse_deadline(d, tz)).transpose()?,
                category,
                tags,
            };
            let task = store.create(owner, input, now)?;
            save_store(&store)?;
            let view = TaskView::at(&task, now);
            if json {
                print_json(&view)?;
            } else {
                println!("Created {}", short_id(&view.id));
                print_row(&view, tz);
            }
        }

        TaskCommand::List {
            status,
            matrix,
            category,
            search,
            overdue,
            sort,
            asc,
            page,
            page_size,
            json,
        } => {
            let query = TaskQuery {
                status,
                matrix_type: matrix,
                category,
                search,
                overdue_only: overdue,
                page,
                page_size: page_size.unwrap_or(cfg.list.page_size),
                sort_by: sort.unwrap_or(cfg.list.sort_by),
                descending: if asc { false } else { cfg.list.descending },
            };
            let result = store.list(owner, &query, now)?;
            let views: Vec<TaskView> = result.items.iter().map(|t| TaskView::at(t, now)).collect();
            if json {
                print_json(&views)?;
            } else if views.is_empty() {
                println!("No tasks.");
            } else {
                for v in &views {
                    print_row(v, tz);
                }
                println!(
                    "\npage {} ({} per page), {} matching",
                    result.page, result.page_size, result.total_count
                );
            }
        }

        TaskCommand::Show { id, json } => {
            let task = store.find_by_prefix(owner, &id)?;
            let view = TaskView::at(task, now);
            if json {
                print_json(&view)?;
            } else {
                print_detail(&view, tz);
            }
        }

        TaskCommand::Update {
            id,
            title,
            description,
            urgency,
            importance,
            hours,
            deadline,
            status,
            category,
        } => {
            let id = store.find_by_prefix(owner, &id)?.id.clone();
            let patch = TaskUpdate {
                title,
                description,
                urgency,
                importance,
                estimated_hours: hours,
                deadline: deadline.as_deref().map(|d| parse_deadline(d, tz)).transpose()?,
                status,
                category,
            };
            ensure_changes(&patch, &id)?;
            let task = store.update(owner, &id, patch, now)?;
            save_store(&store)?;
            print_row(&TaskView::at(&task, now), tz);
        }

        TaskCommand::Start { id } => {
            let id = store.find_by_prefix(owner, &id)?.id.clone();
            let task = store.start(owner, &id, now)?;
            save_store(&store)?;
            print_row(&TaskView::at(&task, now), tz);
        }

        TaskCommand::Pause { id } => {
            let id = store.find_by_prefix(owner, &id)?.id.clone();
            let task = store.pause(owner, &id, now)?;
            save_store(&store)?;
            print_row(&TaskView::at(&task, now), tz);
        }

        TaskCommand::Cancel { id } => {
            let id = store.find_by_prefix(owner, &id)?.id.clone();
            let task = store.cancel(owner, &id, now)?;
            save_store(&store)?;
            print_row(&TaskView::at(&task, now), tz);
        }

        TaskCommand::Complete { id, hours } => {
            let id = store.find_by_prefix(owner, &id)?.id.clone();
            let task = store.complete(owner, &id, hours, now)?;
            save_store(&store)?;
            println!(
                "Completed {} ({:.1}h of {:.1}h estimated, {:.0}%)",
                short_id(&task.id),
                task.actual_hours,
                task.estimated_hours,
                task.completion_percentage()
            );
        }

        TaskCommand::Priority {
            id,
            urgency,
            importance,
            deadline,
        } => {
            let id = store.find_by_prefix(owner, &id)?.id.clone();
            let input = PriorityOverride {
                urgency,
                importance,
                deadline: deadline.as_deref().map(|d| parse_deadline(d, tz)).transpose()?,
            };
            let outcome = store.override_priority(owner, &id, input, now)?;
            save_store(&store)?;
            println!(
                "{} -> {} priority={} time_pressure={:.2}",
                short_id(&outcome.task_id),
                outcome.matrix_type,
                outcome.calculated_priority,
                outcome.time_pressure
            );
        }

        TaskCommand::Delete { id, hard } => {
            let id = store.find_by_prefix(owner, &id)?.id.clone();
            store.delete(owner, &id, hard, now)?;
            save_store(&store)?;
            println!("{} {}", if hard { "Removed" } else { "Deleted" }, short_id(&id));
        }

        TaskCommand::Recalc { id } => {
            match id {
                Some(id) => {
                    let id = store.find_by_prefix(owner, &id)?.id.clone();
                    let task = store.recompute(owner, &id, now)?;
                    print_row(&TaskView::at(&task, now), tz);
                }
                None => {
                    let n = store.recompute_all(owner, now);
                    println!("Recalculated {n} tasks");
                }
            }
            save_store(&store)?;
        }

        TaskCommand::Analytics { json } => {
            let stats = store.analytics(owner, now);
            if json {
                print_json(&stats)?;
            } else {
                println!("Tasks:      {}", stats.total_tasks);
                println!("Completed:  {}", stats.completed_tasks);
                println!("Pending:    {}", stats.pending_tasks);
                println!("Overdue:    {}", stats.overdue_tasks);
                println!("Avg hours to complete: {:.1}", stats.average_completion_hours);
                print_counts("By quadrant", &stats.tasks_by_matrix);
                print_counts("By status", &stats.tasks_by_status);
                print_counts("By category", &stats.tasks_by_category);
            }
        }
    }

    Ok(())
}

/// An update with no fields would only re-score the task; `recalc` does that.
fn ensure_changes(patch: &TaskUpdate, id: &str) -> Result<()> {
    if *patch == TaskUpdate::default() {
        bail!(
            "nothing to update for {}; pass at least one field (see `balancehub task update --help`)",
            short_id(id)
        );
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("serialize output")?);
    Ok(())
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn display_time(dt: DateTime<Utc>, tz: &str) -> String {
    format_in_tz(dt, tz).unwrap_or_else(|_| dt.to_rfc3339())
}

fn print_row(v: &TaskView, tz: &str) {
    let due = match v.deadline {
        Some(d) if v.is_overdue => format!(" | OVERDUE {}", display_time(d, tz)),
        Some(d) if v.is_due_soon => format!(" | due soon {}", display_time(d, tz)),
        Some(d) => format!(" | due {}", display_time(d, tz)),
        None => String::new(),
    };
    println!(
        "[{:<8} {:>2}] {} {} ({}){}",
        v.matrix_type.as_str(),
        v.calculated_priority,
        short_id(&v.id),
        v.title,
        v.status,
        due
    );
}

fn print_detail(v: &TaskView, tz: &str) {
    println!("{}  {}", v.id, v.title);
    if let Some(d) = &v.description {
        println!("  {d}");
    }
    println!("  status:      {}", v.status);
    println!("  quadrant:    {} (priority {})", v.matrix_type, v.calculated_priority);
    println!("  urgency:     {}  importance: {}", v.urgency, v.importance);
    println!(
        "  effort:      {} ({:.1}h estimated, {:.1}h actual, {:.0}%)",
        v.effort_level, v.estimated_hours, v.actual_hours, v.completion_percentage
    );
    println!("  pressure:    {:.2}", v.time_pressure);
    if let Some(d) = v.deadline {
        println!(
            "  deadline:    {} ({:+.1}h{})",
            display_time(d, tz),
            v.time_remaining_hours,
            if v.is_overdue {
                ", overdue"
            } else if v.is_due_soon {
                ", due soon"
            } else {
                ""
            }
        );
    }
    if let Some(s) = v.start_date {
        println!("  started:     {}", display_time(s, tz));
    }
    if let Some(c) = v.completed_at {
        println!("  completed:   {}", display_time(c, tz));
    }
    if let Some(c) = &v.category {
        println!("  category:    {c}");
    }
    if !v.tags.is_empty() {
        println!("  tags:        {}", v.tags.join(", "));
    }
    println!("  reschedules: {}", v.reschedule_count);
}

fn print_counts(label: &str, counts: &std::collections::BTreeMap<String, usize>) {
    if counts.is_empty() {
        return;
    }
    let parts: Vec<String> = counts.iter().map(|(k, n)| format!("{k}={n}")).collect();
    println!("{label}: {}", parts.join(" "));
}
