use anyhow::{Context, Result};
use balancehub_core::{Task, TaskStore};
use std::fs;
use std::path::PathBuf;

/// `$BALANCEHUB_HOME`, else `~/.balancehub`.
pub fn balancehub_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("BALANCEHUB_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".balancehub"))
}

pub fn ensure_balancehub_home() -> Result<PathBuf> {
    let dir = balancehub_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn tasks_path() -> Result<PathBuf> {
    Ok(ensure_balancehub_home()?.join("tasks.json"))
}

pub fn load_store() -> Result<TaskStore> {
    let p = tasks_path()?;
    if !p.exists() {
        return Ok(TaskStore::new());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    let tasks: Vec<Task> =
        serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))?;
    tracing::debug!(count = tasks.len(), path = %p.display(), "loaded tasks");
    Ok(TaskStore::from_tasks(tasks))
}

pub fn save_store(store: &TaskStore) -> Result<()> {
    let p = tasks_path()?;
    let json = serde_json::to_string_pretty(&store.to_records())?;
    fs::write(&p, json).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}
