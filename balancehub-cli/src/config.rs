use anyhow::{Context, Result};
use balancehub_core::SortKey;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::state::ensure_balancehub_home;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub profile: ProfileSection,
    #[serde(default)]
    pub list: ListSection,
    #[serde(default)]
    pub log: LogSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSection {
    /// Every task command acts as this owner.
    pub owner: String,
    /// IANA zone for entering and displaying deadlines.
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSection {
    pub page_size: usize,
    pub sort_by: SortKey,
    pub descending: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSection {
    /// Filter used when RUST_LOG is unset.
    pub level: String,
}

impl Default for ProfileSection {
    fn default() -> Self {
        Self {
            owner: "local".to_string(),
            timezone: "America/Chicago".to_string(),
        }
    }
}

impl Default for ListSection {
    fn default() -> Self {
        Self {
            page_size: 50,
            sort_by: SortKey::CalculatedPriority,
            descending: true,
        }
    }
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_balancehub_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    let cfg: Config = toml::from_str(&s).context("parse config.toml")?;
    cfg.profile
        .timezone
        .parse::<chrono_tz::Tz>()
        .map_err(|_| anyhow::anyhow!("config.toml: invalid profile.timezone '{}'", cfg.profile.timezone))?;
    Ok(cfg)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    let cfg = Config::default();
    save_config(&cfg)?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config(cfg: &Config) -> Result<()> {
    println!("# {}", config_path()?.display());
    print!("{}", toml::to_string_pretty(cfg).context("serialize config")?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: Config = toml::from_str("[profile]\nowner = \"ana\"\ntimezone = \"Europe/Berlin\"\n").unwrap();
        assert_eq!(cfg.profile.owner, "ana");
        assert_eq!(cfg.list.page_size, 50);
        assert_eq!(cfg.list.sort_by, SortKey::CalculatedPriority);
        assert_eq!(cfg.log.level, "warn");
    }

    #[test]
    fn sort_key_is_kebab_case_in_toml() {
        let cfg: Config = toml::from_str("[list]\npage_size = 10\nsort_by = \"created-at\"\ndescending = false\n").unwrap();
        assert_eq!(cfg.list.sort_by, SortKey::CreatedAt);
        let out = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(out.contains("sort_by = \"calculated-priority\""));
    }
}
