use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use effectiva_core::{StudentProfile, Workspace};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Locations of everything Effectiva keeps on disk.
#[derive(Debug, Clone)]
pub struct Paths {
    home: PathBuf,
}

impl Paths {
    /// `$EFFECTIVA_HOME`, else `~/.effectiva`. Created if missing.
    pub fn resolve() -> Result<Self> {
        let home = match std::env::var_os("EFFECTIVA_HOME") {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => {
                let home = std::env::var("HOME").context("HOME is not set")?;
                PathBuf::from(home).join(".effectiva")
            }
        };
        Self::at(home)
    }

    pub fn at(home: impl Into<PathBuf>) -> Result<Self> {
        let home = home.into();
        fs::create_dir_all(&home).with_context(|| format!("create {}", home.display()))?;
        Ok(Self { home })
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn config(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    pub fn state(&self) -> PathBuf {
        self.home.join("state.json")
    }

    pub fn profile(&self) -> PathBuf {
        self.home.join("profile.json")
    }

    pub fn memory_dir(&self) -> PathBuf {
        self.home.join("memory")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Profile {
    pub created_at_utc: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub student: StudentProfile,
}

pub fn write_profile(paths: &Paths, profile: &Profile) -> Result<()> {
    let p = paths.profile();
    let json = serde_json::to_string_pretty(profile)?;
    fs::write(&p, json).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn read_profile(paths: &Paths) -> Result<Profile> {
    let p = paths.profile();
    if !p.exists() {
        return Ok(Profile::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

/// Load the saved workspace, or start a fresh one at `now`.
pub fn load_workspace(paths: &Paths, now: NaiveDateTime) -> Result<Workspace> {
    let p = paths.state();
    if !p.exists() {
        debug!(path = %p.display(), "no saved workspace, starting fresh");
        return Ok(Workspace::new(now));
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_workspace(paths: &Paths, ws: &Workspace) -> Result<()> {
    let p = paths.state();
    let json = serde_json::to_string_pretty(ws).context("serialize workspace")?;
    fs::write(&p, json).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}
