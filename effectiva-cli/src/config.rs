use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::state::Paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmSection,
    pub intent: IntentSection,
    pub context: ContextSection,
    pub profile: ProfileSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// "openai" or "anthropic".
    pub provider: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com".to_string(),
            temperature: 0.4,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentBackend {
    #[default]
    Heuristic,
    Model,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentSection {
    pub backend: IntentBackend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextSection {
    pub max_tokens: usize,
    pub keep_last: usize,
}

impl Default for ContextSection {
    fn default() -> Self {
        Self {
            max_tokens: effectiva_core::context::DEFAULT_MAX_TOKENS,
            keep_last: effectiva_core::context::DEFAULT_KEEP_LAST,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSection {
    pub timezone: String,
    /// Where the student usually is; "home" or "college".
    pub location: String,
}

impl Default for ProfileSection {
    fn default() -> Self {
        Self {
            timezone: "Asia/Kolkata".to_string(),
            location: "home".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

pub fn load_config(paths: &Paths) -> Result<Config> {
    let p = paths.config();
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).context("parse config.toml")
}

pub fn save_config(paths: &Paths, cfg: &Config) -> Result<()> {
    let p = paths.config();
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config(paths: &Paths) -> Result<()> {
    let p = paths.config();
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(paths, &Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testutil::scratch_dir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let paths = Paths::at(scratch_dir("config-missing")).unwrap();
        let cfg = load_config(&paths).unwrap();
        assert_eq!(cfg.intent.backend, IntentBackend::Heuristic);
        assert_eq!(cfg.context.max_tokens, 2048);
        assert_eq!(cfg.context.keep_last, 5);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let paths = Paths::at(scratch_dir("config-partial")).unwrap();
        fs::write(paths.config(), "[intent]\nbackend = \"model\"\n\n[llm]\nprovider = \"anthropic\"\n").unwrap();
        let cfg = load_config(&paths).unwrap();
        assert_eq!(cfg.intent.backend, IntentBackend::Model);
        assert_eq!(cfg.llm.provider, "anthropic");
        assert_eq!(cfg.llm.temperature, 0.4);
        assert_eq!(cfg.profile.timezone, "Asia/Kolkata");
    }

    #[test]
    fn test_init_writes_once() {
        let paths = Paths::at(scratch_dir("config-init")).unwrap();
        init_config(&paths).unwrap();
        let first = fs::read_to_string(paths.config()).unwrap();
        assert!(first.contains("[context]"));
        init_config(&paths).unwrap();
        assert_eq!(fs::read_to_string(paths.config()).unwrap(), first);
    }
}
