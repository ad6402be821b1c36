use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_FILE: &str = ".env";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub trello: TrelloConfig,
    #[serde(default)]
    pub export: ExportPacingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub feed: FeedConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrelloConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_api_base() -> String {
    "https://api.trello.com/1".to_string()
}
fn default_request_timeout() -> u64 { 15_000 }

impl Default for TrelloConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl TrelloConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Cooperative pacing between remote calls. Not a retry policy.
#[derive(Debug, Deserialize, Clone)]
pub struct ExportPacingConfig {
    #[serde(default = "default_delay")]
    pub card_delay_ms: u64,
    #[serde(default = "default_delay")]
    pub attachment_delay_ms: u64,
}

fn default_delay() -> u64 { 100 }

impl Default for ExportPacingConfig {
    fn default() -> Self {
        Self {
            card_delay_ms: default_delay(),
            attachment_delay_ms: default_delay(),
        }
    }
}

impl ExportPacingConfig {
    /// No pacing at all; used by tests and fakes.
    pub fn none() -> Self {
        Self {
            card_delay_ms: 0,
            attachment_delay_ms: 0,
        }
    }

    pub fn card_delay(&self) -> Duration {
        Duration::from_millis(self.card_delay_ms)
    }

    pub fn attachment_delay(&self) -> Duration {
        Duration::from_millis(self.attachment_delay_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

fn default_state_file() -> PathBuf {
    PathBuf::from("trello-export.json")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    /// Prefix for post links that the page gives as relative paths.
    #[serde(default = "default_link_base")]
    pub link_base: String,
}

fn default_link_base() -> String {
    "https://twitter.com".to_string()
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            link_base: default_link_base(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| "Failed to parse config TOML")?;
        Ok(config)
    }

    /// Like `load`, but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load .env file into process environment. Real env vars take precedence.
    pub fn load_env_file() {
        let path = Path::new(ENV_FILE);
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return,
        };
        // Strip BOM if present (common on Windows-created files)
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
        for (key, value) in parse_env_lines(content) {
            if std::env::var(&key).is_err() {
                std::env::set_var(key, value);
            }
        }
    }

    /// Trello API key from env / .env, or prompted. Prompted values are saved to .env.
    pub fn trello_api_key() -> Result<String> {
        env_or_prompt("TRELLO_API_KEY", "Trello API Key")
    }

    pub fn trello_token() -> Result<String> {
        env_or_prompt("TRELLO_TOKEN", "Trello Token")
    }
}

fn env_or_prompt(var: &str, label: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(v) if !v.is_empty() => Ok(sanitize_key(&v)),
        _ => {
            let v = prompt(label)?;
            save_env_var(var, &v);
            Ok(v)
        }
    }
}

fn parse_env_lines(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(|line| line.trim().trim_matches('\r'))
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (key.trim().to_string(), value.to_string())
        })
        .collect()
}

pub fn prompt(label: &str) -> Result<String> {
    print!("  {} > ", label);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let value = input.trim().to_string();
    if value.is_empty() {
        anyhow::bail!("{} cannot be empty", label);
    }
    Ok(value)
}

/// Strip carriage returns, BOM, and other invisible chars from a key value.
fn sanitize_key(raw: &str) -> String {
    raw.replace(['\r', '\u{feff}', '\u{200b}'], "")
        .trim()
        .to_string()
}

/// Append a KEY=VALUE line to .env and set it in the current process.
fn save_env_var(key: &str, value: &str) {
    std::env::set_var(key, value);
    let path = Path::new(ENV_FILE);
    let mut contents = std::fs::read_to_string(path).unwrap_or_default();
    if !contents.is_empty() && !contents.ends_with('\n') {
        contents.push('\n');
    }
    contents.push_str(&format!("{}={}\n", key, value));
    if let Err(e) = std::fs::write(path, contents) {
        tracing::warn!(error = %e, "failed to save {} to .env", key);
    }
}
