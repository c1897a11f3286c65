//! Layered settings: serde defaults, then an optional TOML file, then
//! `ORION_`-prefixed environment variables.
//!
//! ```text
//! ORION_WHITELIST=0xaaa,0xbbb
//! ORION_INTENT_DECIMALS=9
//! ORION_SIMULATION__EPOCHS=730
//! ```

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat, Source};
use serde::Deserialize;
use tracing::debug;

use crate::intent::DEFAULT_DUST_SEED;
use crate::sim::SimulationConfig;

pub const DEFAULT_CONFIG_NAME: &str = "orion";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Config(#[from] config::ConfigError),
}

pub type SettingsResult<T> = Result<T, SettingsError>;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Whitelisted vault/token identifiers, in protocol order.
    #[serde(default)]
    pub whitelist: Vec<String>,
    /// Fixed-point precision of curator intents. Only the intent commands
    /// need it; the decimals authority fails when it is absent.
    #[serde(default)]
    pub intent_decimals: Option<u32>,
    #[serde(default = "default_dust_seed")]
    pub dust_seed: u64,
    /// Fuzz every intent with dust for missing whitelisted tokens.
    #[serde(default)]
    pub fuzz: bool,
    #[serde(default = "default_journal_path")]
    pub journal_path: PathBuf,
    /// Suffix stripped from CSV portfolio column names.
    #[serde(default)]
    pub strip_suffix: Option<String>,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Prometheus listener port, used with the `metrics-exporter` feature.
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

fn default_dust_seed() -> u64 {
    DEFAULT_DUST_SEED
}

fn default_journal_path() -> PathBuf {
    PathBuf::from("data/submissions.jsonl")
}

fn default_log_filter() -> String {
    "orion_rs=info,orion=info".to_string()
}

fn default_metrics_port() -> u16 {
    9000
}

fn env_source() -> Environment {
    Environment::with_prefix("ORION")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("whitelist")
}

impl Settings {
    /// Load from `path` if given (must exist), else from `./orion.toml` if present.
    pub fn load(path: Option<&Path>) -> SettingsResult<Self> {
        match path {
            Some(p) => Self::from_sources(File::from(p).required(true), env_source()),
            None => Self::from_sources(File::with_name(DEFAULT_CONFIG_NAME).required(false), env_source()),
        }
    }

    /// Build from an inline TOML document layered under `env`.
    pub fn from_toml_str(toml: &str, env: Environment) -> SettingsResult<Self> {
        Self::from_sources(File::from_str(toml, FileFormat::Toml), env)
    }

    fn from_sources<S>(file: S, env: Environment) -> SettingsResult<Self>
    where
        S: Source + Send + Sync + 'static,
    {
        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()?;
        debug!(
            whitelist = settings.whitelist.len(),
            decimals = ?settings.intent_decimals,
            journal = %settings.journal_path.display(),
            "Loaded settings"
        );
        Ok(settings)
    }
}
