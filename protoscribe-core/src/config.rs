// Environment-driven settings

use crate::error::ConfigError;
use crate::summarize::{DEFAULT_BATCH_PAUSE, DEFAULT_BATCH_SIZE};
use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::time::Duration;

pub const FIGMA_TOKEN: &str = "FIGMA_TOKEN";
pub const CLICKUP_API_TOKEN: &str = "CLICKUP_API_TOKEN";
pub const AZURE_OPENAI_API_KEY: &str = "AZURE_OPENAI_API_KEY";
pub const AZURE_OPENAI_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
pub const AZURE_OPENAI_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";
pub const AZURE_OPENAI_MODEL: &str = "AZURE_OPENAI_MODEL";
pub const BATCH_SIZE: &str = "PROTOSCRIBE_BATCH_SIZE";
pub const BATCH_PAUSE_MS: &str = "PROTOSCRIBE_BATCH_PAUSE_MS";

/// Read from the working directory before the process environment.
pub const ENV_FILE: &str = ".env";

pub const DEFAULT_API_VERSION: &str = "2024-12-01-preview";
pub const DEFAULT_MODEL: &str = "gpt-4o";

const ENV_KEYS: [&str; 8] = [
    FIGMA_TOKEN,
    CLICKUP_API_TOKEN,
    AZURE_OPENAI_API_KEY,
    AZURE_OPENAI_ENDPOINT,
    AZURE_OPENAI_API_VERSION,
    AZURE_OPENAI_MODEL,
    BATCH_SIZE,
    BATCH_PAUSE_MS,
];

/// Credentials and tuning knobs.
///
/// Credentials are optional here; each command asks for the ones it needs through the
/// `require_*` accessors, so `extract` runs without Azure keys and `ticket` without Figma.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub figma_token: Option<String>,
    pub clickup_token: Option<String>,
    pub azure_api_key: Option<String>,
    pub azure_endpoint: Option<String>,
    pub azure_api_version: String,
    pub azure_model: String,
    pub batch_size: usize,
    pub batch_pause: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            figma_token: None,
            clickup_token: None,
            azure_api_key: None,
            azure_endpoint: None,
            azure_api_version: DEFAULT_API_VERSION.to_string(),
            azure_model: DEFAULT_MODEL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_pause: DEFAULT_BATCH_PAUSE,
        }
    }
}

impl Settings {
    /// `.env` in the working directory, overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = ENV_KEYS
            .iter()
            .filter_map(|key| env::var(key).ok().map(|value| (key.to_string(), value)))
            .collect();
        Self::from_sources(Some(Path::new(ENV_FILE)), &vars)
    }

    /// Layer `vars` over the contents of `env_file`.
    ///
    /// A missing file is not an error. A blank value in `vars` does not hide the file's value.
    pub fn from_sources(
        env_file: Option<&Path>,
        vars: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let mut merged = match env_file {
            Some(path) => read_env_file(path)?,
            None => HashMap::new(),
        };
        merged.extend(
            vars.iter()
                .filter(|(_, value)| !value.trim().is_empty())
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        Self::from_map(&merged)
    }

    /// Blank values count as unset.
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let defaults = Self::default();
        let batch_size = match get(BATCH_SIZE) {
            Some(value) => match value.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::Invalid { key: BATCH_SIZE, value }),
            },
            None => defaults.batch_size,
        };
        let batch_pause = match get(BATCH_PAUSE_MS) {
            Some(value) => value
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::Invalid { key: BATCH_PAUSE_MS, value })?,
            None => defaults.batch_pause,
        };

        Ok(Self {
            figma_token: get(FIGMA_TOKEN),
            clickup_token: get(CLICKUP_API_TOKEN),
            azure_api_key: get(AZURE_OPENAI_API_KEY),
            azure_endpoint: get(AZURE_OPENAI_ENDPOINT),
            azure_api_version: get(AZURE_OPENAI_API_VERSION).unwrap_or(defaults.azure_api_version),
            azure_model: get(AZURE_OPENAI_MODEL).unwrap_or(defaults.azure_model),
            batch_size,
            batch_pause,
        })
    }

    pub fn require_figma_token(&self) -> Result<&str, ConfigError> {
        required(&self.figma_token, FIGMA_TOKEN)
    }

    pub fn require_clickup_token(&self) -> Result<&str, ConfigError> {
        required(&self.clickup_token, CLICKUP_API_TOKEN)
    }

    pub fn require_azure_api_key(&self) -> Result<&str, ConfigError> {
        required(&self.azure_api_key, AZURE_OPENAI_API_KEY)
    }

    pub fn require_azure_endpoint(&self) -> Result<&str, ConfigError> {
        required(&self.azure_endpoint, AZURE_OPENAI_ENDPOINT)
    }
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    if !path.is_file() {
        return Ok(HashMap::new());
    }
    let env_file_error = |e: dotenvy::Error| ConfigError::EnvFile {
        path: path.display().to_string(),
        message: e.to_string(),
    };
    dotenvy::from_path_iter(path)
        .map_err(env_file_error)?
        .map(|item| item.map_err(env_file_error))
        .collect()
}

fn required<'a>(value: &'a Option<String>, key: &'static str) -> Result<&'a str, ConfigError> {
    value.as_deref().ok_or(ConfigError::Missing(key))
}
