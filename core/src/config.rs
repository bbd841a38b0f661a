use crate::{store::DEFAULT_BUSY_TIMEOUT_MS, types::Day};
use serde::{Deserialize, Serialize};

/// Process-level settings for an engine instance, read from a JSON file.
/// Every field is optional in the file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// SQLite path. `:memory:` gives an isolated throwaway database.
    pub database:          String,
    pub busy_timeout_ms:   u64,
    /// Day written to the clock at startup. `None` keeps the stored day.
    pub initial_day:       Option<Day>,
    pub default_page_size: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database:          ":memory:".to_string(),
            busy_timeout_ms:   DEFAULT_BUSY_TIMEOUT_MS,
            initial_day:       None,
            default_page_size: 10,
        }
    }
}

impl EngineConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        Self::from_json(&raw).map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}
