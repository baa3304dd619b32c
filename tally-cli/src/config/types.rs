use serde::{Deserialize, Serialize};

/// Default host for the tally server
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default port for the tally server
pub const DEFAULT_PORT: u16 = 8000;

/// Default request timeout for remote models
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 10;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawTallyConfig {
    #[serde(default)]
    pub server: RawServerConfig,

    #[serde(default)]
    pub store: RawStoreConfig,

    #[serde(default)]
    pub scorer: RawModelConfig,

    #[serde(default)]
    pub classifier: RawModelConfig,

    #[serde(default)]
    pub attribution: RawAttributionConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawStoreConfig {
    pub path: Option<String>,
    pub url: Option<String>,
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawModelConfig {
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawAttributionConfig {
    pub write_back: Option<bool>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TallyConfig {
    pub server: ServerSection,
    pub store: StoreSection,
    pub scorer: ModelSection,
    pub classifier: ModelSection,
    pub attribution: AttributionSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Where touchpoints live.
///
/// `url` selects a remote Turso database and takes precedence over `path`.
/// `path` may be `:memory:` for an ephemeral store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSection {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

/// A remote model endpoint. No `url` means the local implementation is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: DEFAULT_MODEL_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionSection {
    /// Persist computed weights back onto touchpoints
    pub write_back: bool,
}

impl Default for AttributionSection {
    fn default() -> Self {
        Self { write_back: true }
    }
}
