use super::types::{
    AttributionSection, DEFAULT_HOST, DEFAULT_MODEL_TIMEOUT_SECS, DEFAULT_PORT, ModelSection,
    RawAttributionConfig, RawModelConfig, RawServerConfig, RawStoreConfig, RawTallyConfig,
    ServerSection, StoreSection, TallyConfig,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variables read by the environment layer
pub const ENV_HOST: &str = "TALLY_HOST";
pub const ENV_PORT: &str = "TALLY_PORT";
pub const ENV_DATABASE: &str = "TALLY_DATABASE";
pub const ENV_SCORER_URL: &str = "TALLY_SCORER_URL";
pub const ENV_CLASSIFIER_URL: &str = "TALLY_CLASSIFIER_URL";
pub const ENV_PROJECT_CONFIG_DIR: &str = "TALLY_PROJECT_CONFIG_DIR";

/// Command-line values that win over every config layer
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
}

impl ConfigOverrides {
    fn into_raw(self) -> RawTallyConfig {
        RawTallyConfig {
            server: RawServerConfig {
                host: self.host,
                port: self.port,
            },
            store: RawStoreConfig {
                path: self.database,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (defaults, user, project, environment)
    pub fn load() -> Result<TallyConfig> {
        Self::load_with(ConfigOverrides::default())
    }

    /// Load merged configuration with command-line overrides on top
    pub fn load_with(overrides: ConfigOverrides) -> Result<TallyConfig> {
        let mut raw = RawTallyConfig::default();

        // Layer 1: User config
        raw = Self::merge_raw(raw, Self::read_layer(&Self::user_config_path())?);

        // Layer 2: Project config
        raw = Self::merge_raw(raw, Self::read_layer(&Self::project_config_path())?);

        // Layer 3: Environment
        raw = Self::merge_raw(raw, Self::env_layer(|key| std::env::var(key).ok())?);

        // Layer 4: Flags
        raw = Self::merge_raw(raw, overrides.into_raw());

        Ok(Self::finalize(raw))
    }

    /// Get user config path (`$XDG_CONFIG_HOME/tally/config.toml`)
    pub fn user_config_path() -> PathBuf {
        tally_paths::config_file()
    }

    /// Get project config path
    /// Can be overridden with TALLY_PROJECT_CONFIG_DIR env var (useful for isolated tests)
    pub fn project_config_path() -> PathBuf {
        match std::env::var(ENV_PROJECT_CONFIG_DIR) {
            Ok(dir) => PathBuf::from(dir).join("config.toml"),
            Err(_) => PathBuf::from(".tally/config.toml"),
        }
    }

    /// Read one TOML layer; a missing file is an empty layer
    fn read_layer(path: &Path) -> Result<RawTallyConfig> {
        if !path.exists() {
            return Ok(RawTallyConfig::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("invalid config in {}", path.display()))
    }

    /// Build the environment layer from a variable lookup
    fn env_layer(lookup: impl Fn(&str) -> Option<String>) -> Result<RawTallyConfig> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = non_empty(ENV_PORT)
            .map(|p| {
                p.trim()
                    .parse::<u16>()
                    .with_context(|| format!("{ENV_PORT} must be a port number, got {p:?}"))
            })
            .transpose()?;

        Ok(RawTallyConfig {
            server: RawServerConfig {
                host: non_empty(ENV_HOST),
                port,
            },
            store: RawStoreConfig {
                path: non_empty(ENV_DATABASE),
                ..Default::default()
            },
            scorer: RawModelConfig {
                url: non_empty(ENV_SCORER_URL),
                timeout_secs: None,
            },
            classifier: RawModelConfig {
                url: non_empty(ENV_CLASSIFIER_URL),
                timeout_secs: None,
            },
            attribution: RawAttributionConfig::default(),
        })
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawTallyConfig, overlay: RawTallyConfig) -> RawTallyConfig {
        RawTallyConfig {
            server: RawServerConfig {
                host: overlay.server.host.or(base.server.host),
                port: overlay.server.port.or(base.server.port),
            },
            store: RawStoreConfig {
                path: overlay.store.path.or(base.store.path),
                url: overlay.store.url.or(base.store.url),
                auth_token: overlay.store.auth_token.or(base.store.auth_token),
            },
            scorer: Self::merge_model(base.scorer, overlay.scorer),
            classifier: Self::merge_model(base.classifier, overlay.classifier),
            attribution: RawAttributionConfig {
                write_back: overlay.attribution.write_back.or(base.attribution.write_back),
            },
        }
    }

    fn merge_model(base: RawModelConfig, overlay: RawModelConfig) -> RawModelConfig {
        RawModelConfig {
            url: overlay.url.or(base.url),
            timeout_secs: overlay.timeout_secs.or(base.timeout_secs),
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawTallyConfig) -> TallyConfig {
        let model = |m: RawModelConfig| ModelSection {
            url: m.url,
            timeout_secs: m.timeout_secs.unwrap_or(DEFAULT_MODEL_TIMEOUT_SECS),
        };
        TallyConfig {
            server: ServerSection {
                host: raw.server.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port: raw.server.port.unwrap_or(DEFAULT_PORT),
            },
            store: StoreSection {
                path: raw.store.path.unwrap_or_else(|| {
                    tally_paths::default_database_path()
                        .display()
                        .to_string()
                }),
                url: raw.store.url,
                auth_token: raw.store.auth_token,
            },
            scorer: model(raw.scorer),
            classifier: model(raw.classifier),
            attribution: AttributionSection {
                write_back: raw
                    .attribution
                    .write_back
                    .unwrap_or(AttributionSection::default().write_back),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_finalize_empty_uses_defaults() {
        let config = ConfigLoader::finalize(RawTallyConfig::default());

        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert!(config.store.path.ends_with("tally.db"));
        assert!(config.scorer.url.is_none());
        assert_eq!(config.classifier.timeout_secs, DEFAULT_MODEL_TIMEOUT_SECS);
        assert!(config.attribution.write_back);
    }

    #[test]
    fn test_read_layer_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let raw = ConfigLoader::read_layer(&temp_dir.path().join("missing.toml")).unwrap();
        assert!(raw.server.port.is_none());
    }

    #[test]
    fn test_read_layer_invalid_toml_returns_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "this is not valid toml {{{{").unwrap();

        let err = ConfigLoader::read_layer(&path).unwrap_err();
        assert!(err.to_string().contains("invalid config"));
    }

    #[test]
    fn test_merge_raw_overlay_overrides_base() {
        let base = RawTallyConfig {
            server: RawServerConfig {
                host: Some("127.0.0.1".to_string()),
                port: Some(8000),
            },
            scorer: RawModelConfig {
                url: Some("http://base-scorer".to_string()),
                timeout_secs: Some(5),
            },
            attribution: RawAttributionConfig {
                write_back: Some(false),
            },
            ..Default::default()
        };
        let overlay = RawTallyConfig {
            server: RawServerConfig {
                host: None,
                port: Some(9100),
            },
            scorer: RawModelConfig {
                url: Some("http://overlay-scorer".to_string()),
                timeout_secs: None,
            },
            ..Default::default()
        };

        let merged = ConfigLoader::merge_raw(base, overlay);

        assert_eq!(merged.server.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(merged.server.port, Some(9100));
        assert_eq!(merged.scorer.url.as_deref(), Some("http://overlay-scorer"));
        assert_eq!(merged.scorer.timeout_secs, Some(5));
        assert_eq!(merged.attribution.write_back, Some(false));
    }

    #[test]
    fn test_env_layer_reads_known_variables() {
        let raw = ConfigLoader::env_layer(lookup(&[
            (ENV_HOST, "127.0.0.1"),
            (ENV_PORT, "9200"),
            (ENV_DATABASE, ":memory:"),
            (ENV_SCORER_URL, "http://scorer:8100"),
            (ENV_CLASSIFIER_URL, ""),
        ]))
        .unwrap();

        assert_eq!(raw.server.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(raw.server.port, Some(9200));
        assert_eq!(raw.store.path.as_deref(), Some(":memory:"));
        assert_eq!(raw.scorer.url.as_deref(), Some("http://scorer:8100"));
        assert!(raw.classifier.url.is_none());
    }

    #[test]
    fn test_env_layer_rejects_bad_port() {
        let err = ConfigLoader::env_layer(lookup(&[(ENV_PORT, "eighty")])).unwrap_err();
        assert!(err.to_string().contains(ENV_PORT));
    }

    #[test]
    #[serial]
    fn test_layers_apply_in_order() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("config.toml"),
            r#"
[server]
host = "10.0.0.1"
port = 9000

[attribution]
write_back = false
"#,
        )
        .unwrap();

        unsafe {
            std::env::set_var(ENV_PROJECT_CONFIG_DIR, temp_dir.path());
            std::env::set_var(ENV_PORT, "9500");
        }
        let result = ConfigLoader::load_with(ConfigOverrides {
            database: Some(":memory:".to_string()),
            ..Default::default()
        });
        unsafe {
            std::env::remove_var(ENV_PROJECT_CONFIG_DIR);
            std::env::remove_var(ENV_PORT);
        }
        let config = result.unwrap();

        // project file
        assert_eq!(config.server.host, "10.0.0.1");
        assert!(!config.attribution.write_back);
        // env over project file
        assert_eq!(config.server.port, 9500);
        // flag
        assert_eq!(config.store.path, ":memory:");
    }

    #[test]
    #[serial]
    fn test_project_config_path_default_and_override() {
        unsafe {
            std::env::remove_var(ENV_PROJECT_CONFIG_DIR);
        }
        assert_eq!(
            ConfigLoader::project_config_path(),
            PathBuf::from(".tally/config.toml")
        );

        unsafe {
            std::env::set_var(ENV_PROJECT_CONFIG_DIR, "/tmp/tally-project");
        }
        let overridden = ConfigLoader::project_config_path();
        unsafe {
            std::env::remove_var(ENV_PROJECT_CONFIG_DIR);
        }
        assert_eq!(overridden, PathBuf::from("/tmp/tally-project/config.toml"));
    }
}
