use super::types::{
    ArchitectConfig, CustomProvider, DispatchConfig, RawArchitectConfig, RawDispatchConfig,
    RawRetryConfig, RetryConfig, DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_TIMEOUT_SECS,
};
use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<ArchitectConfig> {
        let mut raw = RawArchitectConfig::default();

        // Layer 1: User config
        let user_path = Self::user_config_path();
        if let Some(user_config) = Self::read_raw(&user_path)? {
            raw = Self::merge_raw(raw, user_config);
        }

        // Layer 2: Project config
        let project_path = Self::project_config_path();
        if let Some(project_config) = Self::read_raw(&project_path)? {
            raw = Self::merge_raw(raw, project_config);
        }

        Self::finalize(raw)
    }

    /// Get user config path
    pub fn user_config_path() -> PathBuf {
        architect_paths::user_config_file()
    }

    /// Get project config path
    /// Can be overridden with ARCHITECT_PROJECT_CONFIG_DIR env var (useful for isolated e2e tests)
    pub fn project_config_path() -> PathBuf {
        architect_paths::project_config_file()
    }

    fn read_raw(path: &Path) -> Result<Option<RawArchitectConfig>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let raw = toml::from_str(&contents)
            .with_context(|| format!("invalid config in {}", path.display()))?;
        debug!(path = %path.display(), "loaded config layer");
        Ok(Some(raw))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawArchitectConfig, overlay: RawArchitectConfig) -> RawArchitectConfig {
        let mut providers = base.providers;
        for (id, overrides) in overlay.providers {
            let merged = match providers.remove(&id) {
                Some(existing) => overrides.merged_over(existing),
                None => overrides,
            };
            providers.insert(id, merged);
        }

        RawArchitectConfig {
            dispatch: RawDispatchConfig {
                timeout_secs: overlay.dispatch.timeout_secs.or(base.dispatch.timeout_secs),
            },
            retry: RawRetryConfig {
                max_attempts: overlay.retry.max_attempts.or(base.retry.max_attempts),
                base_delay_ms: overlay.retry.base_delay_ms.or(base.retry.base_delay_ms),
            },
            providers,
            custom_providers: Self::merge_custom(base.custom_providers, overlay.custom_providers),
        }
    }

    /// Overlay entries replace base entries with the same id, new ids are appended
    fn merge_custom(
        mut base: Vec<CustomProvider>,
        overlay: Vec<CustomProvider>,
    ) -> Vec<CustomProvider> {
        for custom in overlay {
            match base.iter_mut().find(|c| c.id == custom.id) {
                Some(slot) => *slot = custom,
                None => base.push(custom),
            }
        }
        base
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawArchitectConfig) -> Result<ArchitectConfig> {
        if raw.dispatch.timeout_secs == Some(0) {
            bail!("[dispatch] timeout_secs must be at least 1");
        }
        Ok(ArchitectConfig {
            dispatch: DispatchConfig {
                timeout_secs: raw.dispatch.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            },
            retry: RetryConfig {
                max_attempts: raw.retry.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
                base_delay_ms: raw.retry.base_delay_ms.unwrap_or(DEFAULT_BASE_DELAY_MS),
            },
            providers: raw.providers,
            custom_providers: raw.custom_providers,
        })
    }

    /// Load config from a specific path (for testing)
    #[cfg(test)]
    pub fn load_from_path(path: &Path) -> Result<ArchitectConfig> {
        Self::finalize(Self::read_raw(path)?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::ProviderOverride;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::TempDir;

    fn raw(toml_str: &str) -> RawArchitectConfig {
        toml::from_str(toml_str).unwrap()
    }

    // ==================== Load Tests ====================

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nonexistent.toml");

        let config = ConfigLoader::load_from_path(&path).unwrap();

        assert_eq!(config.dispatch.timeout_secs, 120);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_load_from_valid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[dispatch]
timeout_secs = 30

[retry]
base_delay_ms = 100

[providers.gemini]
vision_exclude = ["gemma"]
"#
        )
        .unwrap();

        let config = ConfigLoader::load_from_path(&path).unwrap();

        assert_eq!(config.dispatch.timeout_secs, 30);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay_ms, 100);
        assert_eq!(
            config.providers["gemini"].vision_exclude,
            Some(vec!["gemma".to_string()])
        );
    }

    #[test]
    fn test_load_invalid_toml_returns_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("invalid.toml");

        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "this is not valid toml {{{{").unwrap();

        let err = ConfigLoader::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("invalid config"));
    }

    #[test]
    fn test_load_rejects_zero_timeout() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[dispatch]\ntimeout_secs = 0\n").unwrap();

        let err = ConfigLoader::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("timeout_secs must be at least 1"));
    }

    #[test]
    fn test_merge_raw_overlay_overrides_base() {
        let base = raw(r#"
[dispatch]
timeout_secs = 60
[retry]
max_attempts = 5
base_delay_ms = 1000
[providers.groq]
base_endpoint = "https://base.example/v1"
vision_include = ["vision"]
"#);
        let overlay = raw(r#"
[retry]
max_attempts = 1
[providers.groq]
base_endpoint = "https://overlay.example/v1"
"#);

        let merged = ConfigLoader::merge_raw(base, overlay);

        assert_eq!(merged.dispatch.timeout_secs, Some(60));
        assert_eq!(merged.retry.max_attempts, Some(1));
        assert_eq!(merged.retry.base_delay_ms, Some(1000));
        assert_eq!(
            merged.providers["groq"],
            ProviderOverride {
                base_endpoint: Some("https://overlay.example/v1".into()),
                vision_include: Some(vec!["vision".into()]),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_merge_custom_providers_by_id() {
        let base = raw(r#"
[[custom_providers]]
id = "local"
base_endpoint = "http://localhost:8000/v1"

[[custom_providers]]
id = "lab"
base_endpoint = "http://lab:8000/v1"
"#);
        let overlay = raw(r#"
[[custom_providers]]
id = "local"
base_endpoint = "http://localhost:9000/v1"

[[custom_providers]]
id = "staging"
base_endpoint = "http://staging/v1"
"#);

        let merged = ConfigLoader::merge_raw(base, overlay);
        let ids: Vec<&str> = merged.custom_providers.iter().map(|c| c.id.as_str()).collect();

        assert_eq!(ids, vec!["local", "lab", "staging"]);
        assert_eq!(
            merged.custom_providers[0].base_endpoint,
            "http://localhost:9000/v1"
        );
    }

    #[test]
    #[serial]
    fn test_project_config_path_override() {
        let temp_dir = TempDir::new().unwrap();
        unsafe {
            std::env::set_var("ARCHITECT_PROJECT_CONFIG_DIR", temp_dir.path());
        }
        std::fs::write(
            temp_dir.path().join("config.toml"),
            "[dispatch]\ntimeout_secs = 5\n",
        )
        .unwrap();

        let path = ConfigLoader::project_config_path();
        let config = ConfigLoader::load();

        unsafe {
            std::env::remove_var("ARCHITECT_PROJECT_CONFIG_DIR");
        }
        assert_eq!(path, temp_dir.path().join("config.toml"));
        assert_eq!(config.unwrap().dispatch.timeout_secs, 5);
    }

    #[test]
    #[serial]
    fn test_user_config_path() {
        let path = ConfigLoader::user_config_path();
        assert!(path.to_string_lossy().contains("architect"));
        assert!(path.ends_with("config.toml"));
    }
}
