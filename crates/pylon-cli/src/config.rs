use anyhow::{Context, Result};
use pylon_camera::StartupParameters;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_MODEL: &str = "acA1300-30gc";

/// CLI configuration: optional TOML file, then `PYLON_*` environment
/// variables, then defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Camera model profile to simulate (default: acA1300-30gc).
    pub model: String,
    /// Transport settings for `startup`.
    pub startup: StartupParameters,
}

/// On-disk layout of the configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    model: Option<String>,
    startup: StartupParameters,
}

impl Config {
    /// Load from `path`, or from `PYLON_CONFIG` / the default location if
    /// that file exists, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).or_else(default_config_path);
        let contents = match path {
            Some(p) => {
                tracing::debug!(path = %p.display(), "reading config file");
                let src = std::fs::read_to_string(&p)
                    .with_context(|| format!("failed to read config {}", p.display()))?;
                Some(src)
            }
            None => None,
        };
        Self::from_sources(contents.as_deref(), |key| std::env::var(key).ok())
    }

    /// Build from file contents and an environment lookup.
    pub fn from_sources(
        file: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let file: FileConfig = match file {
            Some(src) => toml::from_str(src).context("invalid config TOML")?,
            None => FileConfig::default(),
        };

        let mut startup = file.startup;
        startup.mtu_size = env_i64(&env, "PYLON_MTU_SIZE", startup.mtu_size);
        startup.inter_package_delay =
            env_i64(&env, "PYLON_INTER_PACKAGE_DELAY", startup.inter_package_delay);

        let model = env("PYLON_MODEL")
            .or(file.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self { model, startup })
    }
}

fn default_config_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("PYLON_CONFIG") {
        return Some(PathBuf::from(p));
    }
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;
    let path = config_dir.join("pylon-cam").join("config.toml");
    path.exists().then_some(path)
}

fn env_i64(env: &impl Fn(&str) -> Option<String>, key: &str, default: i64) -> i64 {
    env(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}
