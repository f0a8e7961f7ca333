use std::collections::HashMap;

use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub workspace: WorkspaceConfig,
    /// Tool name -> base URL; merged with env-discovered endpoints at startup
    pub tools: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Workspace root; defaults to `~/jobflow/data/workspace` when unset
    pub dir: Option<String>,
    pub backend: WorkspaceBackend,
    /// Guard in-memory writes with per-artifact leases
    pub lease_writes: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceBackend {
    #[default]
    Local,
    Memory,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            dir: None,
            backend: WorkspaceBackend::default(),
            lease_writes: false,
        }
    }
}

impl WorkspaceConfig {
    pub fn resolve_dir(&self) -> String {
        match &self.dir {
            Some(dir) if !dir.trim().is_empty() => dir.clone(),
            _ => dirs::home_dir()
                .map(|home| {
                    home.join("jobflow")
                        .join("data")
                        .join("workspace")
                        .to_string_lossy()
                        .into_owned()
                })
                .unwrap_or_else(|| "data/workspace".to_string()),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
