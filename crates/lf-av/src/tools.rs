//! External tool detection and management.
//!
//! The [`ToolRegistry`] discovers and caches the locations of the external
//! CLI tools every pipeline stage shells out to (ffmpeg, ffprobe,
//! thumbsgenerator, livepeer) and provides lookup methods for the rest of
//! the crate.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lf_core::config::ToolsConfig;
use serde::{Deserialize, Serialize};

/// Default helper timeout: 5 minutes.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

pub const FFMPEG: &str = "ffmpeg";
pub const FFPROBE: &str = "ffprobe";
pub const THUMBSGENERATOR: &str = "thumbsgenerator";
pub const LIVEPEER: &str = "livepeer";

/// Known tool names that the registry manages.
pub const KNOWN_TOOLS: &[&str] = &[FFMPEG, FFPROBE, THUMBSGENERATOR, LIVEPEER];

/// Configuration for a single external tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Tool name (e.g. "ffmpeg").
    pub name: String,
    /// Resolved path to the executable.
    pub path: PathBuf,
    /// Limit applied to helper invocations (probe, version check).
    #[serde(
        default = "default_timeout",
        with = "duration_secs",
        skip_serializing_if = "is_default_timeout"
    )]
    pub timeout: Duration,
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn is_default_timeout(d: &Duration) -> bool {
    *d == DEFAULT_TIMEOUT
}

/// Serde helpers to (de)serialize `Duration` as whole seconds.
mod duration_secs {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

/// Availability information for a tool, returned by [`ToolRegistry::check_all`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub available: bool,
    /// First line of the tool's version output, if it has one.
    pub version: Option<String>,
    pub path: Option<PathBuf>,
}

/// Registry holding discovered tool configurations.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolConfig>,
}

impl ToolRegistry {
    /// Discover tools by searching `PATH` (or using overrides from config).
    ///
    /// For each known tool, if the [`ToolsConfig`] supplies a custom path
    /// **and** that path exists, it is used directly. Otherwise
    /// [`which::which`] is used to locate the tool in `PATH`. Tools that are
    /// not found are omitted from the registry.
    pub fn discover(tools_config: &ToolsConfig) -> Self {
        let timeout = Duration::from_secs(tools_config.probe_timeout_secs);
        let mut tools = HashMap::new();

        for &name in KNOWN_TOOLS {
            let custom_path = match name {
                FFMPEG => tools_config.ffmpeg_path.as_deref(),
                FFPROBE => tools_config.ffprobe_path.as_deref(),
                THUMBSGENERATOR => tools_config.thumbsgenerator_path.as_deref(),
                LIVEPEER => tools_config.livepeer_path.as_deref(),
                _ => None,
            };

            let resolved = match custom_path {
                Some(p) if p.exists() => Some(p.to_path_buf()),
                Some(p) => {
                    tracing::warn!(tool = name, path = %p.display(), "configured path does not exist, searching PATH");
                    which::which(name).ok()
                }
                None => which::which(name).ok(),
            };

            if let Some(path) = resolved {
                tracing::debug!(tool = name, path = %path.display(), "tool discovered");
                tools.insert(
                    name.to_string(),
                    ToolConfig {
                        name: name.to_string(),
                        path,
                        timeout,
                    },
                );
            }
        }

        Self { tools }
    }

    /// Register (or replace) a tool at an explicit path.
    pub fn with_tool(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.tools.insert(
            name.to_string(),
            ToolConfig {
                name: name.to_string(),
                path: path.into(),
                timeout: DEFAULT_TIMEOUT,
            },
        );
        self
    }

    /// Return a reference to the [`ToolConfig`] for the given tool, or an
    /// [`lf_core::Error::Tool`] if the tool was not found during discovery.
    pub fn require(&self, name: &str) -> lf_core::Result<&ToolConfig> {
        self.tools.get(name).ok_or_else(|| {
            lf_core::Error::tool(name, format!("{name} not found; is it installed and in PATH?"))
        })
    }

    /// Path to use when invoking `name`.
    ///
    /// Falls back to the bare name so that a missing tool surfaces as a
    /// spawn failure of the stage that needs it rather than at plan time.
    pub fn program(&self, name: &str) -> PathBuf {
        self.tools
            .get(name)
            .map(|t| t.path.clone())
            .unwrap_or_else(|| PathBuf::from(name))
    }

    /// Check all known tools and return availability information.
    pub async fn check_all(&self) -> Vec<ToolInfo> {
        let mut infos = Vec::with_capacity(KNOWN_TOOLS.len());
        for &name in KNOWN_TOOLS {
            let info = match self.tools.get(name) {
                Some(cfg) => ToolInfo {
                    name: name.to_string(),
                    available: true,
                    version: detect_version(name, &cfg.path).await,
                    path: Some(cfg.path.clone()),
                },
                None => ToolInfo {
                    name: name.to_string(),
                    available: false,
                    version: None,
                    path: None,
                },
            };
            infos.push(info);
        }
        infos
    }

    /// Iterate over all registered tool configs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ToolConfig)> {
        self.tools.iter()
    }
}

/// Run the tool's version flag and return the first line of stdout.
///
/// `thumbsgenerator` has no version flag and always yields `None`.
async fn detect_version(name: &str, path: &Path) -> Option<String> {
    let version_arg = match name {
        FFMPEG | FFPROBE | LIVEPEER => "-version",
        _ => return None,
    };

    let output = crate::command::ToolCommand::new(path.to_path_buf())
        .arg(version_arg)
        .timeout(Duration::from_secs(10))
        .execute()
        .await
        .ok()?;

    output
        .stdout
        .lines()
        .find(|l| !l.trim().is_empty())
        .map(|s| s.trim().to_string())
}
