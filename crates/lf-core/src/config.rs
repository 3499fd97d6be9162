//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries all
//! sub-configs for storage, tools, the pipeline, remote handoff and logging.
//! Every section defaults sensibly so a completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub tools: ToolsConfig,
    pub pipeline: PipelineConfig,
    pub remote: RemoteConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    ///
    /// This is intentionally string-based so the caller can read the file
    /// however it sees fit (async, embedded, etc.).
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Load configuration strictly: a missing or malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.storage.bucket_mount.as_os_str().is_empty() {
            warnings.push(
                "storage.bucket_mount is empty; paths resolve relative to the working directory"
                    .into(),
            );
        }

        match self.remote.mode {
            RemoteMode::Local if self.remote.orchestrator_addr.is_none() => {
                warnings.push(
                    "remote.mode is local but remote.orchestrator_addr is not set".into(),
                );
            }
            RemoteMode::Remote if self.remote.webhook_url.is_none() => {
                warnings.push("remote.mode is remote but remote.webhook_url is not set".into());
            }
            _ => {}
        }

        if self.pipeline.min_artifacts == 0 {
            warnings
                .push("pipeline.min_artifacts is 0; the artifact count gate is disabled".into());
        }

        if self.pipeline.verification == VerificationMode::Tolerance
            && self.pipeline.tolerance_secs <= 0.0
        {
            warnings.push(format!(
                "pipeline.tolerance_secs must be positive (got {})",
                self.pipeline.tolerance_secs
            ));
        }

        if self.pipeline.output_poll_interval() > self.pipeline.output_wait_timeout() {
            warnings.push(
                "pipeline.output_poll_interval_ms exceeds output_wait_timeout_secs; handoff output is checked only once".into(),
            );
        }

        if self.pipeline.concurrency == 0 {
            warnings.push("pipeline.concurrency is 0; batch runs will use 1".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Where source uploads and outputs live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root under which `{tracker}/{sourceDirectory}` directories live.
    pub bucket_mount: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket_mount: PathBuf::from("/mnt/bucket"),
        }
    }
}

/// Paths to external CLI tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
    pub thumbsgenerator_path: Option<PathBuf>,
    pub livepeer_path: Option<PathBuf>,
    /// Upper bound for a single probe invocation.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
}

fn default_probe_timeout() -> u64 {
    300
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            thumbsgenerator_path: None,
            livepeer_path: None,
            probe_timeout_secs: default_probe_timeout(),
        }
    }
}

/// How a produced rendition's duration is compared to its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationMode {
    /// Byte-for-byte equality of the probe tool's duration strings.
    Exact,
    /// Numeric comparison within `tolerance_secs`.
    #[default]
    Tolerance,
}

/// Pipeline policy switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Encode the 90p/144p preview pair ahead of the ladder.
    pub preview_tier: bool,
    /// Generate the thumbnail sprite sheet.
    #[serde(default = "default_true")]
    pub thumbs_preview: bool,
    /// Generate an animated WebP poster next to the JPEG one.
    pub webp_poster: bool,
    /// Convert the resource's subtitle file to WebVTT when one is given.
    pub subtitles: bool,
    /// Minimum number of video files required before publishing.
    #[serde(default = "default_min_artifacts")]
    pub min_artifacts: usize,
    pub verification: VerificationMode,
    #[serde(default = "default_tolerance")]
    pub tolerance_secs: f64,
    /// Upper bound on waiting for the output directory to appear.
    #[serde(default = "default_output_wait")]
    pub output_wait_timeout_secs: u64,
    #[serde(default = "default_poll_interval")]
    pub output_poll_interval_ms: u64,
    /// Maximum number of resources processed at once in a batch.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_true() -> bool {
    true
}
fn default_min_artifacts() -> usize {
    5
}
fn default_tolerance() -> f64 {
    0.5
}
fn default_output_wait() -> u64 {
    30
}
fn default_poll_interval() -> u64 {
    500
}
fn default_concurrency() -> usize {
    2
}

impl PipelineConfig {
    pub fn output_wait_timeout(&self) -> Duration {
        Duration::from_secs(self.output_wait_timeout_secs)
    }

    pub fn output_poll_interval(&self) -> Duration {
        Duration::from_millis(self.output_poll_interval_ms)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            preview_tier: false,
            thumbs_preview: default_true(),
            webp_poster: false,
            subtitles: false,
            min_artifacts: default_min_artifacts(),
            verification: VerificationMode::default(),
            tolerance_secs: default_tolerance(),
            output_wait_timeout_secs: default_output_wait(),
            output_poll_interval_ms: default_poll_interval(),
            concurrency: default_concurrency(),
        }
    }
}

/// How the remote transcoding service locates its orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteMode {
    /// Address a known orchestrator directly.
    #[default]
    Local,
    /// Discover orchestrators through a webhook.
    Remote,
}

/// Remote rendition handoff settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub mode: RemoteMode,
    pub orchestrator_addr: Option<String>,
    pub webhook_url: Option<String>,
    pub api_key: Option<String>,
    /// Transcoding-profile file handed to the remote service.
    #[serde(default = "default_profile")]
    pub profile: String,
}

fn default_profile() -> String {
    "ultra.json".into()
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            mode: RemoteMode::default(),
            orchestrator_addr: None,
            webhook_url: None,
            api_key: None,
            profile: default_profile(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// When set, logs are also written to daily-rotated files here.
    pub directory: Option<PathBuf>,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

fn default_file_prefix() -> String {
    "ladderforge".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            file_prefix: default_file_prefix(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        let mut cfg = Config::default();
        cfg.remote.orchestrator_addr = Some("127.0.0.1:8935".into());
        cfg
    }

    #[test]
    fn default_config_values() {
        let cfg = Config::default();
        assert_eq!(cfg.storage.bucket_mount, PathBuf::from("/mnt/bucket"));
        assert_eq!(cfg.tools.probe_timeout_secs, 300);
        assert!(!cfg.pipeline.preview_tier);
        assert!(cfg.pipeline.thumbs_preview);
        assert_eq!(cfg.pipeline.min_artifacts, 5);
        assert_eq!(cfg.pipeline.verification, VerificationMode::Tolerance);
        assert_eq!(cfg.pipeline.output_wait_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.remote.profile, "ultra.json");
        assert_eq!(cfg.logging.file_prefix, "ladderforge");
    }

    #[test]
    fn configured_orchestrator_has_no_warnings() {
        let warnings = valid().validate();
        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
    }

    #[test]
    fn local_mode_without_orchestrator_warns() {
        let warnings = Config::default().validate();
        assert!(warnings.iter().any(|w| w.contains("orchestrator_addr")));
    }

    #[test]
    fn remote_mode_without_webhook_warns() {
        let mut cfg = valid();
        cfg.remote.mode = RemoteMode::Remote;
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.contains("webhook_url")));
    }

    #[test]
    fn zero_min_artifacts_warns() {
        let mut cfg = valid();
        cfg.pipeline.min_artifacts = 0;
        assert!(cfg.validate().iter().any(|w| w.contains("min_artifacts")));
    }

    #[test]
    fn non_positive_tolerance_warns() {
        let mut cfg = valid();
        cfg.pipeline.tolerance_secs = 0.0;
        assert!(cfg.validate().iter().any(|w| w.contains("tolerance_secs")));

        cfg.pipeline.verification = VerificationMode::Exact;
        assert!(!cfg.validate().iter().any(|w| w.contains("tolerance_secs")));
    }

    #[test]
    fn poll_interval_longer_than_timeout_warns() {
        let mut cfg = valid();
        cfg.pipeline.output_wait_timeout_secs = 1;
        cfg.pipeline.output_poll_interval_ms = 5_000;
        assert!(cfg.validate().iter().any(|w| w.contains("output_poll_interval_ms")));
    }

    #[test]
    fn parse_json_config() {
        let json = r#"{
            "storage": {"bucket_mount": "/data"},
            "pipeline": {"preview_tier": true, "verification": "exact"},
            "remote": {"mode": "remote", "webhook_url": "http://hooks"}
        }"#;
        let cfg = Config::from_json(json).unwrap();
        assert_eq!(cfg.storage.bucket_mount, PathBuf::from("/data"));
        assert!(cfg.pipeline.preview_tier);
        assert_eq!(cfg.pipeline.verification, VerificationMode::Exact);
        assert_eq!(cfg.pipeline.min_artifacts, 5);
        assert_eq!(cfg.remote.mode, RemoteMode::Remote);
    }

    #[test]
    fn parse_empty_json_uses_defaults() {
        let cfg = Config::from_json("{}").unwrap();
        assert_eq!(cfg.storage.bucket_mount, PathBuf::from("/mnt/bucket"));
        assert!(cfg.pipeline.thumbs_preview);
    }

    #[test]
    fn parse_invalid_json_is_validation_error() {
        let err = Config::from_json("{").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn load_or_default_with_none() {
        let cfg = Config::load_or_default(None);
        assert_eq!(cfg.pipeline.min_artifacts, 5);
    }

    #[test]
    fn load_or_default_with_missing_file() {
        let cfg = Config::load_or_default(Some(Path::new("/nonexistent/config.json")));
        assert_eq!(cfg.pipeline.min_artifacts, 5);
    }

    #[test]
    fn strict_load_reports_missing_file() {
        let err = Config::load(Path::new("/nonexistent/config.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
