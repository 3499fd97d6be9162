//! FFprobe-based [`lf_probe::Prober`] implementation.
//!
//! Shells out to `ffprobe -v quiet -print_format json -show_format -show_streams`
//! and maps the JSON output into [`lf_probe::MediaProbe`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use lf_probe::{MediaProbe, Prober, StreamProbe};
use serde::Deserialize;

use crate::command::ToolCommand;
use crate::tools::{ToolRegistry, FFPROBE};

/// A prober backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    ffprobe_path: PathBuf,
    timeout: Duration,
}

impl FfprobeProber {
    /// Create a new prober using the given ffprobe path.
    pub fn new(ffprobe_path: PathBuf) -> Self {
        Self {
            ffprobe_path,
            timeout: Duration::from_secs(300),
        }
    }

    /// Create a prober from the registry entry, falling back to `PATH`
    /// lookup at spawn time when ffprobe was not discovered.
    pub fn from_registry(tools: &ToolRegistry) -> Self {
        match tools.require(FFPROBE) {
            Ok(cfg) => Self {
                ffprobe_path: cfg.path.clone(),
                timeout: cfg.timeout,
            },
            Err(_) => Self::new(PathBuf::from(FFPROBE)),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Prober for FfprobeProber {
    fn name(&self) -> &'static str {
        "ffprobe"
    }

    async fn probe(&self, path: &Path) -> lf_core::Result<MediaProbe> {
        let mut cmd = ToolCommand::new(self.ffprobe_path.clone());
        cmd.args([
            "-v", "quiet",
            "-print_format", "json",
            "-show_format",
            "-show_streams",
        ]);
        cmd.path_arg(path);
        cmd.timeout(self.timeout);

        tracing::debug!(file = %path.display(), "probing");

        let output = cmd
            .execute()
            .await
            .map_err(|e| lf_core::Error::Probe(format!("{}: {e}", path.display())))?;

        parse_ffprobe_json(path, &output.stdout)
    }
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    duration: Option<String>,
    nb_streams: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Decode ffprobe's JSON into a [`MediaProbe`].
///
/// Output without a `format` object does not match the expected schema and
/// is a probe error.
pub fn parse_ffprobe_json(path: &Path, json: &str) -> lf_core::Result<MediaProbe> {
    let ff: FfprobeOutput = serde_json::from_str(json).map_err(|e| {
        lf_core::Error::Probe(format!("ffprobe JSON parse error for {}: {e}", path.display()))
    })?;

    let streams: Vec<StreamProbe> = ff
        .streams
        .into_iter()
        .map(|s| StreamProbe {
            codec_type: s.codec_type,
            codec_name: s.codec_name,
            width: s.width,
            height: s.height,
            duration: s.duration,
        })
        .collect();

    let stream_count = ff
        .format
        .nb_streams
        .unwrap_or_else(|| u32::try_from(streams.len()).unwrap_or(u32::MAX));

    Ok(MediaProbe {
        file_path: path.to_path_buf(),
        duration: ff.format.duration,
        format_name: ff.format.format_name.unwrap_or_default(),
        stream_count,
        streams,
    })
}
