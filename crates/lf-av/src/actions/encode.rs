//! H.264 rendition encoding.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{ffmpeg_prelude, path_str, ToolAction};
use crate::tools::FFMPEG;

/// Fixed encoder parameters for one rendition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeParams {
    /// Output height; width follows the aspect ratio, rounded to even.
    pub height: u32,
    pub bitrate_kbps: u32,
    pub max_bitrate_kbps: Option<u32>,
    pub buffer_size_kbps: Option<u32>,
    pub gop_size: u32,
    pub crf: u8,
}

/// Encode `input` to one rendition at `output`, audio dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeRendition {
    pub input: PathBuf,
    pub output: PathBuf,
    pub params: EncodeParams,
}

impl ToolAction for EncodeRendition {
    fn tool(&self) -> &'static str {
        FFMPEG
    }

    fn args(&self) -> Vec<String> {
        let p = &self.params;
        let mut args = ffmpeg_prelude();
        args.extend([
            "-i".into(),
            path_str(&self.input),
            "-movflags".into(),
            "faststart".into(),
            "-vf".into(),
            format!("scale=-2:{}", p.height),
            "-c:v".into(),
            "h264".into(),
            "-profile:v".into(),
            "main".into(),
            "-crf".into(),
            p.crf.to_string(),
            "-sc_threshold".into(),
            "0".into(),
            "-g".into(),
            p.gop_size.to_string(),
            "-keyint_min".into(),
            p.gop_size.to_string(),
            "-b:v".into(),
            format!("{}k", p.bitrate_kbps),
        ]);
        if let Some(max) = p.max_bitrate_kbps {
            args.push("-maxrate".into());
            args.push(format!("{max}k"));
        }
        if let Some(buf) = p.buffer_size_kbps {
            args.push("-bufsize".into());
            args.push(format!("{buf}k"));
        }
        args.push("-an".into());
        args.push(path_str(&self.output));
        args
    }

    fn input(&self) -> &Path {
        &self.input
    }

    fn output(&self) -> &Path {
        &self.output
    }
}
