//! Audio stripping and extraction.

use std::path::{Path, PathBuf};

use super::{ffmpeg_prelude, path_str, ToolAction};
use crate::tools::FFMPEG;

/// Stream-copy the source with the audio track dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveAudio {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl ToolAction for RemoveAudio {
    fn tool(&self) -> &'static str {
        FFMPEG
    }

    fn args(&self) -> Vec<String> {
        let mut args = ffmpeg_prelude();
        args.extend([
            "-i".into(),
            path_str(&self.input),
            "-c".into(),
            "copy".into(),
            "-an".into(),
            path_str(&self.output),
        ]);
        args
    }

    fn input(&self) -> &Path {
        &self.input
    }

    fn output(&self) -> &Path {
        &self.output
    }
}

/// Stream-copy the audio track into an `.m4a`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractAudio {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl ToolAction for ExtractAudio {
    fn tool(&self) -> &'static str {
        FFMPEG
    }

    fn args(&self) -> Vec<String> {
        let mut args = ffmpeg_prelude();
        args.extend([
            "-i".into(),
            path_str(&self.input),
            "-vn".into(),
            "-acodec".into(),
            "copy".into(),
            path_str(&self.output),
        ]);
        args
    }

    fn input(&self) -> &Path {
        &self.input
    }

    fn output(&self) -> &Path {
        &self.output
    }
}
