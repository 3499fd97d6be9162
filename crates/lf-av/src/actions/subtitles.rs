//! Subtitle conversion to WebVTT.

use std::path::{Path, PathBuf};

use super::{ffmpeg_prelude, path_str, ToolAction};
use crate::tools::FFMPEG;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertSubtitles {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl ToolAction for ConvertSubtitles {
    fn tool(&self) -> &'static str {
        FFMPEG
    }

    fn args(&self) -> Vec<String> {
        let mut args = ffmpeg_prelude();
        args.extend([
            "-i".into(),
            path_str(&self.input),
            "-f".into(),
            "webvtt".into(),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webvtt_format_flag() {
        let action = ConvertSubtitles {
            input: "/subs/r1.srt".into(),
            output: "/w/o/r1_en.vtt".into(),
        };
        assert_eq!(
            action.args(),
            vec!["-hide_banner", "-y", "-i", "/subs/r1.srt", "-f", "webvtt", "/w/o/r1_en.vtt"]
        );
    }
}
