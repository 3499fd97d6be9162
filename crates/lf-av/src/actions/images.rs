//! Poster frame, animated WebP poster and thumbnail sprite sheet.

use std::path::{Path, PathBuf};

use super::{ffmpeg_prelude, path_str, ToolAction};
use crate::tools::{FFMPEG, THUMBSGENERATOR};

/// Sprite sampling interval in seconds.
pub const SPRITE_INTERVAL_SECS: u32 = 5;
/// Sprite cell width in pixels.
pub const SPRITE_CELL_WIDTH: u32 = 126;
/// Sprite cell height in pixels.
pub const SPRITE_CELL_HEIGHT: u32 = 73;

/// Grab one full-quality frame at `timestamp` (`HH:MM:SS`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosterFrame {
    pub input: PathBuf,
    pub output: PathBuf,
    pub timestamp: String,
}

impl ToolAction for PosterFrame {
    fn tool(&self) -> &'static str {
        FFMPEG
    }

    fn args(&self) -> Vec<String> {
        let mut args = ffmpeg_prelude();
        args.extend([
            "-ss".into(),
            self.timestamp.clone(),
            "-i".into(),
            path_str(&self.input),
            "-vframes".into(),
            "1".into(),
            "-q:v".into(),
            "1".into(),
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

/// Animated WebP covering the opening of the video up to `duration`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebpPoster {
    pub input: PathBuf,
    pub output: PathBuf,
    pub duration: String,
}

impl ToolAction for WebpPoster {
    fn tool(&self) -> &'static str {
        FFMPEG
    }

    fn args(&self) -> Vec<String> {
        let mut args = ffmpeg_prelude();
        args.extend([
            "-i".into(),
            path_str(&self.input),
            "-lossless".into(),
            "0".into(),
            "-ss".into(),
            "00:00:00".into(),
            "-t".into(),
            self.duration.clone(),
            "-s".into(),
            "384x182".into(),
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

/// Sprite sheet of thumbnails sampled every [`SPRITE_INTERVAL_SECS`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailSprite {
    pub input: PathBuf,
    pub output: PathBuf,
    pub columns: i64,
}

impl ToolAction for ThumbnailSprite {
    fn tool(&self) -> &'static str {
        THUMBSGENERATOR
    }

    fn args(&self) -> Vec<String> {
        vec![
            path_str(&self.input),
            SPRITE_INTERVAL_SECS.to_string(),
            SPRITE_CELL_WIDTH.to_string(),
            SPRITE_CELL_HEIGHT.to_string(),
            self.columns.to_string(),
            path_str(&self.output),
        ]
    }

    fn input(&self) -> &Path {
        &self.input
    }

    fn output(&self) -> &Path {
        &self.output
    }
}
