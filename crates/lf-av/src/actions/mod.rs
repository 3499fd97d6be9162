//! Argument builders for every external stage command.
//!
//! Each action is a plain struct naming its input and output paths
//! explicitly. [`ToolAction`] turns it into a [`StageRequest`] that a
//! [`StageRunner`](crate::runner::StageRunner) can execute.

mod audio;
mod encode;
mod handoff;
mod images;
mod subtitles;

pub use audio::{ExtractAudio, RemoveAudio};
pub use encode::{EncodeParams, EncodeRendition};
pub use handoff::{HandoffAddressing, RemoteHandoff};
pub use images::{PosterFrame, ThumbnailSprite, WebpPoster};
pub use subtitles::ConvertSubtitles;

use std::path::Path;

use crate::runner::StageRequest;
use crate::tools::ToolRegistry;

/// A stage implemented by one external program invocation.
pub trait ToolAction {
    /// Registry name of the program (see [`crate::tools::KNOWN_TOOLS`]).
    fn tool(&self) -> &'static str;

    /// Arguments following the program name.
    fn args(&self) -> Vec<String>;

    fn input(&self) -> &Path;

    /// File or directory whose existence confirms the stage ran.
    fn output(&self) -> &Path;

    /// Resolve the program through `tools` and build a runnable request.
    fn request(&self, stage_name: &str, tools: &ToolRegistry) -> StageRequest {
        StageRequest {
            stage_name: stage_name.to_string(),
            program: tools.program(self.tool()),
            args: self.args(),
            input_path: self.input().to_path_buf(),
            output_path: self.output().to_path_buf(),
        }
    }
}

pub(crate) fn path_str(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

/// Leading flags shared by every ffmpeg invocation.
pub(crate) fn ffmpeg_prelude() -> Vec<String> {
    vec!["-hide_banner".into(), "-y".into()]
}
