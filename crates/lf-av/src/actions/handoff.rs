//! Single-pass handoff of a master to the remote transcoding service.
//!
//! The `livepeer` node pulls the master, applies the ladder described by a
//! transcoding-profile file, and records every rendition into a directory.

use std::path::{Path, PathBuf};

use super::{path_str, ToolAction};
use crate::tools::LIVEPEER;

/// How the node reaches its orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandoffAddressing {
    /// A directly addressed orchestrator (`host:port`).
    Orchestrator(String),
    /// Orchestrator discovery through a webhook, optionally authenticated.
    Webhook { url: String, api_key: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteHandoff {
    pub input: PathBuf,
    /// Directory the node records renditions into.
    pub recording_dir: PathBuf,
    /// Transcoding-profile file.
    pub profile: String,
    pub addressing: HandoffAddressing,
    /// Stream tag; the resource id.
    pub stream_name: String,
}

impl ToolAction for RemoteHandoff {
    fn tool(&self) -> &'static str {
        LIVEPEER
    }

    fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-pull".into(),
            path_str(&self.input),
            "-recordingDir".into(),
            path_str(&self.recording_dir),
            "-transcodingOptions".into(),
            self.profile.clone(),
        ];
        match &self.addressing {
            HandoffAddressing::Orchestrator(addr) => {
                args.push("-orchAddr".into());
                args.push(addr.clone());
            }
            HandoffAddressing::Webhook { url, api_key } => {
                args.push("-orchWebhookUrl".into());
                args.push(url.clone());
                if let Some(key) = api_key {
                    args.push("-apiKey".into());
                    args.push(key.clone());
                }
            }
        }
        args.extend([
            "-streamName".into(),
            self.stream_name.clone(),
            "-v".into(),
            "99".into(),
        ]);
        args
    }

    fn input(&self) -> &Path {
        &self.input
    }

    fn output(&self) -> &Path {
        &self.recording_dir
    }
}
