use clap::{Parser, Subcommand, ValueEnum};
use lf_core::ExecutionKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ladderforge")]
#[command(author, version, about = "Transcoding pipeline orchestrator")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where renditions are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Local,
    Remote,
}

impl From<KindArg> for ExecutionKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Local => ExecutionKind::Local,
            KindArg::Remote => ExecutionKind::Remote,
        }
    }
}

/// Identifies the source files of a run below the bucket mount.
#[derive(clap::Args, Debug, Clone)]
pub struct ResourceArgs {
    /// Source file names inside `{tracker}/{directory}`
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Resource id (single file only; defaults to the file stem)
    #[arg(long)]
    pub id: Option<String>,

    /// Tracker namespace
    #[arg(long, default_value = "default")]
    pub tracker: String,

    /// Directory below the tracker
    #[arg(long, default_value = ".")]
    pub directory: String,

    /// Language tag for subtitle artifacts
    #[arg(long, default_value = "en")]
    pub language: String,

    /// Subtitle file to convert to WebVTT (single file only)
    #[arg(long)]
    pub subtitle: Option<PathBuf>,

    /// Produce renditions locally or hand off to a remote orchestrator
    #[arg(long, value_enum, default_value = "local")]
    pub kind: KindArg,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transcode one or more source files through the full pipeline
    Run {
        #[command(flatten)]
        resource: ResourceArgs,

        /// Show what would be done without executing
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the stage chain for a source without executing it
    Plan {
        #[command(flatten)]
        resource: ResourceArgs,

        /// Use this duration instead of probing the source
        #[arg(long)]
        duration: Option<String>,
    },

    /// Probe a media file and display information
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare the durations of a source and a rendition
    Verify {
        source: PathBuf,
        output: PathBuf,
    },

    /// Rename and hash an output directory into a manifest
    Assemble {
        dir: PathBuf,

        /// Resource id used for the renamed videos
        #[arg(long)]
        id: String,

        /// Directory to store `directory_{id}.json` in
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
