//! # lf-probe
//!
//! Media inspection types and the [`Prober`] seam.
//!
//! A probe describes a file's container and streams as reported by an
//! external inspection tool. The duration is kept in the tool's own string
//! form so that callers can choose between exact textual comparison and
//! numeric comparison; [`MediaProbe::duration_secs`] performs the decimal
//! parse.
//!
//! ## Quick start
//!
//! ```ignore
//! use lf_probe::Prober;
//!
//! let probe = prober.probe(Path::new("clip.mp4")).await?;
//! println!("{} streams, {:?}s", probe.stream_count, probe.duration);
//! ```

pub mod prober;
pub mod types;

pub use prober::Prober;
pub use types::{parse_duration, MediaProbe, StreamProbe};
