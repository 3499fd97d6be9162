//! Probe backend that shells out to `ffprobe`.
//!
//! [`FfprobeProber`] implements the [`lf_probe::Prober`] trait.

pub mod ffprobe;

pub use self::ffprobe::FfprobeProber;
