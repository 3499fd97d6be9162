//! Ladderforge - transcoding pipeline orchestrator
//!
//! This library crate exposes the batch runner and logging setup for
//! integration testing.

pub mod logging;
pub mod processor;
