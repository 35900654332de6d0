//! Runtime glue: configuration, user input, hooks, progress tracking,
//! telemetry, the top-level runner, and the audio splitter.

pub mod config;
pub mod hooks;
pub mod input;
pub mod progress;
pub mod runner;
pub mod split;
pub mod telemetry;
