// src/lib.rs
// Library interface for certsweep
pub mod checker;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod inspect;
pub mod metadata;
pub mod orchestrator;
pub mod output;
pub mod probe;
pub mod progress;
pub mod report;
pub mod types;
