//! Story Editor Service Library Crate
//!
//! Runs the editor agents against a text console: configuration, prompt
//! overrides, the console session host and the per-turn ReAct cycle. The
//! `editor` binary is a thin wrapper around this library.

pub mod config;
pub mod console;
pub mod cycle;
pub mod prompts;

#[cfg(test)]
mod testing;
