// src/exec/mod.rs

//! Process execution layer.
//!
//! This module runs the external command of an admitted trigger using
//! `tokio::process::Command` and reports the outcome back to the caller.
//!
//! - [`command`] holds the invocation description and outcome types.
//! - [`backend`] provides the `CommandRunner` trait, which tests can replace
//!   with a fake implementation.
//! - [`process`] is the production runner that spawns OS processes and
//!   collects their combined output.

pub mod backend;
pub mod command;
pub mod process;

pub use backend::CommandRunner;
pub use command::{CommandError, CommandOutput, CommandSpec, RunResult};
pub use process::ProcessRunner;
