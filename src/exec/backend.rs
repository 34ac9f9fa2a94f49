// src/exec/backend.rs

//! Pluggable command runner abstraction.
//!
//! Dispatch talks to a `CommandRunner` instead of spawning processes itself.
//! Production uses [`ProcessRunner`](super::ProcessRunner); tests can provide
//! a runner that records invocations and controls when they finish.

use std::future::Future;
use std::pin::Pin;

use super::command::{CommandSpec, RunResult};

/// Executes one admitted invocation to completion.
///
/// Shared between every handler task, hence `&self` and `Sync`.
pub trait CommandRunner: Send + Sync {
    /// Run `spec` and resolve once the command has terminated.
    ///
    /// Implementations report spawn and exit failures through the returned
    /// `RunResult`; they must not panic on them.
    fn run<'a>(
        &'a self,
        spec: &'a CommandSpec,
    ) -> Pin<Box<dyn Future<Output = RunResult> + Send + 'a>>;
}
