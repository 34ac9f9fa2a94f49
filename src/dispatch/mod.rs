// src/dispatch/mod.rs

//! Message -> command dispatch.
//!
//! - [`entry`]: one configured binding and its guard.
//! - [`guard`]: per-entry admit/skip decision and run-state.
//! - [`handler`]: the admit -> run -> release sequence for one trigger.
//! - [`registrar`]: wires every entry's handler into a [`MessageBus`](crate::bus::MessageBus).

pub mod entry;
pub mod guard;
pub mod handler;
pub mod registrar;

pub use entry::Entry;
pub use guard::{Admission, ExecutionGuard, RunPermit, RunState};
pub use handler::{TriggerOutcome, handle_trigger};
pub use registrar::Registrar;
