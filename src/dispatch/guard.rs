// src/dispatch/guard.rs

//! Per-entry admission control.
//!
//! Each [`Entry`](crate::dispatch::Entry) owns exactly one
//! [`ExecutionGuard`]. A trigger calls [`ExecutionGuard::try_begin_or_skip`];
//! on admission it receives a [`RunPermit`] that must be held for the whole
//! invocation. Releasing the permit (explicitly with [`RunPermit::end`] or by
//! dropping it) returns the slot.
//!
//! The lock only covers the state check/update. It is never held while the
//! command runs, so a long-running command does not stall anything except
//! the admission of further triggers for its own non-concurrent entry.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::trace;

/// Run-state of one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    /// At least one invocation is executing. `in_flight` is always >= 1 and
    /// can only exceed 1 for entries that allow concurrent runs.
    Running { in_flight: usize },
}

/// Result of an admission attempt.
#[derive(Debug)]
pub enum Admission<'a> {
    Admitted(RunPermit<'a>),
    /// The entry is non-concurrent and already running; the trigger is dropped.
    Skipped,
}

impl Admission<'_> {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted(_))
    }
}

#[derive(Debug)]
pub struct ExecutionGuard {
    allow_concurrent: bool,
    state: Mutex<RunState>,
}

impl ExecutionGuard {
    pub fn new(allow_concurrent: bool) -> Self {
        Self {
            allow_concurrent,
            state: Mutex::new(RunState::Idle),
        }
    }

    pub fn allow_concurrent(&self) -> bool {
        self.allow_concurrent
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> RunState {
        *self.lock()
    }

    pub fn is_executing(&self) -> bool {
        matches!(self.state(), RunState::Running { .. })
    }

    /// Decide whether a new trigger may start an invocation.
    ///
    /// The check and the transition to `Running` happen under one lock
    /// acquisition; the lock is released before returning on both paths.
    pub fn try_begin_or_skip(&self) -> Admission<'_> {
        let mut state = self.lock();

        let next = match *state {
            RunState::Running { .. } if !self.allow_concurrent => {
                trace!("admission refused; entry already running");
                return Admission::Skipped;
            }
            RunState::Running { in_flight } => RunState::Running {
                in_flight: in_flight + 1,
            },
            RunState::Idle => RunState::Running { in_flight: 1 },
        };
        *state = next;
        drop(state);

        Admission::Admitted(RunPermit { guard: self })
    }

    /// Release one in-flight slot. Only reachable through `RunPermit`, so it
    /// runs exactly once per admission.
    fn end(&self) {
        let mut state = self.lock();
        *state = match *state {
            RunState::Running { in_flight } if in_flight > 1 => RunState::Running {
                in_flight: in_flight - 1,
            },
            _ => RunState::Idle,
        };
    }

    // A panic elsewhere cannot leave `RunState` half-written, so a poisoned
    // lock still holds a usable value.
    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Proof of admission for one invocation.
#[derive(Debug)]
#[must_use = "dropping the permit immediately ends the invocation"]
pub struct RunPermit<'a> {
    guard: &'a ExecutionGuard,
}

impl RunPermit<'_> {
    /// Mark the invocation as finished.
    pub fn end(self) {
        drop(self);
    }
}

impl Drop for RunPermit<'_> {
    fn drop(&mut self) {
        self.guard.end();
    }
}
