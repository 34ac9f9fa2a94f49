use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Notify, Semaphore};
use mqtt_exec::exec::{CommandError, CommandOutput, CommandRunner, CommandSpec, RunResult};

/// What every run of a `FakeRunner` resolves to.
#[derive(Debug, Clone)]
pub enum FakeBehaviour {
    Succeed(Vec<u8>),
    Exit(i32, Vec<u8>),
    FailToSpawn,
}

/// A runner that never touches the OS:
/// - records every spec it was asked to run
/// - tracks how many runs overlap
/// - optionally holds each run open until the test calls `release`.
pub struct FakeRunner {
    behaviour: FakeBehaviour,
    held: bool,
    gate: Semaphore,
    calls: Mutex<Vec<CommandSpec>>,
    started: Notify,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeRunner {
    pub fn new(behaviour: FakeBehaviour) -> Self {
        Self {
            behaviour,
            held: false,
            gate: Semaphore::new(0),
            calls: Mutex::new(Vec::new()),
            started: Notify::new(),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(FakeBehaviour::Succeed(Vec::new()))
    }

    /// Every run blocks until `release` hands it a permit.
    pub fn held(mut self) -> Self {
        self.held = true;
        self
    }

    /// Let `n` held runs finish.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn specs(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Wait until at least `n` runs have started.
    pub async fn wait_for_calls(&self, n: usize) {
        loop {
            let notified = self.started.notified();
            if self.calls() >= n {
                return;
            }
            notified.await;
        }
    }

    fn outcome(&self) -> RunResult {
        match &self.behaviour {
            FakeBehaviour::Succeed(output) => Ok(CommandOutput {
                output: output.clone(),
            }),
            FakeBehaviour::Exit(code, output) => Err(CommandError::Exited {
                code: Some(*code),
                output: output.clone(),
            }),
            FakeBehaviour::FailToSpawn => Err(CommandError::Spawn {
                program: "fake".to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "fake runner: no such executable"),
            }),
        }
    }
}

impl CommandRunner for FakeRunner {
    fn run<'a>(
        &'a self,
        spec: &'a CommandSpec,
    ) -> Pin<Box<dyn Future<Output = RunResult> + Send + 'a>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(spec.clone());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.started.notify_waiters();

            if self.held {
                self.gate
                    .acquire()
                    .await
                    .expect("fake runner gate closed")
                    .forget();
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.outcome()
        })
    }
}
