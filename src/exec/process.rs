// src/exec/process.rs

//! Real process runner backed by `tokio::process`.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::debug;

use super::backend::CommandRunner;
use super::command::{CommandError, CommandOutput, CommandSpec, RunResult};

const READ_CHUNK: usize = 4096;

/// Spawns the command directly (no shell) and waits for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for ProcessRunner {
    fn run<'a>(
        &'a self,
        spec: &'a CommandSpec,
    ) -> Pin<Box<dyn Future<Output = RunResult> + Send + 'a>> {
        Box::pin(run_process(spec))
    }
}

async fn run_process(spec: &CommandSpec) -> RunResult {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = &spec.working_directory {
        cmd.current_dir(dir);
    }

    let mut child = cmd.spawn().map_err(|source| CommandError::Spawn {
        program: spec.program.clone(),
        source,
    })?;
    debug!(pid = child.id(), command = %spec, "process spawned");

    let (tx, mut rx) = mpsc::unbounded_channel();
    if let Some(stdout) = child.stdout.take() {
        forward_chunks(stdout, tx.clone());
    }
    if let Some(stderr) = child.stderr.take() {
        forward_chunks(stderr, tx.clone());
    }
    drop(tx);

    // Both pipes feed one channel so the buffer keeps arrival order, the
    // same way a shared stdout/stderr pipe would.
    let mut output = Vec::new();
    let mut read_error = None;
    while let Some(chunk) = rx.recv().await {
        match chunk {
            Ok(bytes) => output.extend_from_slice(&bytes),
            Err(err) => read_error = Some(err),
        }
    }

    let status = match child.wait().await {
        Ok(status) => status,
        Err(source) => return Err(CommandError::Io { source, output }),
    };

    if let Some(source) = read_error {
        return Err(CommandError::Io { source, output });
    }

    if status.success() {
        Ok(CommandOutput { output })
    } else {
        Err(CommandError::Exited {
            code: status.code(),
            output,
        })
    }
}

fn forward_chunks<R>(mut reader: R, tx: mpsc::UnboundedSender<io::Result<Vec<u8>>>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(Ok(buf[..n].to_vec())).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    let _ = tx.send(Err(err));
                    break;
                }
            }
        }
    });
}
