//! Runs a CLI invocation as a child process.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use encoding_rs::Encoding;
use tokio::io::AsyncWriteExt;
use tokio::process::{ChildStdin, Command};

use super::builder::Invocation;
use super::error::{CommandError, CommandResult};

/// Hides the console window of spawned CLIs on Windows.
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Captured output of one CLI run.
#[derive(Debug, Clone, Default)]
pub struct ExecutionResult {
    /// Decoded stdout followed by decoded stderr, without `\r`.
    pub output: String,
    /// Exit status, `None` when nothing was run.
    pub status: Option<ExitStatus>,
}

/// Something that can execute an invocation.
///
/// The process-backed implementation is [`ProcessRunner`].
#[async_trait]
pub trait Runner: Send + Sync {
    /// Run the invocation to completion and return its merged output.
    async fn run(&self, invocation: &Invocation) -> CommandResult<ExecutionResult>;
}

/// Spawns the CLI, feeds it the query and collects everything it prints.
///
/// Output is fully buffered: stdout and stderr are drained concurrently while
/// the query is written, and the result holds all of stdout followed by all
/// of stderr.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill the CLI if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

#[async_trait]
impl Runner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> CommandResult<ExecutionResult> {
        if invocation.input().is_empty() {
            tracing::debug!("empty query, nothing to run");
            return Ok(ExecutionResult::default());
        }

        tracing::info!(program = invocation.program(), "running SQL command");

        let mut command = Command::new(invocation.program());
        command
            .args(invocation.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(windows)]
        command.creation_flags(CREATE_NO_WINDOW);

        let mut child = command.spawn().map_err(|source| CommandError::SpawnFailed {
            program: invocation.program().to_string(),
            source,
        })?;

        let (payload, _, _) = invocation.encoding().encode(invocation.input());
        let payload = payload.into_owned();
        let stdin = child.stdin.take();

        let exchange = async move {
            let (written, output) =
                tokio::join!(write_input(stdin, payload), child.wait_with_output());
            written.and(output.map_err(CommandError::ReadFailed))
        };

        // Dropping `exchange` on timeout drops the child, which kills it
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .map_err(|_| CommandError::Timeout(limit))??,
            None => exchange.await?,
        };

        if !output.status.success() {
            tracing::warn!(status = %output.status, program = invocation.program(), "CLI exited with failure");
        }

        let mut text = decode(invocation.encoding(), &output.stdout);
        text.push_str(&decode(invocation.encoding(), &output.stderr));

        Ok(ExecutionResult {
            output: text,
            status: Some(output.status),
        })
    }
}

/// Write the query and close stdin.
async fn write_input(stdin: Option<ChildStdin>, payload: Vec<u8>) -> CommandResult<()> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };

    match stdin.write_all(&payload).await {
        Ok(()) => {}
        // The CLI exited without reading everything; its output says why
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            tracing::debug!("CLI closed stdin early");
            return Ok(());
        }
        Err(e) => return Err(CommandError::WriteFailed(e)),
    }

    stdin.flush().await.or_else(|e| match e.kind() {
        io::ErrorKind::BrokenPipe => Ok(()),
        _ => Err(CommandError::WriteFailed(e)),
    })
}

/// Decode with replacement characters for invalid input and drop `\r`.
fn decode(encoding: &'static Encoding, bytes: &[u8]) -> String {
    let (text, _) = encoding.decode_without_bom_handling(bytes);
    text.replace('\r', "")
}
