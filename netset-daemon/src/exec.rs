/*!
 * Command Executor / Run Queue
 * Serializes every external process invocation and tracks the in-flight
 * command for shutdown coordination.
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error};

use crate::error::{Error, Result};

/// Default ceiling for [`CommandExecutor::wait_for_drain`].
pub const DRAIN_TIMEOUT: Duration = Duration::from_millis(4000);

/// How often the drain loop re-checks the running-command slot.
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Raw result of one external process run.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// The sole OS-process boundary the executor depends on. Production code
/// shells through `sh -c`; tests inject scripted runners.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command_line: &str) -> std::io::Result<ProcessOutput>;
}

/// Default runner backed by `tokio::process`.
pub struct ShellRunner;

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command_line: &str) -> std::io::Result<ProcessOutput> {
        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command_line)
            .output()
            .await?;

        Ok(ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}

/// Runs external commands one at a time.
///
/// The network tools this daemon drives (`nmcli`, `wpa_cli`, `dhcpcd`, ...)
/// mutate shared OS state and are not safe to run concurrently, so all calls
/// are funneled through one instance. The currently running command line and
/// the monotonic "stopping" flag are the only shared mutable state.
pub struct CommandExecutor {
    runner: Box<dyn CommandRunner>,
    run_lock: Mutex<()>,
    running: RwLock<Option<String>>,
    stopping: AtomicBool,
}

impl CommandExecutor {
    pub fn new(runner: Box<dyn CommandRunner>) -> Self {
        Self {
            runner,
            run_lock: Mutex::new(()),
            running: RwLock::new(None),
            stopping: AtomicBool::new(false),
        }
    }

    /// Executor shelling out through `sh -c`.
    pub fn shell() -> Self {
        Self::new(Box::new(ShellRunner))
    }

    /// Run `command_line` to completion and return its trimmed stdout.
    ///
    /// After [`begin_shutdown`](Self::begin_shutdown) this resolves
    /// immediately with an empty string and never touches the runner: late
    /// requests during shutdown are silently dropped, not failed. Calls are
    /// serialized FIFO; a second call does not start its process until the
    /// previous one has settled.
    pub async fn execute(&self, command_line: &str) -> Result<String> {
        if self.stopping.load(Ordering::SeqCst) {
            return Ok(String::new());
        }

        let _serialized = self.run_lock.lock().await;
        *self.running.write().await = Some(command_line.to_string());
        let outcome = self.runner.run(command_line).await;
        *self.running.write().await = None;

        let output = match outcome {
            Ok(output) => output,
            Err(e) => {
                error!("Cannot execute \"{}\": {e}", redact(command_line));
                return Err(Error::Execution(e.to_string()));
            }
        };

        let stderr = output.stderr.trim();
        if output.exit_code != 0 || !stderr.is_empty() {
            let diagnostic = if stderr.is_empty() {
                format!("exit code {}", output.exit_code)
            } else {
                stderr.to_string()
            };
            error!("Cannot execute \"{}\": {diagnostic}", redact(command_line));
            return Err(Error::Execution(diagnostic));
        }

        let stdout = output.stdout.trim().to_string();
        debug!("Result for \"{command_line}\": {stdout}");
        Ok(stdout)
    }

    /// Same contract as [`execute`](Self::execute), prefixed with `sudo`.
    pub async fn sudo(&self, command_line: &str) -> Result<String> {
        self.execute(&format!("sudo {command_line}")).await
    }

    /// Stop accepting new commands. Monotonic; never reset.
    pub fn begin_shutdown(&self) {
        self.stopping.store(true, Ordering::SeqCst);
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    /// The command line currently in flight, if any.
    pub async fn current_command(&self) -> Option<String> {
        self.running.read().await.clone()
    }

    /// Poll the running-command slot every 200ms until it is empty or
    /// `timeout` elapses. Returns whether the deadline was reached; a
    /// command that finishes just past the deadline is still reported as a
    /// timeout.
    ///
    /// Call [`begin_shutdown`](Self::begin_shutdown) first so no new
    /// commands enter the slot while draining.
    pub async fn wait_for_drain(&self, timeout: Duration) -> bool {
        let started = tokio::time::Instant::now();
        while self.running.read().await.is_some() && started.elapsed() < timeout {
            tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
        }
        started.elapsed() >= timeout
    }
}

/// Mask secret arguments before a command line reaches an error-level log.
/// Covers nmcli's `password <pw>` and wpa_cli's `psk <pw>`; masking stops at
/// `ifname` so the rest of the nmcli connect line stays readable.
fn redact(command_line: &str) -> String {
    let mut tokens: Vec<&str> = Vec::new();
    let mut masking = false;
    for token in command_line.split_whitespace() {
        if masking && token != "ifname" {
            if tokens.last() != Some(&"****") {
                tokens.push("****");
            }
            continue;
        }
        masking = token == "password" || token == "psk";
        tokens.push(token);
    }
    tokens.join(" ")
}
