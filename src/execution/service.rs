use crate::agents::auth::output_indicates_auth_failure;
use crate::agents::AgentDescriptor;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// How long to wait for output readers once the process has exited
const EXIT_DRAIN: Duration = Duration::from_secs(2);

/// How long to wait for output readers after killing the process. A
/// grandchild may still hold the pipes open.
const KILL_DRAIN: Duration = Duration::from_millis(100);

const GENERIC_AUTH_HINT: &str =
    "The agent CLI rejected the request for missing credentials. Log in to it and try again.";

#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Defaults to the service's workspace root
    pub cwd: Option<PathBuf>,
    /// Defaults to [`DEFAULT_TIMEOUT`]
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
    /// Agent being run, used for the login hint on auth failures
    pub agent: Option<Arc<AgentDescriptor>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandExecutionResult {
    pub success: bool,
    /// Captured stdout
    pub output: String,
    pub error: Option<String>,
    /// Absent on timeout, cancellation, termination and spawn failure
    pub exit_code: Option<i32>,
}

impl CommandExecutionResult {
    fn failed(output: String, error: String) -> Self {
        Self {
            success: false,
            output,
            error: Some(error),
            exit_code: None,
        }
    }
}

/// Runs agent command lines through the platform shell.
///
/// Every execution owns its timeout and cancellation wiring; the service
/// only keeps a kill switch per in-flight execution for [`kill_all`].
///
/// [`kill_all`]: ExecutionService::kill_all
#[derive(Debug, Clone)]
pub struct ExecutionService {
    workspace_root: PathBuf,
    running: Arc<Mutex<HashMap<Uuid, CancellationToken>>>,
}

/// Removes an execution from the registry when it finishes, however it ends
struct Registration {
    id: Uuid,
    running: Arc<Mutex<HashMap<Uuid, CancellationToken>>>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.running
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&self.id);
    }
}

enum Outcome {
    Exited(std::io::Result<std::process::ExitStatus>),
    TimedOut,
    Cancelled,
    Terminated,
}

impl ExecutionService {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            running: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Number of executions currently in flight
    pub fn running_count(&self) -> usize {
        self.running
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .len()
    }

    /// Terminate every in-flight execution. Returns how many were signalled.
    pub fn kill_all(&self) -> usize {
        let running = self.running.lock().unwrap_or_else(|p| p.into_inner());
        for token in running.values() {
            token.cancel();
        }
        if !running.is_empty() {
            tracing::info!("terminating {} running command(s)", running.len());
        }
        running.len()
    }

    fn register(&self) -> (Registration, CancellationToken) {
        let id = Uuid::new_v4();
        let kill = CancellationToken::new();
        self.running
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(id, kill.clone());
        (
            Registration {
                id,
                running: Arc::clone(&self.running),
            },
            kill,
        )
    }

    /// Run `command` through `sh -c` (or `cmd /C`) and capture its output.
    ///
    /// Never returns an error: spawn failures, non-zero exits, timeouts and
    /// cancellation all surface through the result's `error` text.
    pub async fn execute(&self, command: &str, options: ExecutionOptions) -> CommandExecutionResult {
        let cwd = options.cwd.as_deref().unwrap_or(&self.workspace_root);
        let timeout = options.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let (_registration, kill) = self.register();

        tracing::debug!("executing in {}: {}", cwd.display(), command);

        let mut child = match shell_command(command, cwd).spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!("failed to start command: {}", e);
                return CommandExecutionResult::failed(
                    String::new(),
                    format!("Failed to start command: {}", e),
                );
            }
        };

        let stdout = Arc::new(Mutex::new(Vec::new()));
        let stderr = Arc::new(Mutex::new(Vec::new()));
        let readers = [
            child.stdout.take().map(|pipe| spawn_reader(pipe, Arc::clone(&stdout))),
            child.stderr.take().map(|pipe| spawn_reader(pipe, Arc::clone(&stderr))),
        ];

        let outcome = tokio::select! {
            status = child.wait() => Outcome::Exited(status),
            _ = tokio::time::sleep(timeout) => Outcome::TimedOut,
            _ = cancelled(options.cancel.as_ref()) => Outcome::Cancelled,
            _ = kill.cancelled() => Outcome::Terminated,
        };

        let drain = match outcome {
            Outcome::Exited(_) => EXIT_DRAIN,
            _ => {
                stop(&mut child).await;
                KILL_DRAIN
            }
        };
        for reader in readers.into_iter().flatten() {
            finish_reader(reader, drain).await;
        }

        let stdout = take_text(&stdout);
        let stderr = take_text(&stderr);

        let mut result = match outcome {
            Outcome::Exited(Ok(status)) => {
                let exit_code = status.code();
                let success = status.success();
                let error = if success {
                    None
                } else if !stderr.trim().is_empty() {
                    Some(stderr.trim().to_string())
                } else {
                    Some(match exit_code {
                        Some(code) => format!("Command exited with code {}", code),
                        None => "Command was terminated by a signal".to_string(),
                    })
                };
                CommandExecutionResult {
                    success,
                    output: stdout,
                    error,
                    exit_code,
                }
            }
            Outcome::Exited(Err(e)) => {
                CommandExecutionResult::failed(stdout, format!("Failed to wait for command: {}", e))
            }
            Outcome::TimedOut => {
                tracing::warn!("command timed out after {:?}", timeout);
                CommandExecutionResult::failed(
                    stdout,
                    format!("Command timed out after {} seconds", format_secs(timeout)),
                )
            }
            Outcome::Cancelled => {
                CommandExecutionResult::failed(stdout, "Command was cancelled".to_string())
            }
            Outcome::Terminated => {
                CommandExecutionResult::failed(stdout, "Command was terminated".to_string())
            }
        };

        // Applies regardless of exit code
        if output_indicates_auth_failure(&format!("{}\n{}", result.output, stderr)) {
            let hint = options
                .agent
                .as_ref()
                .map(|agent| agent.login_hint())
                .unwrap_or_else(|| GENERIC_AUTH_HINT.to_string());
            tracing::warn!("command output indicates an authentication failure");
            result.success = false;
            result.error = Some(hint);
        }

        result
    }
}

fn shell_command(command: &str, cwd: &Path) -> Command {
    let mut cmd = if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd
    };
    cmd.current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

fn spawn_reader<R>(mut pipe: R, buffer: Arc<Mutex<Vec<u8>>>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut chunk = [0u8; 8192];
        loop {
            match pipe.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => buffer
                    .lock()
                    .unwrap_or_else(|p| p.into_inner())
                    .extend_from_slice(&chunk[..n]),
            }
        }
    })
}

async fn finish_reader(mut reader: JoinHandle<()>, wait: Duration) {
    if tokio::time::timeout(wait, &mut reader).await.is_err() {
        reader.abort();
    }
}

fn take_text(buffer: &Mutex<Vec<u8>>) -> String {
    let bytes = std::mem::take(&mut *buffer.lock().unwrap_or_else(|p| p.into_inner()));
    String::from_utf8_lossy(&bytes).into_owned()
}

async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

async fn stop(child: &mut Child) {
    if let Err(e) = child.kill().await {
        tracing::debug!("failed to kill command: {}", e);
    }
}

fn format_secs(duration: Duration) -> String {
    if duration.subsec_millis() == 0 {
        duration.as_secs().to_string()
    } else {
        format!("{:.1}", duration.as_secs_f64())
    }
}
