//! Interactive mode: commands are typed into a long-lived named shell that
//! shares the user's terminal. Nothing is captured and nothing times out.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

pub struct TerminalSessions {
    cwd: PathBuf,
    sessions: Mutex<HashMap<String, Child>>,
}

impl TerminalSessions {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Send `command` to the session called `name`, starting it if needed.
    /// A session whose shell has exited is replaced.
    pub async fn run(&self, name: &str, command: &str) -> std::io::Result<()> {
        let mut sessions = self.sessions.lock().await;

        let alive = match sessions.get_mut(name) {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        };
        if !alive {
            tracing::debug!("starting terminal session '{}'", name);
            sessions.insert(name.to_string(), self.spawn_shell()?);
        }

        let child = sessions
            .get_mut(name)
            .ok_or_else(|| std::io::Error::other("terminal session vanished"))?;
        let stdin = child
            .stdin
            .as_mut()
            .ok_or_else(|| std::io::Error::other("terminal session has no stdin"))?;
        stdin.write_all(command.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await
    }

    pub async fn session_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sessions.lock().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Let every session finish what it was sent, then reap it
    pub async fn close_all(&self) {
        let mut sessions = self.sessions.lock().await;
        for (name, mut child) in sessions.drain() {
            // Closing stdin makes the shell exit after its queued commands
            drop(child.stdin.take());
            if let Err(e) = child.wait().await {
                tracing::warn!("terminal session '{}' did not exit cleanly: {}", name, e);
            }
        }
    }

    /// Kill every session immediately
    pub async fn dispose(&self) {
        let mut sessions = self.sessions.lock().await;
        for (name, mut child) in sessions.drain() {
            if let Err(e) = child.kill().await {
                tracing::debug!("failed to kill terminal session '{}': {}", name, e);
            }
        }
    }

    fn spawn_shell(&self) -> std::io::Result<Child> {
        let program = if cfg!(windows) { "cmd" } else { "sh" };
        Command::new(program)
            .current_dir(&self.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
    }
}
