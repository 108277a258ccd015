//! Flutter child-process management
//!
//! The `Child` handle is moved into a dedicated wait task that calls
//! `child.wait()`, so the real exit code is captured and emitted as
//! `ProcessEvent::Exited { code: Some(N) }` rather than always `None`.
//! `kill_on_drop(true)` tears the child down if the owning session is
//! dropped before the process exits.

use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use flaunch_core::prelude::*;

/// Raw event emitted by a managed Flutter process
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    Stdout(String),
    Stderr(String),
    Exited { code: Option<i32> },
}

/// A managed `flutter` child process speaking the machine interface
pub struct AppProcess {
    /// Sender for stdin commands
    stdin_tx: mpsc::Sender<String>,
    /// Process ID for logging
    pid: Option<u32>,
    /// Set to `true` by the wait task once the child has exited
    exited: Arc<AtomicBool>,
}

impl AppProcess {
    /// Spawn `flutter` with the given arguments in a project directory.
    ///
    /// Events are sent to `event_tx`; the receiver side drives the session.
    pub fn spawn(
        project_root: &Path,
        args: Vec<String>,
        event_tx: mpsc::Sender<ProcessEvent>,
    ) -> Result<Self> {
        let pubspec = project_root.join("pubspec.yaml");
        if !pubspec.exists() {
            return Err(Error::NoProject {
                path: project_root.to_path_buf(),
            });
        }

        info!("Spawning Flutter: flutter {}", args.join(" "));

        let mut child = Command::new("flutter")
            .args(&args)
            .current_dir(project_root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::FlutterNotFound
                } else {
                    Error::ProcessSpawn {
                        reason: e.to_string(),
                    }
                }
            })?;

        let pid = child.id();
        info!("Flutter process started with PID: {:?}", pid);

        let stdin = child.stdin.take().expect("stdin was configured");
        let (stdin_tx, stdin_rx) = mpsc::channel::<String>(32);
        tokio::spawn(Self::stdin_writer(stdin, stdin_rx));

        let stdout = child.stdout.take().expect("stdout was configured");
        tokio::spawn(Self::stdout_reader(stdout, event_tx.clone()));

        let stderr = child.stderr.take().expect("stderr was configured");
        tokio::spawn(Self::stderr_reader(stderr, event_tx.clone()));

        let exited = Arc::new(AtomicBool::new(false));
        tokio::spawn(Self::wait_for_exit(child, event_tx, Arc::clone(&exited)));

        Ok(Self {
            stdin_tx,
            pid,
            exited,
        })
    }

    /// Background task: owns `child`, waits for it to exit, emits `Exited`.
    async fn wait_for_exit(
        mut child: Child,
        event_tx: mpsc::Sender<ProcessEvent>,
        exited: Arc<AtomicBool>,
    ) {
        let code = match child.wait().await {
            Ok(status) => {
                info!("Flutter process exited with status: {:?}", status);
                status.code()
            }
            Err(e) => {
                error!("Error waiting for Flutter process: {}", e);
                None
            }
        };

        // Flag first, so has_exited() is true before callers observe the event
        exited.store(true, Ordering::Release);

        let _ = event_tx.send(ProcessEvent::Exited { code }).await;
    }

    /// Read lines from stdout and send as `ProcessEvent::Stdout`.
    ///
    /// Does NOT emit `Exited` — that is the wait task's job, which captures
    /// the real exit code after the pipes close.
    async fn stdout_reader(stdout: tokio::process::ChildStdout, tx: mpsc::Sender<ProcessEvent>) {
        let mut reader = BufReader::new(stdout).lines();

        while let Ok(Some(line)) = reader.next_line().await {
            trace!("stdout: {}", line);
            if tx.send(ProcessEvent::Stdout(line)).await.is_err() {
                break;
            }
        }

        debug!("stdout reader finished, process likely exiting");
    }

    async fn stderr_reader(stderr: tokio::process::ChildStderr, tx: mpsc::Sender<ProcessEvent>) {
        let mut reader = BufReader::new(stderr).lines();

        while let Ok(Some(line)) = reader.next_line().await {
            trace!("stderr: {}", line);
            if tx.send(ProcessEvent::Stderr(line)).await.is_err() {
                break;
            }
        }

        debug!("stderr reader finished");
    }

    /// Write commands to stdin, one per line
    async fn stdin_writer(mut stdin: tokio::process::ChildStdin, mut rx: mpsc::Receiver<String>) {
        while let Some(command) = rx.recv().await {
            debug!("Sending to process: {}", command);

            if stdin.write_all(command.as_bytes()).await.is_err()
                || stdin.write_all(b"\n").await.is_err()
                || stdin.flush().await.is_err()
            {
                error!("Failed to write to process stdin");
                break;
            }
        }

        debug!("stdin writer finished");
    }

    /// Send a raw line to the process
    pub async fn send(&self, command: &str) -> Result<()> {
        self.stdin_tx
            .send(command.to_string())
            .await
            .map_err(|_| Error::channel_send("process stdin channel closed"))
    }

    /// Send a JSON-RPC payload (auto-wrapped in brackets)
    pub async fn send_json(&self, json: &str) -> Result<()> {
        self.send(&format!("[{}]", json)).await
    }

    /// Non-blocking check backed by the wait task's atomic flag
    pub fn has_exited(&self) -> bool {
        self.exited.load(Ordering::Acquire)
    }

    /// Get the process ID
    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    /// Clone of the stdin sender, for tasks that outlive the borrow
    pub fn stdin_sender(&self) -> mpsc::Sender<String> {
        self.stdin_tx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_spawn_without_project_fails() {
        let (tx, _rx) = mpsc::channel(16);
        let result = AppProcess::spawn(Path::new("/nonexistent/path"), vec!["run".into()], tx);

        assert!(matches!(result, Err(Error::NoProject { .. })));
    }

    #[tokio::test]
    async fn test_spawn_requires_pubspec() {
        let temp = TempDir::new().unwrap();
        let (tx, _rx) = mpsc::channel(16);

        let result = AppProcess::spawn(temp.path(), vec!["run".into()], tx);
        assert!(matches!(result, Err(Error::NoProject { .. })));
    }

    /// Spawn a short-lived stand-in process using the internal machinery.
    ///
    /// Bypasses the pubspec check and uses `sh -c` in place of Flutter, so
    /// only the reader/wait plumbing is exercised.
    fn spawn_test_process(script: &str, event_tx: mpsc::Sender<ProcessEvent>) -> AppProcess {
        let mut child = Command::new("sh")
            .args(["-c", script])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .expect("sh must be available in test environment");

        let pid = child.id();

        let stdin = child.stdin.take().expect("stdin");
        let (stdin_tx, stdin_rx) = mpsc::channel::<String>(4);
        tokio::spawn(AppProcess::stdin_writer(stdin, stdin_rx));

        let stdout = child.stdout.take().expect("stdout");
        tokio::spawn(AppProcess::stdout_reader(stdout, event_tx.clone()));

        let stderr = child.stderr.take().expect("stderr");
        tokio::spawn(AppProcess::stderr_reader(stderr, event_tx.clone()));

        let exited = Arc::new(AtomicBool::new(false));
        tokio::spawn(AppProcess::wait_for_exit(
            child,
            event_tx,
            Arc::clone(&exited),
        ));

        AppProcess {
            stdin_tx,
            pid,
            exited,
        }
    }

    async fn wait_for_exit_event(rx: &mut mpsc::Receiver<ProcessEvent>) -> Option<i32> {
        for _ in 0..50 {
            match tokio::time::timeout(std::time::Duration::from_millis(100), rx.recv()).await {
                Ok(Some(ProcessEvent::Exited { code })) => return code,
                Ok(Some(_)) => continue,
                _ => break,
            }
        }
        panic!("ProcessEvent::Exited was not received");
    }

    #[tokio::test]
    async fn test_exit_code_captured_on_normal_exit() {
        let (tx, mut rx) = mpsc::channel(16);
        let _process = spawn_test_process("exit 0", tx);

        assert_eq!(wait_for_exit_event(&mut rx).await, Some(0));
    }

    #[tokio::test]
    async fn test_exit_code_captured_on_error_exit() {
        let (tx, mut rx) = mpsc::channel(16);
        let _process = spawn_test_process("exit 42", tx);

        assert_eq!(wait_for_exit_event(&mut rx).await, Some(42));
    }

    #[tokio::test]
    async fn test_stdout_lines_delivered() {
        let (tx, mut rx) = mpsc::channel(32);
        let _process = spawn_test_process("echo hello; echo world", tx);

        // Reader and wait tasks race on the shared channel, so drain until it
        // closes rather than stopping at the first Exited event.
        let mut lines = Vec::new();
        loop {
            match tokio::time::timeout(std::time::Duration::from_millis(500), rx.recv()).await {
                Ok(Some(ProcessEvent::Stdout(line))) => lines.push(line),
                Ok(Some(_)) => continue,
                Ok(None) | Err(_) => break,
            }
        }

        assert_eq!(lines, vec!["hello", "world"]);
    }

    #[tokio::test]
    async fn test_has_exited_becomes_true_after_exit() {
        let (tx, mut rx) = mpsc::channel(16);
        let process = spawn_test_process("exit 0", tx);

        wait_for_exit_event(&mut rx).await;

        assert!(process.has_exited());
    }

    #[tokio::test]
    async fn test_exactly_one_exited_event() {
        let (tx, mut rx) = mpsc::channel(32);
        let _process = spawn_test_process("exit 0", tx);

        let mut exited_count = 0usize;
        let deadline = tokio::time::sleep(std::time::Duration::from_millis(500));
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                event = rx.recv() => {
                    match event {
                        Some(ProcessEvent::Exited { .. }) => exited_count += 1,
                        Some(_) => {}
                        None => break,
                    }
                }
                _ = &mut deadline => break,
            }
        }

        assert_eq!(exited_count, 1);
    }
}
