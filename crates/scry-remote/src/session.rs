use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::cli::RemoteRequest;
use crate::error::{Error, Result, TransportError};
use crate::launch::LaunchOptions;
use crate::remote::Remote;
use crate::state::Shared;
use crate::transport::Transport;
use crate::wait::poll_until;

const RECORD_EXTENSION: &str = "plt";

/// Information sent by the program when its record starts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordInfo {
    /// Application name.
    pub app_name: String,

    /// Build name.
    pub build_name: String,

    /// Whether the strings are replaced by their hash in the program.
    pub strings_external: bool,

    /// Whether the program uses 32-bit string hashes.
    pub short_hash: bool,

    /// Whether the program accepts remote control.
    pub control_enabled: bool,
}

/// Options of a connection with a program.
#[derive(Clone, Debug, Default)]
pub struct ConnectOptions {
    /// File where the session is recorded (no record if `None`).
    pub record_file: Option<PathBuf>,

    /// Whether to wait for a thread to reach a freeze point.
    pub pass_first_freeze_point: bool,

    /// Remote command stopping the program gracefully.
    pub quit_cli: Option<String>,

    /// Maximum wait for the connection (configured default if `None`).
    pub connection_timeout: Option<Duration>,
}

impl ConnectOptions {
    /// Constructs the default options: no record, no synchronization, stop
    /// through an OS signal, and the configured connection timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the session in the given file.
    ///
    /// The `.plt` extension is appended when missing.
    pub fn record_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.record_file = Some(path.into());
        self
    }

    /// Waits until a thread of the program reaches a freeze point, so that
    /// everything the program registers before that point (e.g. its remote
    /// commands) is known when connecting returns.
    ///
    /// The freeze mode is enabled for the synchronization, then restored.
    pub const fn pass_first_freeze_point(mut self, pass: bool) -> Self {
        self.pass_first_freeze_point = pass;
        self
    }

    /// Stops the program with this remote command instead of an OS signal.
    pub fn quit_cli(mut self, command: impl Into<String>) -> Self {
        self.quit_cli = Some(command.into());
        self
    }

    /// Sets the maximum wait for the connection (and the synchronization).
    pub const fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = Some(timeout);
        self
    }
}

/// Launched program.
#[derive(Default)]
pub(crate) struct ProcessSlot {
    child: Option<Child>,
    readers: Vec<JoinHandle<()>>,
    exit_status: Option<ExitStatus>,
}

#[derive(Clone, Copy)]
enum OutputStream {
    Stdout,
    Stderr,
}

fn record_path(path: &Path) -> Option<PathBuf> {
    if path.as_os_str().is_empty() {
        None
    } else if path.extension() == Some(OsStr::new(RECORD_EXTENSION)) {
        Some(path.to_owned())
    } else {
        let mut path = path.as_os_str().to_owned();
        path.push(".");
        path.push(RECORD_EXTENSION);
        Some(path.into())
    }
}

fn spawn_line_reader(
    shared: Arc<Shared>,
    reader: impl AsyncRead + Unpin + Send + 'static,
    stream: OutputStream,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();

        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }

            let mut program = shared.program.lock();
            match stream {
                OutputStream::Stdout => program.stdout_lines.push(line),
                OutputStream::Stderr => program.stderr_lines.push(line),
            }
        }
    })
}

#[cfg(unix)]
fn terminate(child: &mut Child) {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Some(pid) = child.id().and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };

    if let Err(e) = kill(Pid::from_raw(pid), Signal::SIGTERM) {
        tracing::debug!("failed to send SIGTERM: {e}");
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        tracing::debug!("failed to terminate: {e}");
    }
}

impl<T: Transport> Remote<T> {
    /// Launches a program, and waits for its connection.
    ///
    /// If the connection fails, the program is stopped.
    #[tracing::instrument(name = "Launch", skip_all, fields(program = %options.program.display()))]
    pub async fn launch(&self, options: LaunchOptions) -> Result<(), T::Error> {
        let previous_freeze_mode = self.prepare_session(&options.connect)?;

        let mut child = options.to_command().spawn()?;
        tracing::info!(pid = ?child.id(), "program spawned");

        let mut readers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_line_reader(
                Arc::clone(&self.shared),
                stdout,
                OutputStream::Stdout,
            ));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_line_reader(
                Arc::clone(&self.shared),
                stderr,
                OutputStream::Stderr,
            ));
        }

        let previous = std::mem::replace(
            &mut *self.process.lock(),
            ProcessSlot {
                child: Some(child),
                readers,
                exit_status: None,
            },
        );
        previous.readers.iter().for_each(JoinHandle::abort);

        if let Err(e) = self
            .synchronize(&options.connect, previous_freeze_mode)
            .await
        {
            self.stop().await;
            return Err(e);
        }

        Ok(())
    }

    /// Waits for the connection of an already running program.
    #[tracing::instrument(name = "Connect", skip_all)]
    pub async fn connect(&self, options: ConnectOptions) -> Result<(), T::Error> {
        let previous_freeze_mode = self.prepare_session(&options)?;
        self.synchronize(&options, previous_freeze_mode).await
    }

    /// Resets the per-session state, and returns the freeze mode requested
    /// before the session.
    fn prepare_session(&self, options: &ConnectOptions) -> Result<bool, T::Error> {
        self.ensure_initialized()?;

        let previous_freeze_mode = {
            let mut program = self.shared.program.lock();

            if program.connected {
                return Err(Error::AlreadyConnected);
            }

            program.reset(options.quit_cli.clone());
            let previous = program.freeze_mode;
            program.freeze_mode |= options.pass_first_freeze_point;
            previous
        };

        self.shared.command.lock().reset();
        self.shared.record.lock().reset();

        let record_file = options.record_file.as_deref().and_then(record_path);
        self.transport()
            .set_record_file(record_file.as_deref())
            .map_err(TransportError)?;

        Ok(previous_freeze_mode)
    }

    async fn synchronize(
        &self,
        options: &ConnectOptions,
        previous_freeze_mode: bool,
    ) -> Result<(), T::Error> {
        let timeout = options
            .connection_timeout
            .unwrap_or_else(|| self.config().connection_timeout());
        let deadline = Instant::now() + timeout;

        let connected = poll_until(&self.shared.connection, deadline, || {
            self.shared.program.lock().connected
        })
        .await;

        if !connected {
            return Err(Error::ConnectionTimeout(timeout));
        }

        let max_latency = RemoteRequest::MaxLatency(self.config().max_latency());
        match self.remote_call(max_latency, self.config().cli_timeout()).await {
            Err(e) if e.is_connection_error() => tracing::debug!("max latency not set: {e}"),
            res => {
                res?;
            }
        }

        // also releases the program, which waits for its freeze mode
        let freeze_mode = self.shared.program.lock().freeze_mode;
        self.set_freeze_mode(freeze_mode).await?;

        if options.pass_first_freeze_point {
            let synchronized = poll_until(&self.shared.record_wake, deadline, || {
                self.shared.record.lock().freeze.frozen() != 0
            })
            .await;

            if !synchronized {
                return Err(Error::FreezeSyncTimeout(timeout));
            }

            self.set_freeze_mode(previous_freeze_mode).await?;
        }

        tracing::info!("program connected");

        Ok(())
    }

    /// Stops the launched program, if any.
    ///
    /// The program is asked to quit (through its quit command if configured,
    /// through an OS signal otherwise), then killed after a grace period.
    /// Failures are ignored: this never fails.
    #[tracing::instrument(name = "Stop", skip_all)]
    pub async fn stop(&self) {
        let (child, readers) = {
            let mut slot = self.process.lock();
            (slot.child.take(), std::mem::take(&mut slot.readers))
        };

        let Some(mut child) = child else {
            return;
        };

        let quit_cli = self.shared.program.lock().quit_cli.clone();
        match quit_cli {
            Some(command) => {
                if let Err(e) = self.cli(&command, self.config().cli_timeout()).await {
                    tracing::debug!("quit command failed: {e}");
                }
            }
            None => terminate(&mut child),
        }

        let grace = self.config().stop_grace();

        let status = match tokio::time::timeout(grace, child.wait()).await {
            Ok(Ok(status)) => Some(status),
            _ => {
                tracing::debug!("program still running, killing it");

                match tokio::time::timeout(grace, child.kill()).await {
                    Ok(Err(e)) => tracing::debug!("failed to kill: {e}"),
                    Err(_) => tracing::debug!("program not killed within {grace:?}"),
                    Ok(Ok(())) => (),
                }

                child.try_wait().ok().flatten()
            }
        };

        for reader in readers {
            let abort = reader.abort_handle();
            if tokio::time::timeout(grace, reader).await.is_err() {
                abort.abort();
            }
        }

        self.process.lock().exit_status = status;

        self.shared.program.lock().connected = false;
        self.shared.connection.notify_waiters();
        self.shared.record_wake.notify_waiters();

        tracing::info!(?status, "program stopped");
    }

    /// Returns whether the program is running.
    ///
    /// For a program connected without being launched, this is whether it
    /// is still connected.
    pub fn is_running(&self) -> bool {
        let mut slot = self.process.lock();
        let slot = &mut *slot;

        match slot.child.as_mut() {
            Some(child) => match child.try_wait() {
                Ok(None) => true,
                Ok(Some(status)) => {
                    slot.exit_status = Some(status);
                    false
                }
                Err(_) => false,
            },
            None => self.shared.program.lock().connected,
        }
    }

    /// Returns the exit code of the launched program, if it exited.
    pub fn exit_code(&self) -> Option<i32> {
        let mut slot = self.process.lock();
        let slot = &mut *slot;

        if let Some(Ok(Some(status))) = slot.child.as_mut().map(Child::try_wait) {
            slot.exit_status = Some(status);
        }

        slot.exit_status.and_then(|status| status.code())
    }

    /// Returns the non-empty stdout lines captured since the last call.
    pub fn take_stdout_lines(&self) -> Vec<String> {
        std::mem::take(&mut self.shared.program.lock().stdout_lines)
    }

    /// Returns the non-empty stderr lines captured since the last call.
    pub fn take_stderr_lines(&self) -> Vec<String> {
        std::mem::take(&mut self.shared.program.lock().stderr_lines)
    }

    /// Returns what the connected program told about its record.
    pub fn record_info(&self) -> Option<RecordInfo> {
        self.shared.program.lock().info.clone()
    }
}
