//! Supervision of one REST server OS process.
//!
//! Liveness is polled, never pushed: [`ServerProcessHandle::is_alive`] reaps
//! the child if it has exited and reports whether it is still running.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use common::args::is_server_arg_key;
use common::{ProcessState, ServerArgs, SslOptions};
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use thiserror::Error;
use tracing::{debug, info, warn};

/// How often [`ServerProcessHandle::join`] polls a bounded wait.
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Grace period given to a process still running when its handle is dropped.
const DROP_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors from controlling the server process.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to signal process {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: Errno,
    },

    #[error("failed to wait for process {pid}: {source}")]
    Wait {
        pid: u32,
        #[source]
        source: io::Error,
    },
}

/// How to launch the REST server executable.
#[derive(Debug, Clone)]
pub struct ServerCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ServerCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append a fixed command-line argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn program(&self) -> &std::path::Path {
        &self.program
    }

    fn command(&self, args: &ServerArgs) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).stdin(Stdio::null());

        // Stale arguments must not leak into this start; server settings pass through.
        for (key, _) in std::env::vars_os() {
            if is_server_arg_key(&key.to_string_lossy()) {
                cmd.env_remove(key);
            }
        }
        cmd.envs(args.to_env());
        cmd
    }
}

/// Handle owning exactly one REST server process.
#[derive(Debug)]
pub struct ServerProcessHandle {
    args: ServerArgs,
    child: Child,
    state: ProcessState,
}

impl ServerProcessHandle {
    /// Spawn a server process for `args`.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Spawn`] if the executable cannot be started.
    pub fn spawn(command: &ServerCommand, args: ServerArgs) -> Result<Self, ProcessError> {
        let child = command
            .command(&args)
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: command.program.display().to_string(),
                source,
            })?;
        info!(
            pid = child.id(),
            node = %args.node,
            port = args.effective_port(),
            ssl = args.ssl_options.is_some(),
            "REST server process started"
        );
        let mut handle = Self {
            args,
            child,
            state: ProcessState::NotStarted,
        };
        handle.transition(ProcessState::Running);
        Ok(handle)
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    pub fn node(&self) -> &str {
        &self.args.node
    }

    pub fn port(&self) -> u16 {
        self.args.effective_port()
    }

    pub fn ssl_options(&self) -> Option<&SslOptions> {
        self.args.ssl_options.as_ref()
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    fn transition(&mut self, next: ProcessState) {
        if self.state == next {
            return;
        }
        debug_assert!(self.state.can_transition_to(next));
        debug!(pid = self.pid(), from = %self.state, to = %next, "process state changed");
        self.state = next;
    }

    fn mark_exited(&mut self, status: ExitStatus) {
        if self.state != ProcessState::Terminated {
            info!(pid = self.pid(), %status, "REST server process exited");
            self.transition(ProcessState::Terminated);
        }
    }

    /// Liveness probe. Reaps the process if it has exited.
    ///
    /// A failing probe counts as "not alive".
    pub fn is_alive(&mut self) -> bool {
        if self.state == ProcessState::Terminated {
            return false;
        }
        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                self.mark_exited(status);
                false
            }
            Err(e) => {
                warn!(pid = self.pid(), error = %e, "liveness probe failed");
                false
            }
        }
    }

    /// Ask the process to shut down (SIGTERM).
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Signal`] if the signal cannot be delivered for
    /// a reason other than the process being gone already.
    pub fn terminate(&mut self) -> Result<(), ProcessError> {
        let pid = self.pid();
        let raw = i32::try_from(pid).map_err(|_| ProcessError::Signal {
            pid,
            source: Errno::ESRCH,
        })?;
        match signal::kill(Pid::from_raw(raw), Signal::SIGTERM) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(source) => Err(ProcessError::Signal { pid, source }),
        }
    }

    /// Wait for the process to exit.
    ///
    /// With `timeout = None` this blocks until the process exits. Otherwise
    /// the process is killed once `timeout` elapses and then reaped.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Wait`] if waiting on the child fails.
    pub fn join(&mut self, timeout: Option<Duration>) -> Result<ExitStatus, ProcessError> {
        let pid = self.pid();
        let wait_err = |source| ProcessError::Wait { pid, source };

        let status = match timeout {
            None => self.child.wait().map_err(wait_err)?,
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                loop {
                    if let Some(status) = self.child.try_wait().map_err(wait_err)? {
                        break status;
                    }
                    if Instant::now() >= deadline {
                        warn!(pid, ?timeout, "REST server process did not exit in time, killing it");
                        if let Err(e) = self.child.kill() {
                            warn!(pid, error = %e, "failed to kill REST server process");
                        }
                        break self.child.wait().map_err(wait_err)?;
                    }
                    thread::sleep(JOIN_POLL_INTERVAL);
                }
            }
        };
        self.mark_exited(status);
        Ok(status)
    }
}

impl Drop for ServerProcessHandle {
    fn drop(&mut self) {
        if !self.is_alive() {
            return;
        }
        warn!(pid = self.pid(), "REST server handle dropped while process is running");
        if let Err(e) = self.terminate().and_then(|()| self.join(Some(DROP_TIMEOUT)).map(|_| ())) {
            warn!(pid = self.pid(), error = %e, "failed to stop REST server process");
        }
    }
}
