// Copyright 2025 dentsusoken
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Two-stage detach and worker supervision.
//!
//! Three processes take part in a launch:
//! 1. The caller forks and returns at once with [`Launch::Detached`].
//! 2. The detacher starts a new session, creates the relay channel and forks
//!    the worker. It then relays input on a background thread, waits for the
//!    worker and returns [`Launch::Finished`] with its exit status.
//! 3. The pre-worker rebinds its standard streams and replaces itself with the
//!    requested program. It never returns.

use crate::config::ForkerConfig;
use crate::error::{ForkerError, Result, format_error_chain, get_exit_code};
use crate::launch::LaunchRequest;
use crate::logging::LIFECYCLE_TARGET;
use crate::platform::{InputSource, SavedStderr, StdioBindings, exec_replace};
use crate::relay::InputRelay;
use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, fork, pipe, setsid};
use std::fs::File;
use std::os::fd::OwnedFd;
use std::process;

/// How [`Supervisor::launch`] returned in the current process.
#[derive(Debug, Eq, PartialEq)]
pub enum Launch {
    /// This is the original caller; the detached process carries on.
    Detached { detacher: Pid },
    /// This is the detacher and the worker has terminated.
    Finished(ExitReport),
}

/// Termination of the worker.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ExitReport {
    pub pid: Pid,
    pub status: i32,
    pub signal: Option<Signal>,
}

impl ExitReport {
    /// Build a report from a terminal wait status.
    ///
    /// A worker killed by a signal reports `128 + signal number`.
    pub fn from_wait_status(status: WaitStatus) -> Option<Self> {
        match status {
            WaitStatus::Exited(pid, code) => Some(Self {
                pid,
                status: code,
                signal: None,
            }),
            WaitStatus::Signaled(pid, signal, _) => Some(Self {
                pid,
                status: 128 + signal as i32,
                signal: Some(signal),
            }),
            _ => None,
        }
    }

    /// Exit code for the detacher.
    pub fn code(&self) -> i32 {
        self.status
    }
}

pub struct Supervisor {
    request: LaunchRequest,
    source: InputSource,
    config: ForkerConfig,
}

impl Supervisor {
    pub fn new(request: LaunchRequest, source: InputSource, config: ForkerConfig) -> Self {
        Self {
            request,
            source,
            config,
        }
    }

    /// Detach from the caller and supervise the worker.
    ///
    /// Must be called while the process is still single-threaded.
    pub fn launch(self) -> Result<Launch> {
        // SAFETY: no other threads exist yet, so the child starts from a
        // consistent copy of the address space.
        match unsafe { fork() }.map_err(ForkerError::Fork)? {
            ForkResult::Parent { child } => {
                log::debug!("Detached into pid {child}");
                Ok(Launch::Detached { detacher: child })
            }
            ForkResult::Child => self.supervise().map(Launch::Finished),
        }
    }

    fn supervise(self) -> Result<ExitReport> {
        if self.config.detach.new_session {
            let session = setsid().map_err(ForkerError::Session)?;
            log::trace!("Started session {session}");
        }

        let (read_end, write_end) = pipe().map_err(ForkerError::Pipe)?;

        // SAFETY: the relay thread is started only after this fork.
        let worker = match unsafe { fork() }.map_err(ForkerError::Fork)? {
            ForkResult::Child => run_worker(&self.request, read_end, write_end),
            ForkResult::Parent { child } => child,
        };
        drop(read_end);

        let name = self.request.display_name();
        log::info!(target: LIFECYCLE_TARGET, "{name} ;; started with pid {worker}");

        InputRelay::new(self.source, self.config.relay.buffer_size).spawn(File::from(write_end))?;

        let report = wait_for(worker)?;
        if let Some(signal) = report.signal {
            log::debug!("{name} was terminated by {signal}");
        }
        log::info!(
            target: LIFECYCLE_TARGET,
            "{name} ;; terminated pid {} with status {}",
            report.pid,
            report.status
        );
        Ok(report)
    }
}

/// Rebind the standard streams and become the requested program.
///
/// Every failure is reported through the error stream as it was before
/// redirection, since descriptor 2 may already point at the error target.
fn run_worker(request: &LaunchRequest, stdin: OwnedFd, relay_end: OwnedFd) -> ! {
    drop(relay_end);

    let mut saved = match SavedStderr::capture() {
        Ok(saved) => saved,
        Err(e) => {
            eprintln!("{}", format_error_chain(&e));
            process::exit(get_exit_code(&e));
        }
    };

    let err = match StdioBindings::open(stdin, request.stdout_path(), request.stderr_path())
        .and_then(StdioBindings::apply)
    {
        Ok(()) => exec_replace(request.program(), request.args()),
        Err(e) => e,
    };

    saved.report(&err);
    process::exit(get_exit_code(&err));
}

fn wait_for(worker: Pid) -> Result<ExitReport> {
    loop {
        match waitpid(worker, None) {
            Ok(status) => match ExitReport::from_wait_status(status) {
                Some(report) => return Ok(report),
                None => log::trace!("Ignoring wait status {status:?}"),
            },
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(ForkerError::Wait(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exited_worker_reports_its_code() {
        let pid = Pid::from_raw(4242);

        let report = ExitReport::from_wait_status(WaitStatus::Exited(pid, 7)).unwrap();

        assert_eq!(report.pid, pid);
        assert_eq!(report.code(), 7);
        assert_eq!(report.signal, None);
    }

    #[test]
    fn exit_codes_cover_full_byte_range() {
        for code in [0, 1, 127, 255] {
            let status = WaitStatus::Exited(Pid::from_raw(1), code);
            assert_eq!(ExitReport::from_wait_status(status).unwrap().code(), code);
        }
    }

    #[test]
    fn signaled_worker_reports_shell_style_status() {
        let status = WaitStatus::Signaled(Pid::from_raw(99), Signal::SIGKILL, false);

        let report = ExitReport::from_wait_status(status).unwrap();

        assert_eq!(report.code(), 137);
        assert_eq!(report.signal, Some(Signal::SIGKILL));
    }

    #[test]
    fn non_terminal_statuses_are_ignored() {
        let stopped = WaitStatus::Stopped(Pid::from_raw(5), Signal::SIGSTOP);
        assert_eq!(ExitReport::from_wait_status(stopped), None);
        assert_eq!(ExitReport::from_wait_status(WaitStatus::StillAlive), None);
    }
}
