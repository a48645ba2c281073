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

//! Rebinding of the worker's standard streams.
//!
//! Runs in the forked pre-worker only. Output and error targets are opened in
//! create-or-append mode and never truncated; standard input becomes the read
//! end of the relay channel.

use crate::error::{ForkerError, Result, format_error_chain};
use nix::unistd::dup2;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::{AsFd, AsRawFd, OwnedFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

const TARGET_MODE: u32 = 0o666;

/// A close-on-exec duplicate of the error stream as it was before redirection.
pub struct SavedStderr(File);

impl SavedStderr {
    pub fn capture() -> Result<Self> {
        let fd = io::stderr().as_fd().try_clone_to_owned()?;
        Ok(Self(File::from(fd)))
    }

    /// Write `error` where the invoking environment can still see it.
    pub fn report(&mut self, error: &ForkerError) {
        // Best effort: there is no other stream left to report a failure on.
        let _ = writeln!(self.0, "{}", format_error_chain(error));
    }
}

/// Open `path` for writing, creating it if absent and appending if present.
pub fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .append(true)
        .create(true)
        .mode(TARGET_MODE)
        .open(path)
        .map_err(|source| ForkerError::OpenTarget {
            path: path.to_path_buf(),
            source,
        })
}

/// Descriptors that will become the worker's stdin, stdout and stderr.
pub struct StdioBindings {
    stdin: OwnedFd,
    stdout: OwnedFd,
    stderr: OwnedFd,
}

impl StdioBindings {
    /// Open both targets. Output and error are opened independently even when
    /// they name the same file.
    pub fn open(stdin: OwnedFd, stdout_path: &Path, stderr_path: &Path) -> Result<Self> {
        let stdout = open_append(stdout_path)?;
        let stderr = open_append(stderr_path)?;
        Ok(Self {
            stdin,
            stdout: stdout.into(),
            stderr: stderr.into(),
        })
    }

    /// Rebind descriptors 0, 1 and 2 and close the originals.
    pub fn apply(self) -> Result<()> {
        let stdout = above_stdio(self.stdout)?;
        let stderr = above_stdio(self.stderr)?;
        let stdin = above_stdio(self.stdin)?;

        rebind(&stdout, libc::STDOUT_FILENO, "standard output")?;
        rebind(&stderr, libc::STDERR_FILENO, "standard error")?;
        rebind(&stdin, libc::STDIN_FILENO, "standard input")?;
        Ok(())
    }
}

/// Moves `fd` out of 0..=2 so that rebinding one stream cannot clobber the
/// source of another.
fn above_stdio(fd: OwnedFd) -> Result<OwnedFd> {
    if fd.as_raw_fd() > libc::STDERR_FILENO {
        return Ok(fd);
    }
    Ok(fd.try_clone()?)
}

fn rebind(fd: &OwnedFd, target: RawFd, stream: &'static str) -> Result<()> {
    dup2(fd.as_raw_fd(), target).map_err(|source| ForkerError::Redirect { stream, source })?;
    Ok(())
}
