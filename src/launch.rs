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

//! The immutable description of one detached run.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Everything needed to start the worker, built once from the command line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LaunchRequest {
    stdin_path: PathBuf,
    stdout_path: PathBuf,
    stderr_path: PathBuf,
    program: OsString,
    args: Vec<OsString>,
}

impl LaunchRequest {
    pub fn new(
        stdin_path: PathBuf,
        stdout_path: PathBuf,
        stderr_path: PathBuf,
        program: OsString,
        args: Vec<OsString>,
    ) -> Self {
        Self {
            stdin_path,
            stdout_path,
            stderr_path,
            program,
            args,
        }
    }

    /// Split a `<executable> [args...]` vector as accepted on the command line.
    ///
    /// Returns `None` when the vector is empty.
    pub fn from_command(
        stdin_path: PathBuf,
        stdout_path: PathBuf,
        stderr_path: PathBuf,
        command: Vec<OsString>,
    ) -> Option<Self> {
        let mut command = command.into_iter();
        let program = command.next()?;
        Some(Self::new(
            stdin_path,
            stdout_path,
            stderr_path,
            program,
            command.collect(),
        ))
    }

    pub fn stdin_path(&self) -> &Path {
        &self.stdin_path
    }

    pub fn stdout_path(&self) -> &Path {
        &self.stdout_path
    }

    pub fn stderr_path(&self) -> &Path {
        &self.stderr_path
    }

    pub fn program(&self) -> &OsString {
        &self.program
    }

    /// Arguments following the program name.
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Program name as it appears in log lines.
    pub fn display_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}
