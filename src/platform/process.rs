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

//! Program replacement for the worker.

use crate::error::ForkerError;
use std::ffi::{OsStr, OsString};
use std::os::unix::process::CommandExt;
use std::process::Command;

/// Replace the current process image with `program`, looked up through `PATH`.
///
/// The replaced process inherits the current standard streams, environment and
/// working directory. `SIGPIPE` is restored to its default disposition.
pub fn exec_replace(program: &OsStr, args: &[OsString]) -> ForkerError {
    // exec() only returns on error
    let source = Command::new(program).args(args).exec();
    ForkerError::Exec {
        program: program.to_string_lossy().into_owned(),
        source,
    }
}
