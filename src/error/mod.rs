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

mod context;
mod exit_codes;
mod format;

pub use context::ErrorContext;
pub use exit_codes::get_exit_code;
pub use format::format_error_chain;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForkerError {
    #[error("Configuration file error: {0}")]
    ConfigFile(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("stat {}: {source}", .path.display())]
    InputInspect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("mkfifo {}: {source}", .path.display())]
    FifoCreate {
        path: PathBuf,
        #[source]
        source: nix::Error,
    },

    #[error("fork: {0}")]
    Fork(#[source] nix::Error),

    #[error("setsid: {0}")]
    Session(#[source] nix::Error),

    #[error("Failed to create relay channel: {0}")]
    Pipe(#[source] nix::Error),

    #[error("open {}: {source}", .path.display())]
    OpenTarget {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to rebind {stream}: {source}")]
    Redirect {
        stream: &'static str,
        #[source]
        source: nix::Error,
    },

    #[error("exec {program}: {source}")]
    Exec {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Standard input source open error on {}: {source}", .path.display())]
    RelayOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Standard input source read error on {}: {source}", .path.display())]
    RelayRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Process write error: {0}")]
    RelayWrite(#[source] std::io::Error),

    #[error("wait: {0}")]
    Wait(#[source] nix::Error),

    #[error("System error: {0}")]
    SystemError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ForkerError>;
