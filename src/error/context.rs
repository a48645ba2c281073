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

use crate::error::ForkerError;
use crate::logging::LOG_PREFIX;
use std::fmt;
use std::io::ErrorKind;

pub struct ErrorContext<'a> {
    pub error: &'a ForkerError,
    pub suggestion: Option<String>,
    pub details: Option<String>,
}

impl<'a> ErrorContext<'a> {
    pub fn new(error: &'a ForkerError) -> Self {
        let (suggestion, details) = match error {
            ForkerError::ConfigFile(_) | ForkerError::InvalidConfig(_) => {
                let suggestion = Some(
                    "Check the file passed with --config or named by FORKER_CONFIG.".to_string(),
                );
                (suggestion, None)
            }
            ForkerError::InputInspect { path, source } => {
                let suggestion = if source.kind() == ErrorKind::PermissionDenied {
                    Some(format!(
                        "Ensure you can search the directory containing: {}",
                        path.display()
                    ))
                } else {
                    Some(
                        "Pass an existing regular file, an existing named pipe, or a path where \
                         a named pipe can be created."
                            .to_string(),
                    )
                };
                let details = Some(format!(
                    "Unable to tell whether {} is a named pipe.",
                    path.display()
                ));
                (suggestion, details)
            }
            ForkerError::FifoCreate { path, .. } => {
                let suggestion = Some(format!(
                    "Ensure the parent directory is writable, or create the pipe yourself: \
                     mkfifo {}",
                    path.display()
                ));
                (suggestion, None)
            }
            ForkerError::OpenTarget { path, .. } => {
                let suggestion = Some(format!(
                    "Ensure the directory exists and you have write permissions to: {}",
                    path.display()
                ));
                (suggestion, None)
            }
            ForkerError::Exec { program, source } => {
                let suggestion = if source.kind() == ErrorKind::NotFound {
                    Some(format!(
                        "Ensure '{program}' is installed and on PATH, or pass its absolute path."
                    ))
                } else {
                    Some(format!("Ensure '{program}' is executable."))
                };
                (suggestion, None)
            }
            ForkerError::RelayOpen { path, .. } | ForkerError::RelayRead { path, .. } => {
                let details = Some(format!(
                    "Forwarding from {} stopped; the worker keeps running without further input.",
                    path.display()
                ));
                (None, details)
            }
            _ => (None, None),
        };

        ErrorContext {
            error,
            suggestion,
            details,
        }
    }
}

impl<'a> fmt::Display for ErrorContext<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{LOG_PREFIX}{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\n{LOG_PREFIX}Details: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n{LOG_PREFIX}Suggestion: {suggestion}")?;
        }

        Ok(())
    }
}
