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

//! Forwarding of the input source into the worker's standard input.
//!
//! A regular file is read once. A named pipe is reopened every time its
//! current writer disconnects, so successive writers feed the same worker
//! without it ever seeing end-of-input. Forwarding stops for good only when a
//! write into the relay channel fails with a broken pipe, which means the
//! worker closed its standard input.

use crate::error::{ForkerError, Result, format_error_chain, get_exit_code};
use crate::platform::InputSource;
use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::thread::{self, JoinHandle};

/// Summary of a finished relay.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RelayOutcome {
    /// Bytes delivered into the relay channel.
    pub bytes: u64,
    /// Number of times the input source was opened.
    pub sessions: u32,
    /// The worker closed its standard input.
    pub worker_closed: bool,
}

pub struct InputRelay {
    source: InputSource,
    buffer_size: usize,
}

impl InputRelay {
    pub fn new(source: InputSource, buffer_size: usize) -> Self {
        Self {
            source,
            buffer_size: buffer_size.max(1),
        }
    }

    /// Run the relay on a detached background thread.
    ///
    /// A fatal relay error terminates the whole process with the error's exit
    /// code; the thread is never joined.
    pub fn spawn(self, channel: File) -> Result<JoinHandle<()>> {
        let handle = thread::Builder::new()
            .name("input-relay".to_string())
            .spawn(move || match self.run(channel) {
                Ok(outcome) => log::debug!(
                    "Relay finished: {} bytes over {} session(s), worker closed input: {}",
                    outcome.bytes,
                    outcome.sessions,
                    outcome.worker_closed
                ),
                Err(e) => {
                    eprintln!("{}", format_error_chain(&e));
                    std::process::exit(get_exit_code(&e));
                }
            })?;
        Ok(handle)
    }

    /// Copy the source into `channel` until the source is exhausted (regular
    /// file) or the worker stops reading (named pipe).
    ///
    /// `channel` is dropped, closing the worker's input, only after the loop
    /// has stopped for good.
    pub fn run<W: Write>(&self, mut channel: W) -> Result<RelayOutcome> {
        let mut buf = vec![0u8; self.buffer_size];
        let mut outcome = RelayOutcome::default();

        loop {
            // Opening a named pipe blocks until a writer shows up.
            let mut input =
                File::open(self.source.path()).map_err(|source| ForkerError::RelayOpen {
                    path: self.source.path().to_path_buf(),
                    source,
                })?;
            outcome.sessions += 1;
            log::trace!(
                "Opened {:?} (session {})",
                self.source.path(),
                outcome.sessions
            );

            loop {
                let n = match input.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(source) => {
                        return Err(ForkerError::RelayRead {
                            path: self.source.path().to_path_buf(),
                            source,
                        });
                    }
                };

                match channel.write_all(&buf[..n]) {
                    Ok(()) => outcome.bytes += n as u64,
                    Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                        log::debug!("Worker closed its standard input");
                        outcome.worker_closed = true;
                        break;
                    }
                    Err(e) => return Err(ForkerError::RelayWrite(e)),
                }
            }
            drop(input);

            if !self.source.is_pipe() || outcome.worker_closed {
                break;
            }
            log::trace!("Writer left {:?}, reopening", self.source.path());
        }

        drop(channel);
        Ok(outcome)
    }
}
