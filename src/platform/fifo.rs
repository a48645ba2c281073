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

//! Classification of the standard input source.
//!
//! The input path is resolved once, before any fork, into an [`InputSource`]
//! that the relay later consumes. A missing path becomes a named pipe.

use crate::error::{ForkerError, Result};
use nix::errno::Errno;
use nix::sys::stat::Mode;
use nix::unistd::mkfifo;
use std::fs;
use std::io::ErrorKind;
use std::os::unix::fs::{FileTypeExt, PermissionsExt};
use std::path::{Path, PathBuf};

/// The resolved standard input source of a run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InputSource {
    path: PathBuf,
    is_pipe: bool,
}

impl InputSource {
    pub fn new(path: PathBuf, is_pipe: bool) -> Self {
        Self { path, is_pipe }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the source is a named pipe and should be reopened after each writer leaves.
    pub fn is_pipe(&self) -> bool {
        self.is_pipe
    }
}

/// Inspect `path`, creating a named pipe with `fifo_mode` permission bits when it is missing.
pub fn classify_input(path: &Path, fifo_mode: u32) -> Result<InputSource> {
    match fs::metadata(path) {
        Ok(metadata) => {
            let is_pipe = metadata.file_type().is_fifo();
            log::debug!(
                "Standard input source {path:?} exists ({})",
                if is_pipe { "named pipe" } else { "regular file" }
            );
            Ok(InputSource::new(path.to_path_buf(), is_pipe))
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {
            if create_fifo(path, fifo_mode)? {
                log::debug!("Created named pipe {path:?} with mode {fifo_mode:#o}");
                Ok(InputSource::new(path.to_path_buf(), true))
            } else {
                // Someone else created the node between stat and mkfifo.
                classify_existing(path)
            }
        }
        Err(source) => Err(ForkerError::InputInspect {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn classify_existing(path: &Path) -> Result<InputSource> {
    let metadata = fs::metadata(path).map_err(|source| ForkerError::InputInspect {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(InputSource::new(
        path.to_path_buf(),
        metadata.file_type().is_fifo(),
    ))
}

/// Returns `false` when the path already exists.
fn create_fifo(path: &Path, fifo_mode: u32) -> Result<bool> {
    let mode = Mode::from_bits_truncate(fifo_mode as libc::mode_t);
    match mkfifo(path, mode) {
        Ok(()) => {}
        Err(Errno::EEXIST) => return Ok(false),
        Err(source) => {
            return Err(ForkerError::FifoCreate {
                path: path.to_path_buf(),
                source,
            });
        }
    }

    // mkfifo is subject to the umask; apply the configured bits as given.
    fs::set_permissions(path, fs::Permissions::from_mode(fifo_mode))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::MetadataExt;

    fn mode_of(path: &Path) -> u32 {
        fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    #[test]
    fn missing_path_becomes_world_writable_fifo() {
        let temp_dir = tempfile::tempdir().expect("tempdir");
        let path = temp_dir.path().join("app.in");

        let source = classify_input(&path, 0o666).expect("classify");

        assert!(source.is_pipe());
        assert_eq!(source.path(), path);
        assert!(fs::metadata(&path).unwrap().file_type().is_fifo());
        assert_eq!(mode_of(&path), 0o666);
    }

    #[test]
    fn existing_fifo_is_kept_as_is() {
        let temp_dir = tempfile::tempdir().expect("tempdir");
        let path = temp_dir.path().join("app.in");
        mkfifo(&path, Mode::from_bits_truncate(0o600)).expect("mkfifo");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();

        let source = classify_input(&path, 0o666).expect("classify");

        assert!(source.is_pipe());
        assert_eq!(mode_of(&path), 0o600);
    }

    #[test]
    fn second_classification_does_not_recreate_pipe() {
        let temp_dir = tempfile::tempdir().expect("tempdir");
        let path = temp_dir.path().join("app.in");

        let first = classify_input(&path, 0o666).expect("first classify");
        let inode = fs::metadata(&path).unwrap().ino();
        let second = classify_input(&path, 0o666).expect("second classify");

        assert_eq!(first, second);
        assert_eq!(fs::metadata(&path).unwrap().ino(), inode);
    }

    #[test]
    fn regular_file_is_not_a_pipe() {
        let temp_dir = tempfile::tempdir().expect("tempdir");
        let path = temp_dir.path().join("input.txt");
        fs::write(&path, b"data").expect("write input");

        let source = classify_input(&path, 0o666).expect("classify");

        assert!(!source.is_pipe());
        assert_eq!(fs::read(&path).unwrap(), b"data");
    }

    #[test]
    fn stat_failure_other_than_missing_is_reported() {
        let temp_dir = tempfile::tempdir().expect("tempdir");
        let file = temp_dir.path().join("plain");
        fs::write(&file, b"").expect("write file");
        let below_file = file.join("app.in");

        let err = classify_input(&below_file, 0o666).expect_err("expected stat failure");

        match err {
            ForkerError::InputInspect { path, .. } => assert_eq!(path, below_file),
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn fifo_creation_failure_is_reported() {
        let temp_dir = tempfile::tempdir().expect("tempdir");
        let path = temp_dir.path().join("missing-dir").join("app.in");

        let err = classify_input(&path, 0o666).expect_err("expected mkfifo failure");

        assert!(matches!(err, ForkerError::FifoCreate { .. }));
    }
}
