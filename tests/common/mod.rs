#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const WAIT_LIMIT: Duration = Duration::from_secs(10);

/// A scratch directory holding the three stream paths of one launch.
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create scratch directory"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn input(&self) -> PathBuf {
        self.dir.path().join("app.in")
    }

    pub fn stdout(&self) -> PathBuf {
        self.dir.path().join("app.out")
    }

    pub fn stderr(&self) -> PathBuf {
        self.dir.path().join("app.err")
    }

    /// `forker <in> <out> <err>` ready for the worker command to be appended.
    pub fn forker(&self) -> Command {
        let mut cmd = forker();
        cmd.arg(self.input()).arg(self.stdout()).arg(self.stderr());
        cmd
    }
}

/// The forker binary with logging and configuration taken from defaults only.
pub fn forker() -> Command {
    let mut cmd = Command::cargo_bin("forker").unwrap();
    cmd.env_remove("RUST_LOG").env_remove("FORKER_CONFIG");
    cmd
}

/// The forker binary as a plain std command, for runs that must not wait on
/// the detached process.
pub fn forker_std() -> std::process::Command {
    let mut cmd = std::process::Command::new(assert_cmd::cargo::cargo_bin("forker"));
    cmd.env_remove("RUST_LOG").env_remove("FORKER_CONFIG");
    cmd
}

/// Poll `path` until its contents satisfy `done`, returning them.
pub fn wait_for_contents(path: &Path, done: impl Fn(&str) -> bool) -> String {
    let start = Instant::now();
    loop {
        let contents = fs::read_to_string(path).unwrap_or_default();
        if done(&contents) {
            return contents;
        }
        if start.elapsed() > WAIT_LIMIT {
            panic!(
                "Timed out waiting on {}; last contents: {contents:?}",
                path.display()
            );
        }
        thread::sleep(Duration::from_millis(20));
    }
}
