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

mod common;

use common::{Scratch, forker_std, wait_for_contents};
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::path::Path;
use std::process::Stdio;

fn write_session(fifo: &Path, data: &[u8]) {
    let mut writer = OpenOptions::new()
        .write(true)
        .open(fifo)
        .expect("open fifo for writing");
    writer.write_all(data).expect("write to fifo");
}

#[test]
fn test_missing_input_becomes_persistent_fifo() {
    let scratch = Scratch::new();

    scratch.forker().arg("true").assert().success();

    let metadata = fs::metadata(scratch.input()).unwrap();
    assert!(metadata.file_type().is_fifo());
    assert_eq!(metadata.permissions().mode() & 0o777, 0o666);
    let inode = metadata.ino();

    // A second run reuses the same pipe.
    scratch.forker().arg("true").assert().success();

    let metadata = fs::metadata(scratch.input()).unwrap();
    assert!(metadata.file_type().is_fifo());
    assert_eq!(metadata.ino(), inode);
}

#[test]
fn test_sequential_writers_feed_one_worker() {
    let scratch = Scratch::new();

    let status = forker_std()
        .arg(scratch.input())
        .arg(scratch.stdout())
        .arg(scratch.stderr())
        .args(["head", "-c", "10"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .unwrap();
    assert!(status.success());

    // The caller created the pipe before detaching.
    write_session(&scratch.input(), b"hello");
    write_session(&scratch.input(), b"world");

    let received = wait_for_contents(&scratch.stdout(), |s| s.len() >= 10);
    assert_eq!(received, "helloworld");
}

#[test]
fn test_long_running_worker_never_sees_end_of_input_between_writers() {
    let scratch = Scratch::new();
    let log = scratch.path().join("forker.log");

    let status = forker_std()
        .arg(scratch.input())
        .arg(scratch.stdout())
        .arg(scratch.stderr())
        .arg("cat")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(File::create(&log).unwrap())
        .status()
        .unwrap();
    assert!(status.success());

    write_session(&scratch.input(), b"hello");
    write_session(&scratch.input(), b"world");
    let received = wait_for_contents(&scratch.stdout(), |s| s.len() >= 10);
    assert_eq!(received, "helloworld");

    // cat exits on end-of-input, so a third delivery only lands if none came.
    write_session(&scratch.input(), b"!");
    wait_for_contents(&scratch.stdout(), |s| s == "helloworld!");
    assert!(!fs::read_to_string(&log).unwrap().contains("terminated pid"));

    let started = wait_for_contents(&log, |s| s.contains("started with pid "));
    let pid: i32 = started
        .lines()
        .find_map(|line| line.strip_prefix("forker: cat ;; started with pid "))
        .expect("start line")
        .trim()
        .parse()
        .unwrap();
    kill(Pid::from_raw(pid), Signal::SIGTERM).unwrap();

    let lines = wait_for_contents(&log, |s| s.contains("terminated pid") && s.ends_with('\n'));
    assert!(lines.contains(&format!("forker: cat ;; terminated pid {pid} with status 143")));
}

#[test]
fn test_worker_exit_is_reported_while_relay_waits_for_writer() {
    let scratch = Scratch::new();
    let log = scratch.path().join("forker.log");

    let status = forker_std()
        .arg(scratch.input())
        .arg(scratch.stdout())
        .arg(scratch.stderr())
        .args(["head", "-c", "5"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(File::create(&log).unwrap())
        .status()
        .unwrap();
    assert!(status.success());

    write_session(&scratch.input(), b"hello and a lot more after it");

    let lines = wait_for_contents(&log, |s| s.contains("terminated pid") && s.ends_with('\n'));
    assert!(lines.contains("forker: head ;; started with pid "));
    assert!(lines.contains("with status 0"));
    assert!(!lines.contains("Process write error"));
    assert_eq!(fs::read_to_string(scratch.stdout()).unwrap(), "hello");
}
