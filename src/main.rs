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

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use forker::config::ForkerConfig;
use forker::error::{ForkerError, Result, format_error_chain, get_exit_code};
use forker::launch::LaunchRequest;
use forker::logging;
use forker::platform::classify_input;
use forker::supervisor::{Launch, Supervisor};
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "forker")]
#[command(
    author,
    version,
    about = "Run a program detached, with its standard streams bound to files",
    long_about = "Runs the given executable in a detached mode, redirecting its standard input \
                  and output/error to the given files.

If STDIN does not exist a named pipe is created there. A named pipe is reopened \
every time its writer disconnects, so several writers can feed the same program \
one after another. STDOUT and STDERR are appended to, never truncated."
)]
struct Cli {
    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (defaults to $FORKER_CONFIG)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Named pipe (created if missing) or regular file to feed as standard input
    #[arg(value_name = "STDIN")]
    stdin: PathBuf,

    /// File receiving standard output
    #[arg(value_name = "STDOUT")]
    stdout: PathBuf,

    /// File receiving standard error
    #[arg(value_name = "STDERR")]
    stderr: PathBuf,

    /// Executable to run, followed by its arguments
    #[arg(
        value_name = "EXECUTABLE",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    command: Vec<OsString>,
}

fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.kind() == ErrorKind::MissingRequiredArgument => {
            println!("{}", Cli::command().render_help());
            std::process::exit(1);
        }
        Err(e) => e.exit(),
    }
}

fn main() {
    let cli = parse_cli();

    // Initialize logger based on CLI flags and environment
    logging::setup_logger(cli.verbose);

    let result: Result<i32> = (|| {
        let config = ForkerConfig::resolve(cli.config.as_deref())?;

        let request = LaunchRequest::from_command(cli.stdin, cli.stdout, cli.stderr, cli.command)
            .ok_or_else(|| ForkerError::SystemError("No executable given".to_string()))?;

        let source = classify_input(request.stdin_path(), config.fifo.mode)?;

        match Supervisor::new(request, source, config).launch()? {
            Launch::Detached { .. } => Ok(0),
            Launch::Finished(report) => Ok(report.code()),
        }
    })();

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}", format_error_chain(&e));
            std::process::exit(get_exit_code(&e));
        }
    }
}
