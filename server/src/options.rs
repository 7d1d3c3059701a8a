//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Command-line options

use clap::{ArgAction, Parser};
use std::net::SocketAddrV4;
use x0_runtime::Priority;
use x0_service::{DEFAULT_MAX_CONNECTIONS, parse_bind_address};

/// Bind address of the line service unless `-l` is given.
pub const DEFAULT_LINE_ADDRESS: &str = "127.0.0.1:2323";

#[derive(Parser, Debug)]
#[command(
    name = "x0-server",
    author,
    version,
    about = "x0 RV32IM simulator host",
    long_about = "Runs the x0 host event loop with a telnet line service.\n\nSIGINT, SIGTERM and SIGQUIT shut the host down cleanly.\n\nExamples:\n  x0-server\n  x0-server -l 0.0.0.0:2323 -c 8\n  x0-server -V -l 4000",
    disable_version_flag = true
)]
pub struct Options {
    /// Bind the telnet line service to [ADDRESS:]PORT.
    #[arg(
        short = 'l',
        long = "line",
        value_name = "[ADDRESS:]PORT",
        default_value = DEFAULT_LINE_ADDRESS,
        value_parser = parse_line_address
    )]
    pub line: SocketAddrV4,

    /// Maximum number of concurrent line sessions.
    #[arg(
        short = 'c',
        long,
        value_name = "N",
        default_value_t = DEFAULT_MAX_CONNECTIONS,
        value_parser = parse_max_connections
    )]
    pub max_connections: usize,

    /// Quiet log output (only log errors).
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose log output (includes debugging messages).
    #[arg(short = 'V', long)]
    pub verbose: bool,

    /// Print version info and terminate.
    #[arg(short = 'v', long, action = ArgAction::Version)]
    version: Option<bool>,
}

impl Options {
    /// Minimum log priority selected by `-q` and `-V`.
    pub fn min_priority(&self) -> Priority {
        if self.quiet {
            Priority::Error
        } else if self.verbose {
            Priority::Detail
        } else {
            Priority::Info
        }
    }
}

fn parse_line_address(arg: &str) -> Result<SocketAddrV4, String> {
    parse_bind_address(arg).map_err(|err| format!("Invalid address:port ({err})"))
}

fn parse_max_connections(arg: &str) -> Result<usize, String> {
    match arg.parse::<usize>() {
        Ok(0) => Err("must be greater than 0".to_string()),
        Ok(max) => Ok(max),
        Err(err) => Err(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use clap::error::ErrorKind;
    use std::net::Ipv4Addr;

    fn parse(args: &[&str]) -> Result<Options, clap::Error> {
        Options::try_parse_from(std::iter::once("x0-server").chain(args.iter().copied()))
    }

    #[test]
    fn test_command_is_well_formed() {
        Options::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let options = parse(&[]).unwrap();
        assert_eq!(options.line, SocketAddrV4::new(Ipv4Addr::LOCALHOST, 2323));
        assert_eq!(options.max_connections, 64);
        assert_eq!(options.min_priority(), Priority::Info);
    }

    #[test]
    fn test_line_address() {
        let options = parse(&["-l", "4000"]).unwrap();
        assert_eq!(options.line, SocketAddrV4::new(Ipv4Addr::LOCALHOST, 4000));

        let options = parse(&["--line", "0.0.0.0:23"]).unwrap();
        assert_eq!(options.line, SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 23));

        let err = parse(&["-l", "127.0.0.1:99999"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_max_connections() {
        assert_eq!(parse(&["-c", "3"]).unwrap().max_connections, 3);
        assert!(parse(&["-c", "0"]).is_err());
        assert!(parse(&["-c", "many"]).is_err());
    }

    #[test]
    fn test_log_priority_flags() {
        assert_eq!(parse(&["-q"]).unwrap().min_priority(), Priority::Error);
        assert_eq!(parse(&["-V"]).unwrap().min_priority(), Priority::Detail);

        let err = parse(&["-q", "-V"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_version_flag() {
        let err = parse(&["-v"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
    }
}
