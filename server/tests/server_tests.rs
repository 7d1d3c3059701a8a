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

//! End-to-end tests of the server binary

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};

const SERVER: &str = env!("CARGO_BIN_EXE_x0-server");

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn spawn(args: &[&str]) -> Child {
    Command::new(SERVER)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap()
}

fn connect_with_retry(port: u16) -> TcpStream {
    let address = SocketAddr::from(([127, 0, 0, 1], port));
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        match TcpStream::connect(address) {
            Ok(stream) => return stream,
            Err(err) if Instant::now() > deadline => panic!("server never listened: {err}"),
            Err(_) => std::thread::sleep(Duration::from_millis(20)),
        }
    }
}

fn read_until(stream: &mut TcpStream, needle: &[u8]) -> Vec<u8> {
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let mut received = Vec::new();
    let mut buf = [0u8; 256];
    while !received.windows(needle.len()).any(|w| w == needle) {
        let n = stream.read(&mut buf).unwrap();
        assert_ne!(n, 0, "connection closed before {needle:?} arrived");
        received.extend_from_slice(&buf[..n]);
    }
    received
}

fn interrupt(child: &Child, signal: libc::c_int) {
    let pid = libc::pid_t::try_from(child.id()).unwrap();
    assert_eq!(unsafe { libc::kill(pid, signal) }, 0);
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_echoes_lines_and_stops_on_sigint() {
    let port = free_port();
    let child = spawn(&["-l", &port.to_string()]);

    let mut client = connect_with_retry(port);
    client.write_all(b"hello\r\n").unwrap();
    read_until(&mut client, b"> hello\r\n");

    interrupt(&child, libc::SIGINT);
    let output = child.wait_with_output().unwrap();

    assert_eq!(output.status.code(), Some(0));
    let log = stderr_of(&output);
    assert!(log.contains(concat!("x0 RV32IM Simulator - v", env!("CARGO_PKG_VERSION"))));
    assert!(log.contains("line service listening on 127.0.0.1:"));
    assert!(log.contains("Stopping line service"));
    assert!(log.contains("Terminating"));
}

#[test]
fn test_sigterm_closes_sessions() {
    let port = free_port();
    let child = spawn(&["-q", "-l", &format!("127.0.0.1:{port}")]);

    let mut client = connect_with_retry(port);
    client.write_all(b"ping\n").unwrap();
    read_until(&mut client, b"> ping\r\n");

    interrupt(&child, libc::SIGTERM);
    let output = child.wait_with_output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert!(stderr_of(&output).is_empty());

    let mut rest = Vec::new();
    client
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    assert!(client.read_to_end(&mut rest).is_ok());
}

#[test]
fn test_bind_failure_exits_with_code() {
    let taken = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = taken.local_addr().unwrap().port();

    let output = spawn(&["-l", &port.to_string()]).wait_with_output().unwrap();

    assert_eq!(output.status.code(), Some(5));
    assert!(stderr_of(&output).contains("line service unable to start"));
    assert!(!stderr_of(&output).contains("Terminating"));
}

#[test]
fn test_conflicting_log_flags_are_rejected() {
    let output = spawn(&["-q", "-V"]).wait_with_output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_version_flag_prints_version() {
    let output = spawn(&["-v"]).wait_with_output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}
