//! Shared helpers for integration tests: a scripted raw-socket HTTP server,
//! a socket availability guard for wiremock-based tests, and a way to run the
//! blocking transfer from inside an async test.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::panic::Location;
use std::thread::{self, JoinHandle};

use rangeget::{DownloadError, DownloadTask, TransferOutcome};
use wiremock::MockServer;

/// Returns true when tests must fail instead of skipping without sockets.
#[must_use]
pub fn socket_tests_required() -> bool {
    std::env::var("RANGEGET_REQUIRE_SOCKET_TESTS")
        .ok()
        .is_some_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Returns true (after logging why) when localhost sockets are unavailable.
#[track_caller]
#[must_use]
pub fn should_skip_socket_bound_test() -> bool {
    if TcpListener::bind("127.0.0.1:0").is_ok() {
        return false;
    }

    let location = Location::caller();
    let message = format!(
        "[socket-bound-test] cannot bind localhost socket at {}:{}",
        location.file(),
        location.line()
    );
    if socket_tests_required() {
        panic!("{message}. Set RANGEGET_REQUIRE_SOCKET_TESTS=0 to allow local skip behavior.");
    }

    eprintln!("{message}. Skipping test.");
    true
}

/// Starts a wiremock server, or returns `None` when sockets are unavailable.
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if should_skip_socket_bound_test() {
        None
    } else {
        Some(MockServer::start().await)
    }
}

/// Runs `try_transfer` on the blocking pool and hands the task back.
pub async fn run_transfer<U: Send + 'static>(
    mut task: DownloadTask<U>,
) -> (Result<TransferOutcome, DownloadError>, DownloadTask<U>) {
    tokio::task::spawn_blocking(move || {
        let result = task.try_transfer();
        (result, task)
    })
    .await
    .expect("blocking transfer panicked")
}

/// Runs `remote_size` on the blocking pool and hands the task back.
pub async fn run_remote_size<U: Send + 'static>(mut task: DownloadTask<U>) -> (u64, DownloadTask<U>) {
    tokio::task::spawn_blocking(move || {
        let size = task.remote_size();
        (size, task)
    })
    .await
    .expect("blocking size query panicked")
}

/// Builds a raw HTTP response from a status line, header lines and a body.
#[must_use]
pub fn raw_response(status_line: &str, headers: &[&str], body: &[u8]) -> Vec<u8> {
    let mut response = format!("{status_line}\r\n");
    for header in headers {
        response.push_str(header);
        response.push_str("\r\n");
    }
    response.push_str("\r\n");
    let mut bytes = response.into_bytes();
    bytes.extend_from_slice(body);
    bytes
}

/// Plain TCP server that answers each accepted connection with the next
/// scripted response, byte for byte, then closes it.
pub struct ScriptedServer {
    host: String,
    handle: JoinHandle<Vec<String>>,
}

impl ScriptedServer {
    /// Binds to a free localhost port and serves `responses` in order.
    #[must_use]
    pub fn start(responses: Vec<Vec<u8>>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind scripted server");
        let host = listener
            .local_addr()
            .expect("scripted server address")
            .to_string();

        let handle = thread::spawn(move || {
            let mut requests = Vec::new();
            for response in responses {
                let (mut stream, _) = listener.accept().expect("accept connection");
                requests.push(read_request(&mut stream));
                stream.write_all(&response).expect("write scripted response");
                stream.flush().expect("flush scripted response");
            }
            requests
        });

        Self { host, handle }
    }

    /// `host:port` the server listens on.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// URL for `path` on this server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.host)
    }

    /// Waits for every scripted response to be served and returns the raw requests.
    #[must_use]
    pub fn finish(self) -> Vec<String> {
        self.handle.join().expect("scripted server panicked")
    }
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut request = Vec::new();
    let mut chunk = [0u8; 1024];
    while !request.windows(4).any(|window| window == b"\r\n\r\n") {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => break,
            Ok(n) => request.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&request).into_owned()
}
