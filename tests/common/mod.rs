//! Common test utilities for lookout integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't pollute the
//! user's `~/.local/share/lookout/` directory, and `MockTracker`, a minimal
//! in-process HTTP server that plays the tracker service with canned JSON
//! responses.

#![allow(dead_code)]

use assert_cmd::Command;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
pub use tempfile::TempDir;

/// A test environment with an isolated data directory.
///
/// The `lkt()` method returns a `Command` with `LOOKOUT_DATA_DIR` pointed at
/// a temp dir and all other lookout-relevant environment scrubbed, making
/// tests parallel-safe and independent of the host environment.
pub struct TestEnv {
    pub data_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with an isolated data directory.
    pub fn new() -> Self {
        Self {
            data_dir: TempDir::new().unwrap(),
        }
    }

    /// Get a Command for the lkt binary pointed at the given tracker URL.
    pub fn lkt(&self, base_url: &str) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_lkt"));
        cmd.env("LOOKOUT_DATA_DIR", self.data_dir.path());
        cmd.env("LOOKOUT_BASE_URL", base_url);
        cmd.env_remove("LOOKOUT_TOKEN");
        cmd.env_remove("LOOKOUT_COOLING_THRESHOLD");
        cmd.env_remove("LOOKOUT_COOLING_DAYS");
        // The localhost guard must not trip when the suite runs in CI.
        cmd.env_remove("GITHUB_ACTIONS");
        cmd
    }

    /// Get the path to the data directory.
    pub fn data_path(&self) -> &std::path::Path {
        self.data_dir.path()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// A canned response for the mock tracker. `path` may contain a single `*`
/// wildcard segment (e.g. `/api/nodes/*/estimate-status`).
pub struct Route {
    pub method: &'static str,
    pub path: &'static str,
    pub status: u16,
    pub body: String,
}

impl Route {
    pub fn ok(method: &'static str, path: &'static str, body: serde_json::Value) -> Self {
        Self {
            method,
            path,
            status: 200,
            body: body.to_string(),
        }
    }

    pub fn error(method: &'static str, path: &'static str, status: u16, body: serde_json::Value) -> Self {
        Self {
            method,
            path,
            status,
            body: body.to_string(),
        }
    }
}

/// One request as seen by the mock tracker.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<String>,
    pub body: String,
}

impl RecordedRequest {
    /// Case-insensitive check for a header line containing the fragment.
    pub fn has_header(&self, fragment: &str) -> bool {
        let needle = fragment.to_lowercase();
        self.headers.iter().any(|h| h.to_lowercase().contains(&needle))
    }
}

/// A minimal single-threaded HTTP server serving canned JSON responses.
///
/// Requests are handled sequentially, which matches the client's sequential
/// call pattern. Unmatched requests get a JSON 404.
pub struct MockTracker {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockTracker {
    /// Bind a loopback port and start serving the given routes.
    pub fn start(routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock tracker");
        let addr = listener.local_addr().expect("local addr");
        let requests: Arc<Mutex<Vec<RecordedRequest>>> = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                // A torn connection only loses that one exchange.
                let _ = handle_connection(stream, &routes, &recorded);
            }
        });

        Self { addr, requests }
    }

    /// Base URL to point the CLI at.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Everything the tracker has been asked so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn handle_connection(
    stream: TcpStream,
    routes: &[Route],
    recorded: &Arc<Mutex<Vec<RecordedRequest>>>,
) -> std::io::Result<()> {
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut headers = Vec::new();
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end().to_string();
        if line.is_empty() {
            break;
        }
        let lower = line.to_lowercase();
        if let Some(value) = lower.strip_prefix("content-length:") {
            content_length = value.trim().parse().unwrap_or(0);
        }
        headers.push(line);
    }

    let mut body_bytes = vec![0u8; content_length];
    if content_length > 0 {
        reader.read_exact(&mut body_bytes)?;
    }
    let body = String::from_utf8_lossy(&body_bytes).to_string();

    recorded.lock().unwrap().push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        headers,
        body,
    });

    let (status, response_body) = match routes
        .iter()
        .find(|r| r.method == method && path_matches(r.path, &path))
    {
        Some(route) => (route.status, route.body.clone()),
        None => (
            404,
            serde_json::json!({"ok": false, "error": "not found"}).to_string(),
        ),
    };
    let reason = if status < 400 { "OK" } else { "Error" };

    write!(
        writer,
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        response_body.len(),
        response_body
    )?;
    writer.flush()?;
    Ok(())
}

/// Match a path against a pattern with at most one `*` wildcard.
fn path_matches(pattern: &str, path: &str) -> bool {
    match pattern.split_once('*') {
        Some((prefix, suffix)) => {
            path.starts_with(prefix)
                && path.ends_with(suffix)
                && path.len() >= prefix.len() + suffix.len()
        }
        None => pattern == path,
    }
}
