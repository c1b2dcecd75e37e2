//! Minimal HTTP/1.1 server standing in for the CDN and the manifest API.
//!
//! Serves fixed bodies by path. HEAD answers with Content-Length (or 405 when
//! HEAD is blocked); GET honours `Range: bytes=a-b` with 206. Unknown paths
//! are 404.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    /// If false, HEAD returns 405 (hosts that only answer GET).
    pub head_allowed: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self { head_allowed: true }
    }
}

/// Running server: base URL plus a log of `"METHOD /path"` lines.
pub struct CdnServer {
    pub base: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl CdnServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn start(routes: Vec<(&str, Vec<u8>)>) -> CdnServer {
    start_with_options(routes, ServerOptions::default())
}

/// Starts the server on an ephemeral port. Runs until the process exits.
pub fn start_with_options(routes: Vec<(&str, Vec<u8>)>, opts: ServerOptions) -> CdnServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let routes: Arc<HashMap<String, Vec<u8>>> =
        Arc::new(routes.into_iter().map(|(p, b)| (p.to_string(), b)).collect());
    let requests = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            let log = Arc::clone(&log);
            thread::spawn(move || handle(stream, &routes, &log, opts));
        }
    });
    CdnServer {
        base: format!("http://127.0.0.1:{}", port),
        requests,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    routes: &HashMap<String, Vec<u8>>,
    log: &Mutex<Vec<String>>,
    opts: ServerOptions,
) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let (method, path, range) = parse_request(request);
    log.lock().unwrap().push(format!("{} {}", method, path));

    let Some(body) = routes.get(path) else {
        let _ = stream.write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n");
        return;
    };
    let total = body.len() as u64;

    if method.eq_ignore_ascii_case("HEAD") {
        if !opts.head_allowed {
            let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
            return;
        }
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nAccept-Ranges: bytes\r\n\r\n",
            total
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
        return;
    }

    let (status, extra, slice) = match range {
        Some((start, end_incl)) if start < total => {
            let end_excl = end_incl.saturating_add(1).min(total);
            (
                "206 Partial Content",
                format!("Content-Range: bytes {}-{}/{}\r\n", start, end_excl - 1, total),
                &body[start as usize..end_excl as usize],
            )
        }
        Some(_) => (
            "416 Range Not Satisfiable",
            format!("Content-Range: bytes */{}\r\n", total),
            &body[0..0],
        ),
        None => ("200 OK", String::new(), body.as_slice()),
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nAccept-Ranges: bytes\r\n{}\r\n",
        status,
        slice.len(),
        extra
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(slice);
}

/// Returns (method, path without query, optional inclusive byte range).
fn parse_request(request: &str) -> (&str, &str, Option<(u64, u64)>) {
    let mut lines = request.lines();
    let mut first = lines.next().unwrap_or("").split_whitespace();
    let method = first.next().unwrap_or("");
    let target = first.next().unwrap_or("/");
    let path = target.split('?').next().unwrap_or(target);

    let mut range = None;
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case("range") {
            continue;
        }
        if let Some(spec) = value.trim().strip_prefix("bytes=") {
            if let Some((a, b)) = spec.split_once('-') {
                let start = a.trim().parse::<u64>().unwrap_or(0);
                let end = b.trim().parse::<u64>().unwrap_or(u64::MAX);
                range = Some((start, end));
            }
        }
    }
    (method, path, range)
}
