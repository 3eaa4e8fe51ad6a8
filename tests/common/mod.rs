#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use spacehook::{Logger, RunConfig};

/// In-memory writer for asserting on logger output.
#[derive(Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Capture {
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn lines_containing(&self, needle: &str) -> Vec<String> {
        self.lines().into_iter().filter(|l| l.contains(needle)).collect()
    }
}

pub fn config(workspace: &Path, token: Option<&str>, domain: Option<&str>) -> RunConfig {
    RunConfig {
        run_id: "run-42".into(),
        debug: false,
        api_token: token.map(str::to_string),
        domain: domain.map(str::to_string),
        workspace_root: workspace.to_path_buf(),
    }
}

pub fn plain_logger(config: &RunConfig) -> (Logger, Capture) {
    let capture = Capture::default();
    let logger = Logger::new("test_plugin", config)
        .without_color()
        .to_writer(capture.clone());
    (logger, capture)
}

#[derive(Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

/// One-shot HTTP server answering a single request with a canned response.
pub struct StubServer {
    pub base: String,
    requests: Receiver<RecordedRequest>,
    handle: Option<JoinHandle<()>>,
}

impl StubServer {
    pub fn respond(status: u16, body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = mpsc::channel();
        let body = body.to_string();

        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let mut parts = request_line.split_whitespace();
            let method = parts.next().unwrap_or_default().to_string();
            let path = parts.next().unwrap_or_default().to_string();

            let mut headers = HashMap::new();
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((k, v)) = line.split_once(':') {
                    headers.insert(k.trim().to_ascii_lowercase(), v.trim().to_string());
                }
            }

            let len: usize = headers
                .get("content-length")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            let mut buf = vec![0u8; len];
            reader.read_exact(&mut buf).unwrap();

            tx.send(RecordedRequest {
                method,
                path,
                headers,
                body: String::from_utf8(buf).unwrap(),
            })
            .unwrap();

            let mut stream = stream;
            let response = format!(
                "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        });

        Self {
            base,
            requests: rx,
            handle: Some(handle),
        }
    }

    pub fn request(mut self) -> RecordedRequest {
        let request = self.requests.recv().unwrap();
        if let Some(handle) = self.handle.take() {
            handle.join().unwrap();
        }
        request
    }
}
