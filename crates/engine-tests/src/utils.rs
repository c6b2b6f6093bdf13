use connectors::{
    error::{SinkError, SourceError},
    sink::{BatchSink, SinkFactory},
    source::RowSource,
};
use engine_config::settings::TransferSettings;
use model::records::Batch;
use serde_json::Value;
use std::{
    io::{Read, Write},
    net::{TcpListener, TcpStream},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

pub const SOURCE_TABLE: &str = "events";
pub const DEST_TABLE: &str = "events_copy";
pub const DEST_DB: &str = "analytics";

/// Settings pointing at a fake endpoint, with backoff disabled so retry
/// scenarios run instantly.
pub fn settings(batch_size: usize, workers: usize, max_retries: usize) -> TransferSettings {
    let mut settings = TransferSettings::new(SOURCE_TABLE, DEST_TABLE, "127.0.0.1", 9175, DEST_DB);
    settings.batch_size = batch_size;
    settings.workers = workers;
    settings.max_retries = max_retries;
    settings.retry_step = Duration::ZERO;
    settings.retry_cap = Duration::ZERO;
    settings.status_interval = Duration::from_millis(10);
    settings.request_timeout = Duration::from_secs(5);
    settings
}

/// In-memory table: `id` and `payload` columns, rows numbered from zero.
pub struct MemorySource {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    fail_after: Option<usize>,
    pub rows_streamed: usize,
    pub queries: Vec<String>,
}

impl MemorySource {
    pub fn with_rows(count: usize) -> Self {
        Self {
            columns: vec!["id".to_string(), "payload".to_string()],
            rows: (0..count)
                .map(|i| vec![i.to_string(), format!("value \"{i}\"")])
                .collect(),
            fail_after: None,
            rows_streamed: 0,
            queries: Vec::new(),
        }
    }

    /// Breaks the result set after `rows` rows have been handed out.
    pub fn failing_after(mut self, rows: usize) -> Self {
        self.fail_after = Some(rows);
        self
    }
}

impl RowSource for MemorySource {
    fn list_columns(&mut self, table: &str) -> Result<Vec<String>, SourceError> {
        if table != SOURCE_TABLE {
            return Err(SourceError::UnknownTable(table.to_string()));
        }
        Ok(self.columns.clone())
    }

    fn stream_rows(
        &mut self,
        query: &str,
        on_row: &mut dyn FnMut(&[String]) -> bool,
    ) -> Result<(), SourceError> {
        self.queries.push(query.to_string());
        for (i, row) in self.rows.iter().enumerate() {
            if self.fail_after == Some(i) {
                return Err(SourceError::Other("Lost connection to MySQL server".to_string()));
            }
            self.rows_streamed += 1;
            if !on_row(row) {
                break;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Respond {
    /// Every attempt gets this HTTP status.
    Always(u16),
    /// The first `n` attempts fail with 503, the rest succeed.
    FailFirst(usize),
    /// Accept after sleeping, to keep workers busy.
    Slow(Duration),
    /// Client construction fails in every worker.
    NoClient,
    /// The sink panics on its first delivery.
    Panic,
}

/// Sink factory that records what reached the "endpoint".
pub struct RecordingSinks {
    respond: Respond,
    attempts: Arc<AtomicUsize>,
    accepted: Arc<Mutex<Vec<Batch>>>,
}

impl RecordingSinks {
    pub fn new(respond: Respond) -> Arc<Self> {
        Arc::new(Self {
            respond,
            attempts: Arc::new(AtomicUsize::new(0)),
            accepted: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Accepted batches in sequence order.
    pub fn accepted(&self) -> Vec<Batch> {
        let mut batches = self.accepted.lock().unwrap().clone();
        batches.sort_by_key(Batch::seq);
        batches
    }

    pub fn accepted_rows(&self) -> usize {
        self.accepted().iter().map(Batch::row_count).sum()
    }
}

impl SinkFactory for RecordingSinks {
    fn connect(&self) -> Result<Box<dyn BatchSink>, SinkError> {
        if let Respond::NoClient = self.respond {
            return Err(SinkError::Init("TLS backend unavailable".to_string()));
        }
        Ok(Box::new(RecordingSink {
            respond: self.respond,
            attempts: self.attempts.clone(),
            accepted: self.accepted.clone(),
        }))
    }

    fn endpoint(&self) -> &str {
        "memory://insert"
    }
}

struct RecordingSink {
    respond: Respond,
    attempts: Arc<AtomicUsize>,
    accepted: Arc<Mutex<Vec<Batch>>>,
}

impl BatchSink for RecordingSink {
    fn deliver(&mut self, batch: &Batch) -> Result<(), SinkError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        let status = match self.respond {
            Respond::Always(status) => status,
            Respond::FailFirst(n) if attempt < n => 503,
            Respond::FailFirst(_) => 201,
            Respond::Slow(delay) => {
                thread::sleep(delay);
                201
            }
            Respond::NoClient => unreachable!("no sink is ever built"),
            Respond::Panic => panic!("sink crashed on batch {}", batch.seq()),
        };

        if status != 201 {
            return Err(SinkError::Rejected {
                status,
                body: "unavailable".to_string(),
            });
        }
        self.accepted.lock().unwrap().push(batch.clone());
        Ok(())
    }
}

/// The `data.id` of every record in the batch, in payload order.
pub fn record_ids(batch: &Batch) -> Vec<String> {
    let body: Value = serde_json::from_str(&batch.to_json_array()).unwrap();
    body.as_array()
        .unwrap()
        .iter()
        .map(|record| record["data"]["id"].as_str().unwrap().to_string())
        .collect()
}

/// Minimal HTTP/1.1 ingestion endpoint on a loopback port.
///
/// Answers every request with the next status from `statuses` (the last one
/// repeats) and keeps the bodies of the requests it answered with 201.
pub struct FakeEndpoint {
    pub port: u16,
    bodies: Arc<Mutex<Vec<String>>>,
    headers: Arc<Mutex<Vec<String>>>,
}

impl FakeEndpoint {
    pub fn start(statuses: Vec<u16>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let bodies = Arc::new(Mutex::new(Vec::new()));
        let headers = Arc::new(Mutex::new(Vec::new()));

        {
            let bodies = bodies.clone();
            let headers = headers.clone();
            thread::spawn(move || {
                let mut served = 0;
                for stream in listener.incoming() {
                    let Ok(mut stream) = stream else { break };
                    let status = statuses
                        .get(served)
                        .or_else(|| statuses.last())
                        .copied()
                        .unwrap_or(201);
                    served += 1;

                    let (head, body) = read_request(&mut stream);
                    if status == 201 {
                        headers.lock().unwrap().push(head);
                        bodies.lock().unwrap().push(body);
                    }
                    respond(&mut stream, status);
                }
            });
        }

        Self {
            port,
            bodies,
            headers,
        }
    }

    pub fn bodies(&self) -> Vec<String> {
        self.bodies.lock().unwrap().clone()
    }

    pub fn headers(&self) -> Vec<String> {
        self.headers.lock().unwrap().clone()
    }
}

fn read_request(stream: &mut TcpStream) -> (String, String) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = stream.read(&mut chunk).unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                return (
                    text[..header_end].to_string(),
                    text[header_end + 4..].to_string(),
                );
            }
        }
    }
    (String::from_utf8_lossy(&buf).to_string(), String::new())
}

fn respond(stream: &mut TcpStream, status: u16) {
    let reason = match status {
        201 => "Created",
        200 => "OK",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    };
    let response =
        format!("HTTP/1.1 {status} {reason}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}
