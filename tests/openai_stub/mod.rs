use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use serde_json::Value;

pub const API_KEY: &str = "test-key";

/// Responses API stub. Every non-empty input line comes back prefixed with
/// `{to}:` where `{to}` is the target language named in the instructions.
#[derive(Debug, Clone, Default)]
pub struct OpenAiStubConfig {
    /// Answer every request with this status and an `error.message` body.
    pub fail_status: Option<u16>,
}

pub struct OpenAiStub {
    pub base_url: String,
    requests: Arc<AtomicUsize>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl OpenAiStub {
    pub fn spawn(config: OpenAiStubConfig) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start openai stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}/v1");
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&requests);

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                if request.method() != &tiny_http::Method::Post || request.url() != "/v1/responses"
                {
                    let _ = request.respond(
                        tiny_http::Response::from_string("not found").with_status_code(404),
                    );
                    continue;
                }
                counter.fetch_add(1, Ordering::SeqCst);

                let authorized = request.headers().iter().any(|header| {
                    header.field.equiv("Authorization")
                        && header.value.as_str() == format!("Bearer {API_KEY}")
                });
                if !authorized {
                    let _ = request.respond(json_response(401, &error_body("invalid api key")));
                    continue;
                }

                if let Some(status) = config.fail_status {
                    let _ = request.respond(json_response(status, &error_body("model is overloaded")));
                    continue;
                }

                let mut body = String::new();
                if request.as_reader().read_to_string(&mut body).is_err() {
                    let _ = request.respond(json_response(400, &error_body("invalid request body")));
                    continue;
                }
                let parsed: Value = match serde_json::from_str(&body) {
                    Ok(value) => value,
                    Err(_) => {
                        let _ = request.respond(json_response(400, &error_body("invalid json")));
                        continue;
                    }
                };

                let instructions = parsed
                    .get("instructions")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                let (Some(to), Some(input)) = (
                    target_language(instructions),
                    parsed.get("input").and_then(|v| v.as_str()),
                ) else {
                    let _ = request.respond(json_response(400, &error_body("missing input")));
                    continue;
                };

                let output_text = input
                    .split('\n')
                    .map(|line| {
                        if line.is_empty() {
                            String::new()
                        } else {
                            format!("{to}:{line}")
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\n");

                let response_body = serde_json::json!({
                    "id": "resp_stub",
                    "object": "response",
                    "output": [
                        {
                            "type": "message",
                            "role": "assistant",
                            "content": [
                                { "type": "output_text", "text": output_text, "annotations": [] }
                            ]
                        }
                    ]
                });
                let _ = request.respond(json_response(200, &response_body));
            }
        });

        Self {
            base_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Drop for OpenAiStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn target_language(instructions: &str) -> Option<&str> {
    let marker = "into language code `";
    let start = instructions.find(marker)? + marker.len();
    let rest = &instructions[start..];
    let end = rest.find('`')?;
    Some(&rest[..end])
}

fn error_body(message: &str) -> Value {
    serde_json::json!({ "error": { "message": message, "type": "server_error" } })
}

fn json_response(status: u16, body: &Value) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let header = tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .expect("build header");
    tiny_http::Response::from_string(body.to_string())
        .with_status_code(status)
        .with_header(header)
}
