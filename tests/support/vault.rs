//! Fake Vault server for end-to-end tests.
//!
//! A wiremock server with stateful responders for the KV v2 data endpoint
//! and the Transit encrypt/decrypt endpoints. The "ciphertext" is
//! `vault:v1:` followed by the key name and the base64 plaintext, so tests
//! can tell which key sealed a value.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Map, Value};
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const TOKEN: &str = "hvs.test-token";

type Store = Arc<Mutex<BTreeMap<String, Map<String, Value>>>>;

/// A running fake Vault.
pub struct FakeVault {
    rt: tokio::runtime::Runtime,
    server: MockServer,
    store: Store,
    writes: Arc<Mutex<Vec<String>>>,
}

struct KvResponder {
    store: Store,
    writes: Arc<Mutex<Vec<String>>>,
}

impl KvResponder {
    fn secret_path(request: &Request) -> String {
        request
            .url
            .path()
            .trim_start_matches("/v1/")
            .replacen("/data/", "/", 1)
    }
}

impl Respond for KvResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        if request.headers.get("X-Vault-Token").and_then(|v| v.to_str().ok()) != Some(TOKEN) {
            return ResponseTemplate::new(403).set_body_json(json!({ "errors": ["permission denied"] }));
        }

        let path = Self::secret_path(request);
        let mut store = self.store.lock().unwrap();

        match request.method.as_str() {
            "GET" => match store.get(&path) {
                Some(data) => ResponseTemplate::new(200).set_body_json(json!({
                    "data": { "data": data, "metadata": { "version": 1 } }
                })),
                None => ResponseTemplate::new(404).set_body_json(json!({ "errors": [] })),
            },
            "POST" | "PUT" => {
                let body: Value = match serde_json::from_slice(&request.body) {
                    Ok(body) => body,
                    Err(_) => return ResponseTemplate::new(400),
                };
                let data = body["data"].as_object().cloned().unwrap_or_default();
                store.insert(path.clone(), data);
                self.writes.lock().unwrap().push(path);
                ResponseTemplate::new(200).set_body_json(json!({ "data": { "version": 1 } }))
            }
            _ => ResponseTemplate::new(405),
        }
    }
}

struct TransitResponder;

impl Respond for TransitResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let segments: Vec<&str> = request.url.path().trim_start_matches("/v1/").split('/').collect();
        let (op, key) = match segments.as_slice() {
            [_, op, key] => (*op, *key),
            _ => return ResponseTemplate::new(404),
        };
        let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();

        match op {
            "encrypt" => {
                let plaintext = body["plaintext"].as_str().unwrap_or_default();
                ResponseTemplate::new(200).set_body_json(json!({
                    "data": { "ciphertext": format!("vault:v1:{}:{}", key, plaintext) }
                }))
            }
            "decrypt" => {
                let ciphertext = body["ciphertext"].as_str().unwrap_or_default();
                let prefix = format!("vault:v1:{}:", key);
                match ciphertext.strip_prefix(&prefix) {
                    Some(plaintext) => ResponseTemplate::new(200).set_body_json(json!({
                        "data": { "plaintext": plaintext }
                    })),
                    None => ResponseTemplate::new(400).set_body_json(json!({
                        "errors": ["cipher: message authentication failed"]
                    })),
                }
            }
            _ => ResponseTemplate::new(404),
        }
    }
}

impl FakeVault {
    pub fn start() -> Self {
        let rt = tokio::runtime::Runtime::new().expect("failed to start runtime");
        let server = rt.block_on(MockServer::start());
        let store: Store = Arc::default();
        let writes = Arc::default();

        rt.block_on(
            Mock::given(path_regex(r"^/v1/[^/]+/data/.+$"))
                .respond_with(KvResponder {
                    store: Arc::clone(&store),
                    writes: Arc::clone(&writes),
                })
                .mount(&server),
        );
        rt.block_on(
            Mock::given(method("POST"))
                .and(path_regex(r"^/v1/[^/]+/(encrypt|decrypt)/[^/]+$"))
                .respond_with(TransitResponder)
                .mount(&server),
        );

        Self {
            rt,
            server,
            store,
            writes,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Store a record at `mount/path`, e.g. `kv/app/db`.
    pub fn seed(&self, path: &str, fields: &[(&str, &str)]) {
        let data = fields
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect();
        self.store.lock().unwrap().insert(path.to_string(), data);
    }

    /// The record stored at `mount/path`, fields as strings.
    pub fn record(&self, path: &str) -> Option<BTreeMap<String, String>> {
        self.store.lock().unwrap().get(path).map(|data| {
            data.iter()
                .map(|(k, v)| (k.clone(), v.as_str().unwrap_or_default().to_string()))
                .collect()
        })
    }

    /// Paths written so far, in order.
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    /// The ciphertext the fake Transit produces for `plaintext` under `key`.
    pub fn seal(key: &str, plaintext: &str) -> String {
        format!("vault:v1:{}:{}", key, STANDARD.encode(plaintext))
    }
}
