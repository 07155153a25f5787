//! In-memory [`Transport`] for runtime integration tests.
//!
//! Records every request and answers from per-method queues of scripted replies. When a queue is
//! empty the answer is a success envelope: `[]` for `getUpdates`, `true` for everything else.
//! Acknowledgement fetches (`getUpdates` with `limit: 0`) draw from their own queue.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tgbot_api::{ApiClient, ApiConfig, HttpRequest, HttpResponse, RequestBody, Transport};
use tgbot_core::{BotError, Message, Result};
use tgbot_runtime::{Bot, BotBuilder};

/// One recorded request.
#[derive(Debug, Clone)]
pub struct Call {
    pub method: String,
    /// JSON body, or `Value::Null` for multipart and GET requests.
    pub params: Value,
    pub request: HttpRequest,
}

const ACK: &str = "getUpdates:ack";

enum Reply {
    Body(u16, Value),
    Fail(String),
}

#[derive(Default)]
pub struct MockTransport {
    calls: Mutex<Vec<Call>>,
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues `{"ok": true, "result": result}` for the next call of `method`.
    pub fn ok(&self, method: &str, result: Value) {
        self.push(method, Reply::Body(200, json!({"ok": true, "result": result})));
    }

    /// Queues an `ok: false` envelope for the next call of `method`.
    pub fn api_error(&self, method: &str, code: u16, description: &str) {
        self.push(
            method,
            Reply::Body(
                code,
                json!({"ok": false, "error_code": code, "description": description}),
            ),
        );
    }

    /// Queues a connection failure for the next call of `method`.
    pub fn fail(&self, method: &str, reason: &str) {
        self.push(method, Reply::Fail(reason.to_string()));
    }

    /// Queues a connection failure for the next acknowledgement fetch.
    pub fn fail_ack(&self, reason: &str) {
        self.push(ACK, Reply::Fail(reason.to_string()));
    }

    /// Queues one `getUpdates` reply carrying `updates`.
    pub fn updates(&self, updates: Vec<Value>) {
        self.ok("getUpdates", Value::Array(updates));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.method).collect()
    }

    pub fn calls_to(&self, method: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.method == method).collect()
    }

    fn push(&self, method: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(reply);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = request.api_method().to_string();
        let params = match &request.body {
            RequestBody::Json(bytes) => serde_json::from_slice(bytes).unwrap_or(Value::Null),
            _ => Value::Null,
        };
        let queue = if method == "getUpdates" && params["limit"] == 0 {
            ACK.to_string()
        } else {
            method.clone()
        };
        self.calls.lock().unwrap().push(Call {
            method: method.clone(),
            params,
            request,
        });

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&queue)
            .and_then(|queue| queue.pop_front());
        let (status, body) = match reply {
            Some(Reply::Body(status, body)) => (status, body),
            Some(Reply::Fail(reason)) => return Err(BotError::Transport(reason)),
            None if method == "getUpdates" || queue == ACK => (200, json!({"ok": true, "result": []})),
            None => (200, json!({"ok": true, "result": true})),
        };
        Ok(HttpResponse {
            status,
            body: serde_json::to_vec(&body).unwrap(),
        })
    }
}

pub fn client(transport: &Arc<MockTransport>) -> ApiClient {
    let config = ApiConfig::with_token("123:abc").with_api_url("http://mock.local");
    ApiClient::with_transport(config, transport.clone())
}

/// Builder with short polling and millisecond pauses, ready for handlers to be added.
pub fn builder(transport: &Arc<MockTransport>) -> BotBuilder {
    Bot::builder(client(transport))
        .poll_timeout(Duration::ZERO)
        .error_backoff(Duration::from_millis(1))
        .idle_pause(Duration::from_millis(5))
}

pub fn bot(transport: &Arc<MockTransport>) -> Bot {
    builder(transport).build()
}

pub fn user_json(id: i64) -> Value {
    json!({"id": id, "is_bot": false, "first_name": format!("user{id}")})
}

pub fn message_json(message_id: i64, chat_id: i64, from: i64, text: &str) -> Value {
    json!({
        "message_id": message_id,
        "date": 1_700_000_000,
        "chat": {"id": chat_id, "type": if chat_id < 0 { "group" } else { "private" }},
        "from": user_json(from),
        "text": text,
    })
}

pub fn message(message_id: i64, chat_id: i64, from: i64, text: &str) -> Message {
    serde_json::from_value(message_json(message_id, chat_id, from, text)).unwrap()
}

pub fn text_update(update_id: i64, chat_id: i64, from: i64, text: &str) -> Value {
    json!({"update_id": update_id, "message": message_json(update_id, chat_id, from, text)})
}
