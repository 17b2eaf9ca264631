//! In-memory transport for tests.
//!
//! Replies are scripted per `(method, path)`. The last reply in a queue
//! repeats forever, so a poller that keeps fetching keeps getting it.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

use crate::{
    error::{ClientError, TransportError},
    traits::{Connector, HttpMethod, Transport},
};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Api { status: u16, body: String },
    Fail(String),
    /// Panic inside the transport, as a buggy implementation would.
    Panic(String),
}

impl Reply {
    #[must_use]
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }

    fn into_result(self) -> Result<Value, ClientError> {
        match self {
            Self::Json(value) => Ok(value),
            Self::Api { status, body } => Err(ClientError::Api { status, body }),
            Self::Fail(cause) => Err(TransportError::request(cause).into()),
            Self::Panic(message) => panic!("{message}"),
        }
    }
}

/// A request the transport received.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<Value>,
}

type Key = (HttpMethod, String);

/// Scripted [`Transport`] that records every call.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<Key, VecDeque<Reply>>>,
    gates: Mutex<HashMap<Key, Arc<Notify>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a reply for `method path`.
    pub fn reply(&self, method: HttpMethod, path: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }

    /// Queue a JSON reply for `method path`.
    pub fn reply_json(&self, method: HttpMethod, path: &str, value: Value) {
        self.reply(method, path, Reply::Json(value));
    }

    /// Hold requests to `method path` until the returned gate is notified.
    pub fn gate(&self, method: HttpMethod, path: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((method, path.to_string()), Arc::clone(&gate));
        gate
    }

    /// Every call received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of calls received for `method path`.
    #[must_use]
    pub fn count(&self, method: HttpMethod, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    fn next_reply(&self, key: &Key) -> Reply {
        let mut replies = self.replies.lock().unwrap_or_else(PoisonError::into_inner);
        match replies.get_mut(key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_else(not_scripted),
            Some(queue) => queue.front().cloned().unwrap_or_else(not_scripted),
            None => not_scripted(),
        }
    }
}

fn not_scripted() -> Reply {
    Reply::api(404, "not scripted")
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ClientError> {
        let key = (method, path.to_string());
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                method,
                path: path.to_string(),
                body,
            });

        let gate = self
            .gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.next_reply(&key).into_result()
    }
}

/// [`Connector`] that hands out one shared [`ScriptedTransport`].
pub struct ScriptedConnector {
    transport: Arc<ScriptedTransport>,
    keys: Mutex<Vec<String>>,
}

impl ScriptedConnector {
    #[must_use]
    pub fn new(transport: Arc<ScriptedTransport>) -> Arc<Self> {
        Arc::new(Self {
            transport,
            keys: Mutex::new(Vec::new()),
        })
    }

    /// API keys passed to `connect`, in order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Connector for ScriptedConnector {
    fn connect(&self, api_key: &str) -> Result<Arc<dyn Transport>, TransportError> {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(api_key.to_string());
        Ok(Arc::clone(&self.transport) as Arc<dyn Transport>)
    }
}
