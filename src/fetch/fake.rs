//! Scripted [`HttpClient`] for tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::client::HttpClient;

/// Replays queued `(status, body)` responses in order, then answers 503.
pub(crate) struct ScriptedClient {
    responses: Mutex<VecDeque<(u16, String)>>,
    calls: AtomicUsize,
}

impl ScriptedClient {
    pub(crate) fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = (u16, S)>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|(status, body)| (status, body.into()))
                    .collect(),
            ),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn empty() -> Self {
        Self::new(Vec::<(u16, String)>::new())
    }

    pub(crate) fn push(&self, status: u16, body: impl Into<String>) {
        self.responses.lock().unwrap().push_back((status, body.into()));
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpClient for ScriptedClient {
    async fn execute(&self, _req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (status, body) = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or((503, String::new()));

        let resp = http::Response::builder()
            .status(status)
            .body(body)
            .unwrap();
        Ok(reqwest::Response::from(resp))
    }
}
