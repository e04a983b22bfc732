//! Shared test doubles for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use pictoquery::{ChatController, CompletionBackend, CompletionRequest, Error, Result, SessionOptions};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Backend that replays scripted replies and records every request it sees.
///
/// `Ok(text)` entries are returned as answers, `Err(text)` entries become
/// `Error::Api(text)`. Once the script runs out every call fails.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    requests: Mutex<Vec<serde_json::Value>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(self, text: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn fail(self, text: &str) -> Self {
        self.replies.lock().unwrap().push_back(Err(text.to_string()));
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Serialized requests, oldest first
    pub fn requests(&self) -> Vec<serde_json::Value> {
        self.requests.lock().unwrap().clone()
    }

    /// Data URI of the image carried by the n-th request
    pub fn image_url(&self, n: usize) -> String {
        let requests = self.requests();
        let messages = requests[n]["messages"].as_array().unwrap();
        let user = messages.last().unwrap();
        user["content"][1]["image_url"]["url"]
            .as_str()
            .unwrap()
            .to_string()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.requests
            .lock()
            .unwrap()
            .push(serde_json::to_value(request).unwrap());

        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(answer)) => Ok(answer),
            Some(Err(message)) => Err(Error::api(message)),
            None => Err(Error::api("no scripted reply left")),
        }
    }
}

pub fn test_options() -> SessionOptions {
    SessionOptions::builder()
        .model("gpt-4o")
        .base_url("http://localhost:1234/v1")
        .api_key("sk-test")
        .build()
        .expect("Valid options")
}

pub fn scripted_controller(backend: ScriptedBackend) -> ChatController<ScriptedBackend> {
    ChatController::with_backend(test_options(), backend)
}
