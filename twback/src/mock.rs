use std::collections::VecDeque;
use std::fs::read_to_string;
use std::path::Path;
use std::sync::{Arc, Mutex};

use reqwest::header::HeaderMap;
use url::Url;

use crate::client::HttpClient;
use crate::error::{Error, Result};

/// Replays queued bodies in order and records every request it receives.
#[derive(Debug, Clone, Default)]
pub struct MockClient {
    responses: Arc<Mutex<VecDeque<Result<String>>>>,
    requests: Arc<Mutex<Vec<(Url, HeaderMap)>>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, body: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(body.into()));
    }

    pub fn push_response_from_file(&self, path: &Path) -> Result<()> {
        let body = read_to_string(path)?;
        self.push_response(body);
        Ok(())
    }

    pub fn push_not_found(&self) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(Error::NotFound("mock".into())));
    }

    pub fn requests(&self) -> Vec<(Url, HeaderMap)> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpClient for MockClient {
    async fn get(&self, url: &Url, headers: HeaderMap) -> Result<String> {
        self.requests.lock().unwrap().push((url.clone(), headers));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Other(format!("no response queued for {url}"))))
    }
}
