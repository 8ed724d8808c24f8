#![allow(async_fn_in_trait)]
use log::debug;
use reqwest::{StatusCode, header::HeaderMap};
use url::Url;

use crate::error::{Error, Result};

/// The transport the extractors run on: one GET, body as text.
pub trait HttpClient {
    async fn get(&self, url: &Url, headers: HeaderMap) -> Result<String>;
}

/// A cookie-keeping HTTP session shared by every request of a run.
#[derive(Debug, Clone)]
pub struct Client {
    client: reqwest::Client,
}

impl Client {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self { client })
    }
}

impl HttpClient for Client {
    async fn get(&self, url: &Url, headers: HeaderMap) -> Result<String> {
        debug!("GET {url}");
        let response = self.client.get(url.clone()).headers(headers).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(url.path().to_string()));
        }
        let response = response.error_for_status()?;
        Ok(response.text().await?)
    }
}
