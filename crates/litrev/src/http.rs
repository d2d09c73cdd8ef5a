use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::HeaderMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::time::sleep;

use crate::error::{LitrevError, Result};

pub const USER_AGENT: &str = "litrev/0.1";

/// Thin wrapper over `reqwest` that paces requests to one per
/// `min_interval`. It makes a single attempt per call; retrying is the
/// job of [`crate::retry::RetryPolicy`] at the call site.
pub struct HttpClient {
    client: reqwest::Client,
    min_interval: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl HttpClient {
    pub fn new(min_interval: Duration, user_agent: &str) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .build()
            .expect("failed to build reqwest client");
        Self {
            client,
            min_interval,
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    async fn pace(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(t) = *last {
            let elapsed = t.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    pub async fn get(&self, url: &str) -> Result<String> {
        self.get_with_headers(url, HeaderMap::new()).await
    }

    pub async fn get_with_headers(&self, url: &str, headers: HeaderMap) -> Result<String> {
        self.pace().await;
        let resp = self.client.get(url).headers(headers).send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(LitrevError::Api(
                url.to_string(),
                format!("HTTP {status}: {body}"),
            ));
        }
        resp.text().await.map_err(LitrevError::Http)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let text = self.get(url).await?;
        serde_json::from_str(&text).map_err(|e| LitrevError::Parse(e.to_string()))
    }

    pub async fn get_json_with_headers<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: HeaderMap,
    ) -> Result<T> {
        let text = self.get_with_headers(url, headers).await?;
        serde_json::from_str(&text).map_err(|e| LitrevError::Parse(e.to_string()))
    }

    pub async fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        headers: HeaderMap,
    ) -> Result<R> {
        self.pace().await;
        let resp = self
            .client
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let msg = resp.text().await.unwrap_or_default();
            return Err(LitrevError::Api(
                url.to_string(),
                format!("HTTP {status}: {msg}"),
            ));
        }
        let text = resp.text().await.map_err(LitrevError::Http)?;
        serde_json::from_str(&text).map_err(|e| LitrevError::Parse(e.to_string()))
    }

    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.pace().await;
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(LitrevError::Api(
                url.to_string(),
                format!("HTTP {}", resp.status().as_u16()),
            ));
        }
        Ok(resp.bytes().await.map_err(LitrevError::Http)?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_maps_error_status_to_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/fail")
            .with_status(503)
            .with_body("down")
            .create_async()
            .await;

        let client = HttpClient::new(Duration::from_millis(0), USER_AGENT);
        let err = client.get(&format!("{}/fail", server.url())).await;
        match err {
            Err(LitrevError::Api(_, msg)) => assert!(msg.contains("503")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_json_parses_payload() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/ok")
            .with_status(200)
            .with_body(r#"{"value": 7}"#)
            .create_async()
            .await;

        let client = HttpClient::new(Duration::from_millis(0), USER_AGENT);
        let parsed: serde_json::Value =
            client.get_json(&format!("{}/ok", server.url())).await.unwrap();
        assert_eq!(parsed["value"], 7);
    }
}
