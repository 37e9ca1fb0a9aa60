//! The handler boundary: the one true I/O point of the harness.
//!
//! The orchestrator depends only on [`SkillHandler`]; the skill under test is
//! either an in-process closure or a remote endpoint reached over HTTP.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

#[async_trait]
pub trait SkillHandler: Send {
    /// Invoke the skill with a fully-built request envelope. The returned
    /// JSON is shaped `{version, response: {...}, sessionAttributes?}`.
    async fn handle(&mut self, request: Value) -> Result<Value>;
}

/// Any synchronous closure over the request JSON is a handler. This is the
/// common in-process test setup.
#[async_trait]
impl<F> SkillHandler for F
where
    F: FnMut(&Value) -> Value + Send,
{
    async fn handle(&mut self, request: Value) -> Result<Value> {
        Ok(self(&request))
    }
}

/// Remote mode: POST the request JSON to a configured skill endpoint.
pub struct HttpHandler {
    client: Client,
    url: String,
}

impl HttpHandler {
    pub fn new(url: impl Into<String>) -> Self {
        HttpHandler {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl SkillHandler for HttpHandler {
    async fn handle(&mut self, request: Value) -> Result<Value> {
        debug!(url = %self.url, "posting request to skill endpoint");
        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;
        // Anything but a clean 200 is fatal; the harness never papers over
        // a misbehaving endpoint.
        if response.status().as_u16() != 200 {
            return Err(anyhow!(
                "skill endpoint {} returned status {}",
                self.url,
                response.status()
            ));
        }
        Ok(response.json().await?)
    }
}
