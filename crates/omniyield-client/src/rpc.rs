//! Deploy status lookups over Casper JSON-RPC.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::warn;

use omniyield_core::TxStatus;

use crate::backend::StatusSource;
use crate::config::Config;

pub struct DeployStatusClient {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl DeployStatusClient {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            api_key,
        }
    }

    /// Build a client from config, if an RPC node is configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        config
            .rpc_url
            .as_ref()
            .map(|url| Self::new(url, config.rpc_api_key.clone()))
    }

    async fn fetch(&self, deploy_hash: &str) -> anyhow::Result<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "info_get_deploy",
            "params": [deploy_hash],
        });

        let mut request = self.http.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("api-key", key);
        }

        let response = request.send().await?.error_for_status()?;
        Ok(response.json().await?)
    }
}

/// Map an `info_get_deploy` response onto a transaction status.
///
/// An RPC error means the deploy is not indexed yet and reads as pending,
/// never as failed.
pub fn parse_deploy_status(response: &Value) -> TxStatus {
    if response.get("error").is_some() {
        return TxStatus::Pending;
    }

    let execution = response
        .pointer("/result/execution_results/0/result")
        .unwrap_or(&Value::Null);
    if execution.get("Success").is_some() {
        TxStatus::Confirmed
    } else if execution.get("Failure").is_some() {
        TxStatus::Failed
    } else {
        TxStatus::Pending
    }
}

#[async_trait]
impl StatusSource for DeployStatusClient {
    async fn status(&self, external_ref: &str) -> anyhow::Result<TxStatus> {
        match self.fetch(external_ref).await {
            Ok(response) => Ok(parse_deploy_status(&response)),
            // transport failure: keep the record pending and try again later
            Err(err) => {
                warn!(deploy = external_ref, error = %err, "deploy status fetch failed");
                Ok(TxStatus::Pending)
            }
        }
    }
}
