use crate::catalog::inventory::parse_segments;
use crate::catalog::{InventorySource, SegmentBatch};
use crate::config::Settings;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_PATH: &str = "/v1/inventory";
const DEFAULT_RETRIES: u32 = 3;

/// Inventory served by a remote JSON endpoint.
#[derive(Debug, Clone)]
pub struct HttpJsonInventory {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    path: String,
    retries: u32,
}

impl HttpJsonInventory {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_inventory_base_url()?.to_string();
        let api_key = settings.inventory_api_key.clone();

        let timeout_secs = std::env::var("INVENTORY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("INVENTORY_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES);

        let path = std::env::var("INVENTORY_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PATH.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build inventory http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            path,
            retries: retries.max(1),
        })
    }

    fn url(&self) -> String {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };

        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    async fn fetch_once(&self) -> Result<SegmentBatch> {
        let res = self
            .http
            .get(self.url())
            .headers(self.headers()?)
            .send()
            .await
            .context("inventory request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read inventory response")?;

        if !status.is_success() {
            anyhow::bail!("inventory HTTP {status}: {text}");
        }

        parse_segments(&text)
    }
}

#[async_trait::async_trait]
impl InventorySource for HttpJsonInventory {
    fn source_name(&self) -> &'static str {
        "external_http_json"
    }

    async fn fetch_segments(&self) -> Result<SegmentBatch> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_once().await {
                Ok(batch) => return Ok(batch),
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = Duration::from_millis(250 << (attempt - 1));
                    tracing::warn!(attempt, ?backoff, error = %err, "inventory fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}
