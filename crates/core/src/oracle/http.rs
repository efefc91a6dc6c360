use crate::config::Settings;
use crate::oracle::error::{
    OracleDiagnosticsError, STAGE_DECODE, STAGE_HTTP, STAGE_REJECTED, STAGE_RESPONSE,
};
use crate::oracle::{OracleKind, UnitDescription, Valuation, ValuationOracle};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 20;
const DEFAULT_RETRIES: u32 = 3;

/// Remote model service exposing `/predict` and `/predict/multi-year`.
#[derive(Debug, Clone)]
pub struct HttpValuationOracle {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    retries: u32,
}

#[derive(Debug, Serialize)]
struct PredictBody<'a> {
    #[serde(flatten)]
    unit: &'a UnitDescription,
    year: i32,
}

#[derive(Debug, Serialize)]
struct MultiYearBody<'a> {
    #[serde(flatten)]
    unit: &'a UnitDescription,
    years: &'a [i32],
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    success: bool,
    #[serde(flatten)]
    valuation: Option<Valuation>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YearValuation {
    year: i32,
    #[serde(flatten)]
    valuation: Valuation,
}

#[derive(Debug, Deserialize)]
struct MultiYearResponse {
    success: bool,
    #[serde(default)]
    predictions: Vec<YearValuation>,
    #[serde(default)]
    error: Option<String>,
}

impl HttpValuationOracle {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let base_url = settings.require_oracle_base_url()?.to_string();
        let api_key = settings.oracle_api_key.clone();

        let timeout_secs = std::env::var("ORACLE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("ORACLE_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build valuation oracle http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            retries: retries.max(1),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn headers(&self) -> anyhow::Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    async fn post_once<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> anyhow::Result<String> {
        let res = self
            .http
            .post(self.url(path))
            .headers(self.headers()?)
            .json(body)
            .send()
            .await
            .context("valuation oracle request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read valuation oracle response body")?;
        if !status.is_success() {
            return Err(OracleDiagnosticsError {
                oracle: OracleKind::Http,
                stage: status_stage(status),
                detail: format!("{path} status={status}"),
                raw_output: Some(text),
            }
            .into());
        }
        Ok(text)
    }

    async fn with_retries<T, F, Fut>(&self, what: &str, mut op: F) -> anyhow::Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(v) => return Ok(v),
                Err(err) => {
                    let permanent = err
                        .downcast_ref::<OracleDiagnosticsError>()
                        .is_some_and(OracleDiagnosticsError::is_permanent);
                    if permanent || attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = Duration::from_millis(250 << (attempt - 1));
                    tracing::warn!(what, attempt, ?backoff, error = %err, "valuation oracle call failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

/// 4xx means the request itself is bad, except timeouts and rate limiting.
fn status_stage(status: reqwest::StatusCode) -> &'static str {
    use reqwest::StatusCode;
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => STAGE_HTTP,
        s if s.is_client_error() => STAGE_REJECTED,
        _ => STAGE_HTTP,
    }
}

fn diagnostics(stage: &'static str, detail: String, raw: &str) -> anyhow::Error {
    OracleDiagnosticsError {
        oracle: OracleKind::Http,
        stage,
        detail,
        raw_output: Some(raw.to_string()),
    }
    .into()
}

fn decode_prediction(text: &str) -> anyhow::Result<Valuation> {
    let parsed = serde_json::from_str::<PredictResponse>(text)
        .map_err(|e| diagnostics(STAGE_DECODE, format!("invalid /predict body: {e}"), text))?;

    match (parsed.success, parsed.valuation) {
        (true, Some(v)) if v.predicted_price.is_finite() && v.predicted_price >= 0.0 => Ok(v),
        (true, _) => Err(diagnostics(
            STAGE_DECODE,
            "missing or invalid predicted_price".to_string(),
            text,
        )),
        (false, _) => Err(diagnostics(
            STAGE_RESPONSE,
            parsed.error.unwrap_or_else(|| "prediction failed".to_string()),
            text,
        )),
    }
}

fn decode_trajectory(text: &str, years: &[i32]) -> anyhow::Result<Vec<Valuation>> {
    let parsed = serde_json::from_str::<MultiYearResponse>(text).map_err(|e| {
        diagnostics(STAGE_DECODE, format!("invalid /predict/multi-year body: {e}"), text)
    })?;

    if !parsed.success {
        return Err(diagnostics(
            STAGE_RESPONSE,
            parsed.error.unwrap_or_else(|| "prediction failed".to_string()),
            text,
        ));
    }

    let returned: Vec<i32> = parsed.predictions.iter().map(|p| p.year).collect();
    if returned != years {
        return Err(diagnostics(
            STAGE_DECODE,
            format!("asked for years {years:?}, got {returned:?}"),
            text,
        ));
    }

    Ok(parsed.predictions.into_iter().map(|p| p.valuation).collect())
}

#[async_trait::async_trait]
impl ValuationOracle for HttpValuationOracle {
    fn kind(&self) -> OracleKind {
        OracleKind::Http
    }

    async fn predict(&self, unit: &UnitDescription, year: i32) -> anyhow::Result<Valuation> {
        let body = &PredictBody { unit, year };
        self.with_retries("predict", || async move {
            let text = self.post_once("/predict", body).await?;
            decode_prediction(&text)
        })
        .await
    }

    async fn predict_years(
        &self,
        unit: &UnitDescription,
        years: &[i32],
    ) -> anyhow::Result<Vec<Valuation>> {
        let body = &MultiYearBody { unit, years };
        self.with_retries("predict_multi_year", || async move {
            let text = self.post_once("/predict/multi-year", body).await?;
            decode_trajectory(&text, years)
        })
        .await
    }
}
