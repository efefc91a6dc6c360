pub mod candidates;
pub mod filter;
pub mod scoring;
pub mod service;
pub mod travel;

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Number of ranked recommendations returned.
    pub top_k: usize,

    /// Upper bound on in-flight valuation calls per request.
    pub max_concurrency: usize,

    /// Whole-request budget; in-flight valuations are abandoned when it runs out.
    pub request_timeout: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            top_k: 10,
            max_concurrency: 8,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl EngineOptions {
    pub fn from_env() -> Self {
        let mut out = Self::default();

        if let Ok(s) = std::env::var("RECOMMEND_TOP_K") {
            if let Ok(n) = s.parse::<usize>() {
                out = out.with_top_k(n);
            }
        }

        if let Ok(s) = std::env::var("RECOMMEND_MAX_CONCURRENCY") {
            if let Ok(n) = s.parse::<usize>() {
                out.max_concurrency = n.max(1);
            }
        }

        if let Ok(s) = std::env::var("RECOMMEND_TIMEOUT_SECS") {
            if let Ok(n) = s.parse::<u64>() {
                out.request_timeout = Duration::from_secs(n.max(1));
            }
        }

        out
    }

    /// At least one recommendation is always returned when anything matches.
    pub fn with_top_k(self, top_k: usize) -> Self {
        Self {
            top_k: top_k.max(1),
            ..self
        }
    }
}
