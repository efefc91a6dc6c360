use crate::oracle::OracleKind;
use std::fmt;

#[derive(Debug, Clone)]
pub struct OracleDiagnosticsError {
    pub oracle: OracleKind,
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
}

impl OracleDiagnosticsError {
    /// Failures the oracle reported about the request itself; retrying will not help.
    pub fn is_permanent(&self) -> bool {
        self.stage == STAGE_RESPONSE || self.stage == STAGE_REJECTED
    }
}

pub const STAGE_HTTP: &str = "http";
pub const STAGE_DECODE: &str = "decode";
pub const STAGE_RESPONSE: &str = "response";
/// The oracle refused the request with a client error status.
pub const STAGE_REJECTED: &str = "rejected";

impl fmt::Display for OracleDiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "valuation oracle error (oracle={}, stage={}): {}",
            self.oracle, self.stage, self.detail
        )
    }
}

impl std::error::Error for OracleDiagnosticsError {}
