use std::fmt;

/// Raised when provider rows cannot be decoded into domain values.
#[derive(Debug, Clone)]
pub struct GatewayError {
    pub provider: &'static str,
    pub stage: &'static str,
    pub detail: String,
}

impl GatewayError {
    pub fn new(provider: &'static str, stage: &'static str, detail: impl Into<String>) -> Self {
        Self {
            provider,
            stage,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gateway error (provider={}, stage={}): {}",
            self.provider, self.stage, self.detail
        )
    }
}

impl std::error::Error for GatewayError {}
