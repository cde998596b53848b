use thiserror::Error;

/// Classified failure from one generation backend. The classification is
/// what drives control flow: rate limits trigger the cooldown path, anything
/// else burns the consecutive-failure budget.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("rate_limited: {0}")]
    RateLimited(String),
    #[error("unauthorized_or_expired: {0}")]
    Unauthorized(String),
    #[error("transient: {0}")]
    Transient(String),
}

impl ProviderError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ProviderError::RateLimited(_))
    }

    /// Short Arabic label for the FALLBACK log line, matching the wording
    /// the operators are used to.
    pub fn fallback_label(&self) -> &'static str {
        match self {
            ProviderError::RateLimited(_) => "حد الحصة",
            ProviderError::Unauthorized(_) => "مفتاح غير صالح أو منتهي",
            ProviderError::Transient(_) => "خطأ",
        }
    }
}

/// Failure to recover a JSON array from raw generator output. Never fatal
/// for the run: the batch is discarded and the iteration retried.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no_array_found")]
    NoArrayFound,
    #[error("unrecoverable_json: {0}")]
    UnrecoverableJson(String),
}
