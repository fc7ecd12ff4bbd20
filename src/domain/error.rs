//! Domain error types.

/// Top-level error type for gapscope.
#[derive(Debug, thiserror::Error)]
pub enum GapError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("insufficient data for {ticker}: have {bars} bars, need {minimum}")]
    InsufficientData {
        ticker: String,
        bars: usize,
        minimum: usize,
    },

    #[error("upstream error: {reason}")]
    Upstream { reason: String },

    #[error("failed to decode upstream response: {reason}")]
    Decode { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GapError {
    pub fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        GapError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn upstream(reason: impl Into<String>) -> Self {
        GapError::Upstream {
            reason: reason.into(),
        }
    }
}

impl From<&GapError> for std::process::ExitCode {
    fn from(err: &GapError) -> Self {
        let code: u8 = match err {
            GapError::Io(_) => 1,
            GapError::ConfigParse { .. }
            | GapError::ConfigMissing { .. }
            | GapError::ConfigInvalid { .. }
            | GapError::InvalidParameter { .. } => 2,
            GapError::Upstream { .. } | GapError::Decode { .. } => 3,
            GapError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
