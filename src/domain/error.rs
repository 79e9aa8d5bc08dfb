//! Domain error types.

/// Top-level error type for barsim.
///
/// Order-level failures (insufficient cash) are not represented here: they
/// terminate the order, not the run, and surface through the strategy's
/// order notifications.
#[derive(Debug, thiserror::Error)]
pub enum BarsimError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no bars loaded from {path}")]
    NoData { path: String },

    #[error("insufficient data: have {bars} bars, need {minimum} for indicator warm-up")]
    InsufficientData { bars: usize, minimum: usize },

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

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&BarsimError> for std::process::ExitCode {
    fn from(err: &BarsimError) -> Self {
        let code: u8 = match err {
            BarsimError::Io(_) => 1,
            BarsimError::ConfigParse { .. }
            | BarsimError::ConfigMissing { .. }
            | BarsimError::ConfigInvalid { .. } => 2,
            BarsimError::Data { .. }
            | BarsimError::NoData { .. }
            | BarsimError::InsufficientData { .. } => 3,
        };
        std::process::ExitCode::from(code)
    }
}
