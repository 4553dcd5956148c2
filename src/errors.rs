use thiserror::Error;

/// Typed error hierarchy for barnacle.
///
/// Use at module boundaries (config validation, completion calls, store access).
/// Internal/leaf functions can continue using `anyhow::Result` — the `Internal`
/// variant allows seamless conversion via the `?` operator.
#[derive(Debug, Error)]
pub enum BarnacleError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Completion error: {0}")]
    Completion(String),

    #[error("Store error: {store}: {message}")]
    Store { store: String, message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Convenience alias for results using BarnacleError.
pub type BarnacleResult<T> = std::result::Result<T, BarnacleError>;
