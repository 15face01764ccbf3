use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Load error: {0}")]
    Load(#[from] bundle_cache::LoadError),

    #[error("Cache error: {0}")]
    Cache(#[from] bundle_cache::CacheError),

    #[error("Initialization failed: {0}")]
    Initialization(String),
}

/// Rejected `--header` argument
#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("expected \"Name: Value\", got '{0}'")]
    MissingSeparator(String),

    #[error("invalid header name '{0}'")]
    InvalidName(String),

    #[error("invalid value for header '{0}'")]
    InvalidValue(String),
}
