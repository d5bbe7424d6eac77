use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("remote not found: {name}")]
    NotFound { name: String },

    #[error("remote already exists: {name}")]
    AlreadyExists { name: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("failed to serialize config: {0}")]
    Serialize(String),

    #[error("config lock poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
