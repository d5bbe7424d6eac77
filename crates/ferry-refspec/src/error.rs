use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RefspecError {
    #[error("invalid refspec {spec:?}: {reason}")]
    Invalid { spec: String, reason: String },

    #[error("{name} does not match {pattern}")]
    NoMatch { name: String, pattern: String },

    #[error("refspec {spec:?} has no side to transform into")]
    NoDestination { spec: String },

    #[error("output buffer too small: {required} bytes required")]
    BufferTooSmall { required: usize },

    #[error("transform output exceeds {limit} bytes after {attempts} attempts")]
    CapacityExceeded { limit: usize, attempts: u32 },

    #[error("transform produced invalid UTF-8: {0}")]
    Encoding(String),
}

pub type RefspecResult<T> = Result<T, RefspecError>;
