use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabError {
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("parameter {name} expects a {expected} value")]
    KindMismatch { name: String, expected: &'static str },

    #[error("parameter {name} has no option {value:?}")]
    InvalidChoice { name: String, value: String },

    #[error("parameter {0} rejects non-finite values")]
    NonFinite(String),

    #[error("parameter {0} declared twice")]
    DuplicateParameter(String),

    #[error("out of domain: {0}")]
    Domain(String),

    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LabError>;
