use thiserror::Error;

#[derive(Error, Debug)]
pub enum SparkError {
    #[error("Invalid Spark API id: {0}")]
    InvalidIdentifier(String),

    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("{resource} has no attribute \"{name}\"")]
    UnknownAttribute { resource: String, name: String },

    #[error("{resource} is missing required field \"{name}\"")]
    MissingRequiredField { resource: String, name: String },

    #[error("{resource}.{name} is read only")]
    ReadOnlyField { resource: String, name: String },

    #[error("Update failed with status {status}: {body}")]
    RemoteUpdateFailed { status: u16, body: String },

    #[error("Delete failed with status {status}: {body}")]
    DeleteFailed { status: u16, body: String },

    #[error("Request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Index {index} out of range (collection holds {len} items)")]
    IndexOutOfRange { index: isize, len: usize },

    #[error("Key must be a uuid or Spark API id for {resource_type}: {key}")]
    InvalidKey { resource_type: String, key: String },

    #[error("Invalid value for \"{field}\": {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("{0} was deleted")]
    Deleted(String),

    #[error("Rate limited: gave up after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("Invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SparkError>;
