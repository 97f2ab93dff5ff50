use crate::render::ObjectHandle;

/// Result alias that carries the custom [`SwingError`] type.
pub type Result<T> = std::result::Result<T, SwingError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum SwingError {
    /// Free-form failure surfaced to the caller as-is.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// JSON could not be read or written.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The configuration parsed but describes an unusable swing.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A render object referenced by the swing is no longer live.
    #[error("render object {0} is not live")]
    InvalidHandle(ObjectHandle),
    /// An operation needed spawned render objects but the swing is cleared.
    #[error("the swing has not been spawned")]
    NotSpawned,
    /// A model group that must have members was configured empty.
    #[error("model group `{0}` has no members")]
    EmptyAssembly(String),
}

impl SwingError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

impl From<&str> for SwingError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for SwingError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
