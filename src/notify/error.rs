//! Dispatch error types

/// Error type for notification dispatch
#[derive(Debug)]
pub enum DispatchError {
    /// Message could not be serialized
    Encode(serde_json::Error),
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchError::Encode(e) => write!(f, "Failed to encode notification: {}", e),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Encode(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(e: serde_json::Error) -> Self {
        DispatchError::Encode(e)
    }
}
