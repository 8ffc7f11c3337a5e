use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PantryError>;

/// Every failure a pantry operation can surface. Nothing is retried.
#[derive(Debug, Error)]
pub enum PantryError {
    /// A write operation was handed something other than a record.
    #[error("data must be a struct but got {found}")]
    TypeMismatch { found: &'static str },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("operation cancelled")]
    Cancelled,

    #[error("failed to encode request body: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// Only produced in strict decode mode.
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl PantryError {
    pub fn code(&self) -> &'static str {
        match self {
            PantryError::TypeMismatch { .. } => "type_mismatch",
            PantryError::Transport(_) => "transport_error",
            PantryError::Cancelled => "cancelled",
            PantryError::Serialization(_) => "serialization_error",
            PantryError::Decode(_) => "decode_error",
            PantryError::Status { .. } => "unexpected_status",
            PantryError::Config(_) => "config_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_and_messages() {
        let e = PantryError::TypeMismatch { found: "string" };
        assert_eq!(e.code(), "type_mismatch");
        assert_eq!(e.to_string(), "data must be a struct but got string");
        assert_eq!(PantryError::Cancelled.code(), "cancelled");
        let s = PantryError::Status {
            status: StatusCode::NOT_FOUND,
            body: "missing".into(),
        };
        assert_eq!(s.code(), "unexpected_status");
        assert!(s.to_string().contains("404"));
    }
}
