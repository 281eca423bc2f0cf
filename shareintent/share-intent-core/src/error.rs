use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShareIntentError {
    /// The top-level raw payload was not valid JSON.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The native layer reported a failure.
    #[error("Native error: {0}")]
    Native(String),

    #[error("Listener registration failed: {0}")]
    Registration(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl serde::Serialize for ShareIntentError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShareIntentError>;
