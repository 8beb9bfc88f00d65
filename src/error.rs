use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing credentials or an unreadable config file.
    #[error("configuration error: {0}")]
    Config(String),

    /// Notion answered with a non-2xx status.
    #[error("Notion API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Request input rejected before anything was sent.
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("{operation} {id}: {source}")]
    Context {
        operation: &'static str,
        id: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Wraps the error with the operation and record it came from.
    pub fn context(self, operation: &'static str, id: impl Into<String>) -> Self {
        Self::Context {
            operation,
            id: id.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through any [`Error::Context`] layers.
    pub fn root(&self) -> &Error {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self.root(), Self::Validation { .. })
    }
}

/// Adds operation context to a `Result`.
pub trait ResultExt<T> {
    fn context(self, operation: &'static str, id: &str) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, operation: &'static str, id: &str) -> Result<T> {
        self.map_err(|e| e.context(operation, id))
    }
}
