use std::io;

pub type Result<T> = std::result::Result<T, ProxyError>;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// The Internet Settings key could not be opened, read or written.
    #[error("{message}: {source}")]
    StoreUnavailable {
        message: String,
        #[source]
        source: io::Error,
    },

    /// Write access to the Internet Settings key was refused.
    #[error("{message}: {source}")]
    PermissionDenied {
        message: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A stored string could not be interpreted.
    #[error("malformed {name} value {value:?}: {reason}")]
    Format {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("export error: {0}")]
    Export(#[from] serde_yaml_ng::Error),
}

impl ProxyError {
    pub fn unavailable(message: impl Into<String>, source: io::Error) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
            source,
        }
    }

    /// Store failure on a write path: access denied is reported as such,
    /// anything else as an unavailable store.
    pub fn on_write(message: impl Into<String>, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::PermissionDenied {
            Self::PermissionDenied {
                message: message.into(),
                source,
            }
        } else {
            Self::unavailable(message, source)
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}
