use std::path::PathBuf;

/// Result type alias for localns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Classification of an [`Error`], independent of the operation that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The item does not exist
    NotExist,
    /// Unexpected local I/O failure
    Io,
    /// Malformed input: bad path, wrong owner, bad reference
    Invalid,
    /// The caller or the host denied access
    Permission,
    /// Information withheld; indistinguishable from absence to the caller
    Private,
    /// Content was requested for a directory
    IsDir,
    /// An invariant was violated
    Internal,
    /// The request is not supported by a static name space
    Unsupported,
    /// A mutation was attempted on the read-only name space
    ReadOnly,
}

/// Core error type for localns operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The named item does not exist
    #[error("{path}: item does not exist")]
    NotExist {
        path: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Local file system failure
    #[error("I/O error during {operation} of '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Malformed path, reference or mismatched owner
    #[error("invalid {subject}: {message}")]
    Invalid { subject: String, message: String },

    /// Access refused by policy or by host file permissions
    #[error("{path}: permission denied: {message}")]
    Permission { path: String, message: String },

    /// Access refused without revealing whether the item exists
    #[error("{path}: information withheld")]
    Private { path: String },

    /// Content read attempted on a directory
    #[error("{path}: item is a directory")]
    IsDir { path: String },

    /// A policy file could not be parsed
    #[error("policy file '{path}' line {line}: {message}")]
    Policy {
        path: String,
        line: usize,
        message: String,
    },

    /// The signing collaborator failed
    #[error("signing failed: {message}")]
    Signing { message: String },

    /// Invariant violation
    #[error("internal error: {message}")]
    Internal { message: String },

    /// Operation not supported by this name space
    #[error("{feature}: not supported")]
    Unsupported { feature: String },

    /// Any mutation of the name space
    #[error("read-only name space")]
    ReadOnly,

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// An error annotated with the operation that failed
    #[error("{op}: {source}")]
    Op {
        op: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a not-exist error
    #[must_use]
    pub fn not_exist(path: impl Into<String>) -> Self {
        Error::NotExist {
            path: path.into(),
            source: None,
        }
    }

    /// Map an I/O error on `path` onto the taxonomy.
    ///
    /// `NotFound` becomes [`ErrorKind::NotExist`] and `PermissionDenied`
    /// becomes [`ErrorKind::Permission`]; everything else stays an I/O
    /// error.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, operation: &'static str, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Error::NotExist {
                path: path.display().to_string(),
                source: Some(source),
            },
            std::io::ErrorKind::PermissionDenied => Error::Permission {
                path: path.display().to_string(),
                message: source.to_string(),
            },
            _ => Error::Io {
                path,
                operation,
                source,
            },
        }
    }

    /// Create an invalid-input error
    #[must_use]
    pub fn invalid(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Invalid {
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Create a permission denied error
    #[must_use]
    pub fn permission(path: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Permission {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a privacy error
    #[must_use]
    pub fn private(path: impl Into<String>) -> Self {
        Error::Private { path: path.into() }
    }

    /// Create an is-a-directory error
    #[must_use]
    pub fn is_dir(path: impl Into<String>) -> Self {
        Error::IsDir { path: path.into() }
    }

    /// Create a policy parse error
    #[must_use]
    pub fn policy(path: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Error::Policy {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Create a signing error
    #[must_use]
    pub fn signing(message: impl Into<String>) -> Self {
        Error::Signing {
            message: message.into(),
        }
    }

    /// Create an internal error
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// Create an unsupported feature error
    #[must_use]
    pub fn unsupported(feature: impl Into<String>) -> Self {
        Error::Unsupported {
            feature: feature.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Wrap this error with the name of the failing operation
    #[must_use]
    pub fn with_op(self, op: &'static str) -> Self {
        Error::Op {
            op,
            source: Box::new(self),
        }
    }

    /// The kind of this error, looking through operation wrappers
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotExist { .. } => ErrorKind::NotExist,
            Error::Io { .. } => ErrorKind::Io,
            Error::Invalid { .. } | Error::Policy { .. } | Error::Configuration { .. } => {
                ErrorKind::Invalid
            }
            Error::Permission { .. } => ErrorKind::Permission,
            Error::Private { .. } => ErrorKind::Private,
            Error::IsDir { .. } => ErrorKind::IsDir,
            Error::Signing { .. } | Error::Internal { .. } => ErrorKind::Internal,
            Error::Unsupported { .. } => ErrorKind::Unsupported,
            Error::ReadOnly => ErrorKind::ReadOnly,
            Error::Op { source, .. } => source.kind(),
        }
    }

    /// Whether this error is of the given kind
    #[must_use]
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::io(PathBuf::new(), "unknown", error)
    }
}

// Extension trait for annotating Results with the failing operation
pub trait ResultExt<T> {
    /// Wrap any error with the operation name
    fn op(self, op: &'static str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn op(self, op: &'static str) -> Result<T> {
        self.map_err(|e| e.into().with_op(op))
    }
}
