//! Error taxonomy for the retrieval core.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds surfaced by the retrieval core, mapped onto HTTP status codes
/// at the request surface (see [`crate::server::handlers`]).
#[derive(Error, Debug)]
pub enum Error {
    /// Unresolvable project root or invalid settings.
    #[error("configuration error: {message}")]
    Config {
        /// Description of what failed to resolve or validate.
        message: String,
    },

    /// A live daemon already holds the lock for this state directory.
    #[error("another agent-brain instance is already running for this project (pid {pid})")]
    AlreadyRunning {
        /// The pid recorded in the stale-or-live lock file.
        pid: u32,
    },

    /// The configured port range is exhausted.
    #[error("no available port in range {start}-{end}")]
    NoPortAvailable {
        /// Lower bound of the configured range.
        start: u16,
        /// Upper bound of the configured range.
        end: u16,
    },

    /// A second `start_indexing` call arrived while a job is in flight.
    #[error("an indexing job is already running (job_id={job_id})")]
    AlreadyIndexing {
        /// The job id currently in flight.
        job_id: String,
    },

    /// The vector store is not initialized, or an indexing job is running.
    #[error("not ready: {reason}")]
    NotReady {
        /// Why the engine cannot currently serve queries.
        reason: String,
    },

    /// Malformed or out-of-range request.
    #[error("bad request: {message}")]
    BadRequest {
        /// Human-readable explanation.
        message: String,
    },

    /// The embedder's declared dimension does not match the collection's.
    #[error("embedding dimension mismatch: store expects {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension the vector store was created with.
        expected: usize,
        /// Dimension returned by the active embedder.
        actual: usize,
    },

    /// An `Embedder` call exhausted its retries.
    #[error("embedding provider error: {message}")]
    Embedding {
        /// Description of the failure.
        message: String,
    },

    /// A `Summarizer`/`TripleExtractor` call exhausted its retries.
    #[error("summarizer error: {message}")]
    Summarizer {
        /// Description of the failure.
        message: String,
    },

    /// A storage backend I/O failure.
    #[error("store error: {message}")]
    Store {
        /// Description of the failure.
        message: String,
    },

    /// The requested feature requires a specific backend that isn't active.
    #[error("unsupported backend: {message}")]
    UnsupportedBackend {
        /// What the caller asked for and why it isn't supported.
        message: String,
    },

    /// I/O error not otherwise classified above.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for invariant violations that should never happen in
    /// practice; distinguished from `Store`/`Config` so they're easy to grep.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the invariant that was violated.
        message: String,
    },
}

impl Error {
    /// Build a [`Error::Config`].
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Build a [`Error::NotReady`].
    pub fn not_ready<S: Into<String>>(reason: S) -> Self {
        Self::NotReady {
            reason: reason.into(),
        }
    }

    /// Build a [`Error::BadRequest`].
    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Build a [`Error::Store`].
    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Build a [`Error::Embedding`].
    pub fn embedding<S: Into<String>>(message: S) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    /// Build a [`Error::Summarizer`].
    pub fn summarizer<S: Into<String>>(message: S) -> Self {
        Self::Summarizer {
            message: message.into(),
        }
    }

    /// Build a [`Error::Internal`].
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Build a [`Error::UnsupportedBackend`].
    pub fn unsupported_backend<S: Into<String>>(message: S) -> Self {
        Self::UnsupportedBackend {
            message: message.into(),
        }
    }

    /// The conceptual error code used in the `{error:{code,message}}` HTTP body.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::AlreadyRunning { .. } => "already_running",
            Error::NoPortAvailable { .. } => "no_port_available",
            Error::AlreadyIndexing { .. } => "already_indexing",
            Error::NotReady { .. } => "not_ready",
            Error::BadRequest { .. } => "bad_request",
            Error::DimensionMismatch { .. } => "dimension_mismatch",
            Error::Embedding { .. } => "embedding_error",
            Error::Summarizer { .. } => "summarizer_error",
            Error::Store { .. } => "store_error",
            Error::UnsupportedBackend { .. } => "unsupported_backend",
            Error::Io(_) => "io_error",
            Error::Json(_) => "json_error",
            Error::Internal { .. } => "internal_error",
        }
    }
}
