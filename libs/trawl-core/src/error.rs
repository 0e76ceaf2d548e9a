//! Error types for query compilation and execution.
//!
//! Configuration problems surface as [`Error::Misconfigured`] when a view is
//! built, never per request. Request-time problems split into client errors
//! (malformed parameter values, unknown pages, unmatched suggesters) and
//! engine failures, so callers can map them onto HTTP status codes without
//! string matching.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A parameter matched a whitelist but its value cannot be decoded
    /// (bad range bounds, unparseable coordinates, window out of bounds).
    #[error("malformed parameter: {0}")]
    MalformedParameter(String),

    /// The view configuration is contradictory or incomplete.
    #[error("view misconfigured: {0}")]
    Misconfigured(String),

    /// Detail lookup resolved to zero documents, or to more than one.
    #[error("not found: {0}")]
    NotFound(String),

    /// The functional-suggest action was invoked without any parameter
    /// matching a configured functional suggester.
    #[error("no suggester matched: {0}")]
    NoSuggestion(String),

    /// Page-number pagination was asked for a page that does not exist.
    #[error("invalid page: {0}")]
    InvalidPage(String),

    /// The engine returned a non-success reply or could not be reached.
    #[error("engine failure: {message}")]
    EngineFailure {
        /// HTTP status reported by the engine, when one was received.
        status: Option<u16>,
        message: String,
    },
}

impl Error {
    /// HTTP status code this error maps onto.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::MalformedParameter(_) => 400,
            Error::Misconfigured(_) => 500,
            Error::NotFound(_) => 404,
            Error::NoSuggestion(_) => 400,
            Error::InvalidPage(_) => 404,
            Error::EngineFailure { .. } => 502,
        }
    }

    /// True for errors caused by the request rather than the service.
    pub fn is_client_error(&self) -> bool {
        self.http_status() < 500
    }
}
