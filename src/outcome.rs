//! Normalized result of a single call attempt.
//!
//! Every layer of the pipeline speaks `Outcome`: the transport produces one,
//! policies inspect and possibly replace it, and the caller receives the last
//! one. A completed HTTP exchange is always `Outcome::Response`, whatever its
//! status code; only attempts that produced no response are `Outcome::Failure`.

use std::borrow::Cow;
use std::fmt;

use hyper::body::Bytes;
use hyper::header::HeaderMap;
use hyper::StatusCode;
use serde::{Deserialize, Serialize};

/// Type-erased error used as a failure cause.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Category of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Connection refused, DNS failure, socket error.
    Transport,
    /// Deadline exceeded.
    Timeout,
    /// Caller-initiated cancellation.
    Cancelled,
    /// Malformed response.
    Protocol,
    /// Error raised by caller-supplied code (handlers, adapters).
    Application,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Application => "application",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }
}

/// An attempt that produced no response.
#[derive(Debug)]
pub struct Failure {
    kind: ErrorKind,
    tag: Option<Cow<'static, str>>,
    cause: Option<BoxError>,
}

impl Failure {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            tag: None,
            cause: None,
        }
    }

    pub fn with_cause(kind: ErrorKind, cause: impl Into<BoxError>) -> Self {
        Self {
            kind,
            tag: None,
            cause: Some(cause.into()),
        }
    }

    /// Application error identified by `tag`. Classifiers can opt in to
    /// retrying a specific tag without retrying every application error.
    pub fn application(tag: impl Into<Cow<'static, str>>, cause: impl Into<BoxError>) -> Self {
        Self {
            kind: ErrorKind::Application,
            tag: Some(tag.into()),
            cause: Some(cause.into()),
        }
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Downcast the direct cause to a concrete error type.
    pub fn cause_as<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.cause.as_deref().and_then(|e| e.downcast_ref::<E>())
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.tag, &self.cause) {
            (Some(tag), Some(cause)) => write!(f, "{} failure [{}]: {}", self.kind, tag, cause),
            (Some(tag), None) => write!(f, "{} failure [{}]", self.kind, tag),
            (None, Some(cause)) => write!(f, "{} failure: {}", self.kind, cause),
            (None, None) => write!(f, "{} failure", self.kind),
        }
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result of one call attempt, or of a whole logical call once the pipeline
/// has finished with it.
#[derive(Debug)]
pub enum Outcome {
    Response(HttpResponse),
    Failure(Failure),
}

impl Outcome {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Outcome::Response(r) => Some(r.status),
            Outcome::Failure(_) => None,
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Outcome::Response(_) => None,
            Outcome::Failure(f) => Some(f.kind),
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Response(_) => None,
            Outcome::Failure(f) => Some(f),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind() == Some(ErrorKind::Cancelled)
    }

    /// Short label for logs and metrics: the status code or the failure kind.
    pub fn label(&self) -> Cow<'static, str> {
        match self {
            Outcome::Response(r) => Cow::Owned(r.status.as_u16().to_string()),
            Outcome::Failure(f) => Cow::Borrowed(f.kind.as_str()),
        }
    }

    pub fn into_result(self) -> Result<HttpResponse, Failure> {
        match self {
            Outcome::Response(r) => Ok(r),
            Outcome::Failure(f) => Err(f),
        }
    }
}

impl From<HttpResponse> for Outcome {
    fn from(response: HttpResponse) -> Self {
        Outcome::Response(response)
    }
}

impl From<Failure> for Outcome {
    fn from(failure: Failure) -> Self {
        Outcome::Failure(failure)
    }
}
