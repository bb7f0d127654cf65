//! Transport subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline (innermost layer)
//!     → Transport::send(request, cancel)
//!         → hyper_client.rs (real HTTP round trip over hyper-util)
//!         → func.rs (closure-backed sends: handlers, fault injection)
//!     ← Outcome (response, or failure with kind + cause)
//! ```
//!
//! # Design Decisions
//! - A transport issues exactly one network call per `send`
//! - Cancellation is cooperative: the token is raced against the round trip
//!   and dropping the in-flight future closes its connection
//! - Transports never retry; that belongs to the pipeline

mod func;
mod hyper_client;

pub use self::func::FnTransport;
pub use self::hyper_client::HyperTransport;

use futures_util::future::BoxFuture;
use hyper::body::Bytes;
use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use hyper::Method;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::outcome::Outcome;

/// One network send. Implementations must honour `cancel` promptly.
pub trait Transport: Send + Sync {
    fn send<'a>(&'a self, request: &'a CallRequest, cancel: CancellationToken)
        -> BoxFuture<'a, Outcome>;
}

/// Description of an outbound request. Reused verbatim by every attempt.
#[derive(Debug, Clone)]
pub struct CallRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl CallRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}
