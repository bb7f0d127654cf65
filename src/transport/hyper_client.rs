//! HTTP transport over the hyper-util legacy client.
//!
//! # Responsibilities
//! - Perform one HTTP round trip per send
//! - Map client errors onto failure kinds
//! - Abort the round trip when the attempt is cancelled

use std::error::Error as StdError;

use axum::body::Body;
use axum::http::Request;
use futures_util::future::BoxFuture;
use http_body_util::LengthLimitError;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio_util::sync::CancellationToken;

use crate::config::TransportConfig;
use crate::outcome::{ErrorKind, Failure, HttpResponse, Outcome};
use crate::transport::{CallRequest, Transport};

/// Real network transport.
#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpConnector, Body>,
    max_body_bytes: usize,
}

impl HyperTransport {
    pub fn new(config: &TransportConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(config.connect_timeout());

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            max_body_bytes: config.max_body_bytes,
        }
    }

    async fn round_trip(&self, request: &CallRequest) -> Outcome {
        let mut builder = Request::builder()
            .method(request.method.clone())
            .uri(request.url.as_str());
        if let Some(headers) = builder.headers_mut() {
            headers.extend(request.headers.clone());
        }

        let req = match builder.body(Body::from(request.body.clone())) {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(url = %request.url, error = %e, "Failed to build request");
                return Outcome::Failure(Failure::with_cause(ErrorKind::Protocol, e));
            }
        };

        let response = match self.client.request(req).await {
            Ok(response) => response,
            Err(e) => {
                let kind = classify_client_error(&e);
                tracing::debug!(url = %request.url, kind = %kind, error = %e, "Upstream error");
                return Outcome::Failure(Failure::with_cause(kind, e));
            }
        };

        let (parts, body) = response.into_parts();
        match axum::body::to_bytes(Body::new(body), self.max_body_bytes).await {
            Ok(body) => Outcome::Response(HttpResponse {
                status: parts.status,
                headers: parts.headers,
                body,
            }),
            Err(e) => {
                let kind = classify_body_error(&e);
                tracing::debug!(url = %request.url, kind = %kind, error = %e, "Failed to read response body");
                Outcome::Failure(Failure::with_cause(kind, e))
            }
        }
    }
}

impl Transport for HyperTransport {
    fn send<'a>(
        &'a self,
        request: &'a CallRequest,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(url = %request.url, "Request cancelled in flight");
                    Outcome::Failure(Failure::cancelled())
                }
                outcome = self.round_trip(request) => outcome,
            }
        })
    }
}

/// Connection-level failures are `Transport`; unparseable responses are `Protocol`.
fn classify_client_error(e: &hyper_util::client::legacy::Error) -> ErrorKind {
    if e.is_connect() {
        return ErrorKind::Transport;
    }

    let mut source = e.source();
    while let Some(err) = source {
        if let Some(hyper_err) = err.downcast_ref::<hyper::Error>() {
            if hyper_err.is_parse() || hyper_err.is_parse_status() {
                return ErrorKind::Protocol;
            }
        }
        source = err.source();
    }

    ErrorKind::Transport
}

/// A body over `max_body_bytes` is `Protocol`: it will not fit on any attempt.
fn classify_body_error(e: &axum::Error) -> ErrorKind {
    let mut source = Some(e as &(dyn StdError + 'static));
    while let Some(err) = source {
        if err.is::<LengthLimitError>() {
            return ErrorKind::Protocol;
        }
        source = err.source();
    }

    ErrorKind::Transport
}
