//! Demo HTTP server.
//!
//! # Responsibilities
//! - Serve fixed endpoints that succeed, stall, or fail transiently
//! - Wire up middleware (tracing, request ID)
//! - Stop accepting on the shutdown broadcast
//!
//! # Endpoints
//! - `GET /` → 200 fixed text
//! - `GET /slow` → 200 after the slow delay
//! - `GET /transientError` → 500 after the error delay
//! - `GET /timeout` → 408 after the error delay

use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderName, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::DemoConfig;

/// Header carrying the per-request correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

#[derive(Debug, Clone, Copy)]
struct Delays {
    slow: Duration,
    error: Duration,
}

/// Fixture server for exercising pipelines end to end.
pub struct DemoServer {
    router: Router,
}

impl DemoServer {
    pub fn new(config: &DemoConfig) -> Self {
        let delays = Delays {
            slow: config.slow_delay(),
            error: config.error_delay(),
        };
        Self {
            router: Self::build_router(delays),
        }
    }

    fn build_router(delays: Delays) -> Router {
        let request_id = HeaderName::from_static(X_REQUEST_ID);

        Router::new()
            .route("/", get(root))
            .route("/slow", get(slow))
            .route("/transientError", get(transient_error))
            .route("/timeout", get(timeout))
            .fallback(not_found)
            .with_state(delays)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(request_id)),
            )
    }

    /// Expose the router for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Demo server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("Demo server stopped");
        Ok(())
    }
}

async fn root() -> &'static str {
    "Hello World!"
}

async fn slow(State(delays): State<Delays>) -> &'static str {
    tokio::time::sleep(delays.slow).await;
    "slow"
}

async fn transient_error(State(delays): State<Delays>) -> impl IntoResponse {
    tokio::time::sleep(delays.error).await;
    tracing::debug!("Answering with a transient error");
    (StatusCode::INTERNAL_SERVER_ERROR, "transient error")
}

async fn timeout(State(delays): State<Delays>) -> impl IntoResponse {
    tokio::time::sleep(delays.error).await;
    (StatusCode::REQUEST_TIMEOUT, "request timeout")
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn server() -> DemoServer {
        DemoServer::new(&DemoConfig {
            bind_address: "127.0.0.1:0".into(),
            slow_delay_ms: 50,
            error_delay_ms: 10,
        })
    }

    async fn status_of(path: &str) -> (StatusCode, bool) {
        let response = server()
            .router()
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        (
            response.status(),
            response.headers().contains_key(X_REQUEST_ID),
        )
    }

    #[tokio::test]
    async fn endpoints_answer_with_fixed_statuses() {
        assert_eq!(status_of("/").await.0, StatusCode::OK);
        assert_eq!(status_of("/slow").await.0, StatusCode::OK);
        assert_eq!(status_of("/transientError").await.0, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status_of("/timeout").await.0, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(status_of("/missing").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let (_, has_id) = status_of("/").await;
        assert!(has_id);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_endpoint_waits_configured_delay() {
        let start = tokio::time::Instant::now();
        assert_eq!(status_of("/slow").await.0, StatusCode::OK);
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
