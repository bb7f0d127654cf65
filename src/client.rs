//! Named clients.
//!
//! A client binds a base address and a path to a shared pipeline, so callers
//! hold a `Client` and invoke `call()` without rebuilding request details.

use std::sync::Arc;

use url::Url;

use crate::outcome::Outcome;
use crate::resilience::Pipeline;
use crate::transport::CallRequest;

/// Errors raised while binding a client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid base url '{url}': {source}")]
    InvalidBase {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("cannot join path '{path}' onto '{base}': {source}")]
    InvalidPath {
        base: Url,
        path: String,
        #[source]
        source: url::ParseError,
    },
}

/// A named GET endpoint served through a pipeline.
#[derive(Debug, Clone)]
pub struct Client {
    name: String,
    request: CallRequest,
    pipeline: Arc<Pipeline>,
}

impl Client {
    /// Bind `path` under `base_url`.
    ///
    /// The base is treated as a directory: `http://h/api` + `status` targets
    /// `http://h/api/status`. An absolute `path` (leading `/`) replaces the
    /// base path entirely.
    pub fn new(
        name: impl Into<String>,
        base_url: &str,
        path: &str,
        pipeline: Arc<Pipeline>,
    ) -> Result<Self, ClientError> {
        let mut base = Url::parse(base_url).map_err(|source| ClientError::InvalidBase {
            url: base_url.to_string(),
            source,
        })?;
        if !base.path().ends_with('/') {
            let dir = format!("{}/", base.path());
            base.set_path(&dir);
        }
        let url = base.join(path).map_err(|source| ClientError::InvalidPath {
            base: base.clone(),
            path: path.to_string(),
            source,
        })?;

        Ok(Self {
            name: name.into(),
            request: CallRequest::get(url),
            pipeline,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &Url {
        &self.request.url
    }

    pub async fn call(&self) -> Outcome {
        tracing::debug!(client = %self.name, url = %self.request.url, "Client call");
        self.pipeline.execute(&self.request).await
    }
}
