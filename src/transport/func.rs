//! Closure-backed transport.

use std::fmt;
use std::future::Future;

use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::outcome::Outcome;
use crate::transport::{CallRequest, Transport};

type SendFn = dyn Fn(&CallRequest, CancellationToken) -> BoxFuture<'static, Outcome> + Send + Sync;

/// Adapts a closure into a [`Transport`].
///
/// Useful for swapping the primary handler: a pass-through that delegates to
/// another transport, or one that raises a specific application error.
pub struct FnTransport {
    f: Box<SendFn>,
}

impl FnTransport {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(&CallRequest, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        Self {
            f: Box::new(
                move |request: &CallRequest, cancel: CancellationToken| -> BoxFuture<'static, Outcome> {
                    Box::pin(f(request, cancel))
                },
            ),
        }
    }
}

impl Transport for FnTransport {
    fn send<'a>(
        &'a self,
        request: &'a CallRequest,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Outcome> {
        (self.f)(request, cancel)
    }
}

impl fmt::Debug for FnTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransport").finish_non_exhaustive()
    }
}
