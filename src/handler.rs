use async_trait::async_trait;
use http::StatusCode;
use lambda_runtime::tracing::warn;
use std::sync::Arc;

use crate::request::Request;
use crate::response::ResponseWriter;

/// The HTTP handler contract: given a request, produce side effects on the
/// response writer.
///
/// Implementations must not call [`ResponseWriter::end`]; the gateway
/// finalizes the response once `serve_http` returns.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn serve_http(&self, request: Request, writer: &mut ResponseWriter);
}

#[async_trait]
impl<H> Handler for Arc<H>
where
    H: Handler + ?Sized,
{
    async fn serve_http(&self, request: Request, writer: &mut ResponseWriter) {
        (**self).serve_http(request, writer).await;
    }
}

/// Adapter turning a synchronous function into a [`Handler`].
#[derive(Debug, Clone, Copy)]
pub struct HandlerFn<F> {
    f: F,
}

/// Wraps `f` so it can be served by the gateway.
pub const fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: Fn(Request, &mut ResponseWriter) + Send + Sync,
{
    HandlerFn { f }
}

#[async_trait]
impl<F> Handler for HandlerFn<F>
where
    F: Fn(Request, &mut ResponseWriter) + Send + Sync,
{
    async fn serve_http(&self, request: Request, writer: &mut ResponseWriter) {
        (self.f)(request, writer);
    }
}

/// Handler used when the gateway is built without one: answers 404 to
/// everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotFound;

#[async_trait]
impl Handler for NotFound {
    async fn serve_http(&self, _request: Request, writer: &mut ResponseWriter) {
        writer.write_header(StatusCode::NOT_FOUND);
        if let Err(e) = writer.write(b"404 page not found\n") {
            warn!(error = %e, "Failed to write not found body");
        }
    }
}
