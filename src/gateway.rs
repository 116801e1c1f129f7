//! Wiring between the Lambda runtime and an HTTP [`Handler`].
//!
//! A [`Gateway`] resolves each payload into a [`GatewayEvent`], translates it
//! into an `http::Request`, runs the handler against a fresh
//! [`ResponseWriter`] and serializes the captured response back into the
//! matching wire shape. Any classified failure is answered with the
//! configured default error response.

use futures::FutureExt;
use lambda_runtime::tracing::{debug, error, info};
use lambda_runtime::{Context, Diagnostic, Error, LambdaEvent, service_fn};
use serde_json::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock};

use crate::handler::{Handler, NotFound};
use crate::models::error::GatewayError;
use crate::models::event::{GatewayEvent, PayloadVersion};
use crate::models::v1::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use crate::models::v2::{ApiGatewayV2HttpRequest, ApiGatewayV2HttpResponse};
use crate::request::{Request, RequestDescriptor};
use crate::response::{ResponseDescriptor, ResponseWriter};

/// Builds the handler on first use, with the context of that invocation.
pub type HandlerProvider = Box<dyn Fn(&Context) -> Arc<dyn Handler> + Send + Sync>;

const DEFAULT_ERROR_STATUS: u16 = 500;
const DEFAULT_ERROR_CONTENT_TYPE: &str = "application/json";
const DEFAULT_ERROR_BODY: &str = r#"{"message": "Error processing request"}"#;

/// Adapter that serves API Gateway events with an HTTP [`Handler`].
pub struct Gateway {
    handler: OnceLock<Arc<dyn Handler>>,
    provider: Option<HandlerProvider>,
    default_response: ResponseDescriptor,
}

impl Gateway {
    #[must_use]
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::default()
    }

    /// Response substituted for any invocation that fails with a [`GatewayError`].
    #[must_use]
    pub const fn default_response(&self) -> &ResponseDescriptor {
        &self.default_response
    }

    /// Serves a v1 proxy event.
    ///
    /// # Errors
    ///
    /// Returns the classified [`GatewayError`] when the event cannot be
    /// translated or the handler (or handler provider) panics. The handler is
    /// not called for translation failures. The error carries no response;
    /// callers answering the gateway themselves pair it with
    /// [`Gateway::default_response`], as [`Gateway::handle`] does.
    pub async fn invoke_v1(
        &self,
        ctx: &Context,
        event: ApiGatewayProxyRequest,
    ) -> Result<ApiGatewayProxyResponse, GatewayError> {
        let request = RequestDescriptor::from_v1(event)?.into_request(ctx)?;
        Ok(self.serve(ctx, request).await?.to_v1())
    }

    /// Serves a v2 HTTP API event.
    ///
    /// # Errors
    ///
    /// Same as [`Gateway::invoke_v1`].
    pub async fn invoke_v2(
        &self,
        ctx: &Context,
        event: ApiGatewayV2HttpRequest,
    ) -> Result<ApiGatewayV2HttpResponse, GatewayError> {
        let request = RequestDescriptor::from_v2(event).into_request(ctx)?;
        Ok(self.serve(ctx, request).await?.to_v2())
    }

    /// Serves either event shape and returns the wire response as JSON.
    ///
    /// # Errors
    ///
    /// Same as [`Gateway::invoke_v1`], plus `GatewayError::Serialization`.
    pub async fn invoke(&self, ctx: &Context, event: GatewayEvent) -> Result<Value, GatewayError> {
        let request_id = event.request_id().to_string();

        match event {
            GatewayEvent::V1(event) => {
                debug!(request_id = %request_id, event = ?event, "v1 request");
                let response = self.invoke_v1(ctx, event).await?;
                debug!(request_id = %request_id, response = ?response, "v1 response");
                serde_json::to_value(response).map_err(GatewayError::Serialization)
            }
            GatewayEvent::V2(event) => {
                debug!(request_id = %request_id, event = ?event, "v2 request");
                let response = self.invoke_v2(ctx, event).await?;
                debug!(request_id = %request_id, response = ?response, "v2 response");
                serde_json::to_value(response).map_err(GatewayError::Serialization)
            }
        }
    }

    /// Lambda entry point. Classified failures are logged and answered with
    /// [`Gateway::default_response`] in the shape of the incoming event.
    ///
    /// # Errors
    ///
    /// Returns a `Diagnostic` only when even the default response cannot be
    /// serialized.
    pub async fn handle(&self, event: LambdaEvent<Value>) -> Result<Value, Diagnostic> {
        let (payload, ctx) = event.into_parts();
        info!(request_id = %ctx.request_id, "Invocation received");

        let event = match GatewayEvent::from_value(payload) {
            Ok(event) => event,
            Err(e) => {
                error!(error = %e, error_type = e.error_type(), "Rejecting event");
                return self.fallback(PayloadVersion::V1);
            }
        };

        let version = event.version();
        match self.invoke(&ctx, event).await {
            Ok(response) => Ok(response),
            Err(e) => {
                error!(
                    error = %e,
                    error_type = e.error_type(),
                    "Invocation failed, returning default response"
                );
                self.fallback(version)
            }
        }
    }

    /// Runs the Lambda runtime loop until the runtime shuts down.
    ///
    /// # Errors
    ///
    /// Returns the runtime's error if it cannot start or talk to the Lambda API.
    pub async fn start(self) -> Result<(), Error> {
        let gateway = Arc::new(self);
        lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
            let gateway = Arc::clone(&gateway);
            async move { gateway.handle(event).await }
        }))
        .await
    }

    async fn serve(&self, ctx: &Context, request: Request) -> Result<ResponseDescriptor, GatewayError> {
        let mut writer = ResponseWriter::new();

        // the provider runs on first use, so its panics are caught here too
        AssertUnwindSafe(async {
            let handler = self.resolve_handler(ctx);
            handler.serve_http(request, &mut writer).await;
        })
        .catch_unwind()
        .await
        .map_err(|panic| GatewayError::HandlerPanicked(panic_message(panic.as_ref())))?;

        Ok(writer.end())
    }

    fn resolve_handler(&self, ctx: &Context) -> Arc<dyn Handler> {
        let handler = self.handler.get_or_init(|| match &self.provider {
            Some(provider) => {
                info!("Building handler from provider");
                provider(ctx)
            }
            None => Arc::new(NotFound),
        });
        Arc::clone(handler)
    }

    fn fallback(&self, version: PayloadVersion) -> Result<Value, Diagnostic> {
        let response = match version {
            PayloadVersion::V1 => serde_json::to_value(self.default_response.to_v1()),
            PayloadVersion::V2 => serde_json::to_value(self.default_response.to_v2()),
        };
        response.map_err(|e| GatewayError::Serialization(e).to_diagnostic())
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

/// Options for a [`Gateway`].
pub struct GatewayBuilder {
    handler: Option<Arc<dyn Handler>>,
    provider: Option<HandlerProvider>,
    error_headers: BTreeMap<String, String>,
    error_body: String,
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self {
            handler: None,
            provider: None,
            error_headers: BTreeMap::from([(
                "Content-Type".to_string(),
                DEFAULT_ERROR_CONTENT_TYPE.to_string(),
            )]),
            error_body: DEFAULT_ERROR_BODY.to_string(),
        }
    }
}

impl GatewayBuilder {
    /// Handler serving every request.
    #[must_use]
    pub fn handler(mut self, handler: impl Handler + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Builds the handler lazily, once, on the first invocation. Takes
    /// precedence over [`GatewayBuilder::handler`].
    #[must_use]
    pub fn handler_provider<F>(mut self, provider: F) -> Self
    where
        F: Fn(&Context) -> Arc<dyn Handler> + Send + Sync + 'static,
    {
        self.provider = Some(Box::new(provider));
        self
    }

    /// Headers merged into the default error response.
    #[must_use]
    pub fn default_error_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.error_headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Body of the default error response. An empty body is ignored.
    #[must_use]
    pub fn default_error_body(mut self, body: impl Into<String>) -> Self {
        let body = body.into();
        if !body.is_empty() {
            self.error_body = body;
        }
        self
    }

    #[must_use]
    pub fn build(self) -> Gateway {
        let handler = if self.provider.is_some() {
            OnceLock::new()
        } else {
            OnceLock::from(self.handler.unwrap_or_else(|| Arc::new(NotFound)))
        };

        Gateway {
            handler,
            provider: self.provider,
            default_response: ResponseDescriptor {
                status_code: DEFAULT_ERROR_STATUS,
                headers: self.error_headers,
                body: self.error_body,
                ..ResponseDescriptor::default()
            },
        }
    }
}
