//! Error types for the gateway translation layer.
//!
//! Every variant is terminal for the invocation it belongs to: the HTTP
//! handler is never called with a partially translated request, and the
//! gateway answers with its default error response instead.

use lambda_runtime::Diagnostic;
use thiserror::Error;

/// Classified failure of a single invocation.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The event path is not a valid URL path (control bytes, bad escapes).
    #[error("gateway[request]: parsing path {path:?} failed: {reason}")]
    PathParseFailed { path: String, reason: &'static str },

    /// The event body was flagged as base64 but does not decode.
    #[error("gateway[request]: decoding base64 body")]
    BodyDecodeFailed(#[source] base64::DecodeError),

    /// The method, URI or a header was rejected while building the request.
    #[error("gateway[request]: fail to create request")]
    RequestConstructionFailed(#[source] http::Error),

    /// The payload is neither a v1 proxy event nor a v2 HTTP API event.
    #[error("gateway: unsupported event: {0}")]
    UnsupportedEvent(String),

    /// The HTTP handler panicked before the response was captured.
    #[error("gateway: handler panicked: {0}")]
    HandlerPanicked(String),

    /// The wire response could not be turned into JSON.
    #[error("gateway: serializing response")]
    Serialization(#[source] serde_json::Error),
}

impl GatewayError {
    /// Stable kind name, used as the `errorType` reported to Lambda.
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::PathParseFailed { .. } => "PathParseFailed",
            Self::BodyDecodeFailed(_) => "BodyDecodeFailed",
            Self::RequestConstructionFailed(_) => "RequestConstructionFailed",
            Self::UnsupportedEvent(_) => "UnsupportedEvent",
            Self::HandlerPanicked(_) => "HandlerPanicked",
            Self::Serialization(_) => "SerializationError",
        }
    }

    /// Converts the error into a Lambda `Diagnostic`, keeping the full cause chain.
    #[must_use]
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }

        Diagnostic {
            error_type: self.error_type().to_string(),
            error_message: message,
        }
    }
}

impl From<http::Error> for GatewayError {
    fn from(error: http::Error) -> Self {
        Self::RequestConstructionFailed(error)
    }
}
