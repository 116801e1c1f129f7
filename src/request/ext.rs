//! Request metadata that has no slot in `http::Request`, carried as
//! extensions and read back through [`RequestExt`].

use http::header::{COOKIE, HOST};
use http::{Extensions, Request};
use lambda_runtime::Context;
use serde::Serialize;

use crate::models::v1::ApiGatewayProxyRequestContext;
use crate::models::v2::ApiGatewayV2HttpRequestContext;

/// The original gateway request context of the invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GatewayRequestContext {
    V1(ApiGatewayProxyRequestContext),
    V2(ApiGatewayV2HttpRequestContext),
}

impl GatewayRequestContext {
    #[must_use]
    pub fn request_id(&self) -> &str {
        match self {
            Self::V1(ctx) => &ctx.request_id,
            Self::V2(ctx) => &ctx.request_id,
        }
    }

    #[must_use]
    pub fn stage(&self) -> &str {
        match self {
            Self::V1(ctx) => &ctx.stage,
            Self::V2(ctx) => &ctx.stage,
        }
    }
}

// Private key type: only this module can insert or read the entry.
#[derive(Debug, Clone)]
struct RawGatewayContext(GatewayRequestContext);

pub(super) fn attach_gateway_context(extensions: &mut Extensions, ctx: GatewayRequestContext) {
    extensions.insert(RawGatewayContext(ctx));
}

/// The request target exactly as the server-side request line carries it
/// (origin form), independent of the absolute URI built from `Host`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestUri(String);

impl RequestUri {
    #[must_use]
    pub const fn new(uri: String) -> Self {
        Self(uri)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Address of the caller, as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAddr(String);

impl RemoteAddr {
    #[must_use]
    pub const fn new(addr: String) -> Self {
        Self(addr)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Accessors for what the gateway attached to a materialized request.
pub trait RequestExt {
    /// Literal request URI, falling back to the URI's path and query.
    fn request_uri(&self) -> &str;

    fn remote_addr(&self) -> Option<&str>;

    /// Host from the URI authority, else from the `Host` header.
    fn host(&self) -> Option<&str>;

    /// Value of the first cookie named `name` across all `Cookie` headers.
    fn cookie(&self, name: &str) -> Option<&str>;

    /// The original API Gateway request context of this invocation.
    fn gateway_context(&self) -> Option<&GatewayRequestContext>;

    /// The Lambda invocation context the request was built under.
    fn lambda_context(&self) -> Option<&Context>;
}

impl<B> RequestExt for Request<B> {
    fn request_uri(&self) -> &str {
        self.extensions().get::<RequestUri>().map_or_else(
            || self.uri().path_and_query().map_or("/", |pq| pq.as_str()),
            RequestUri::as_str,
        )
    }

    fn remote_addr(&self) -> Option<&str> {
        self.extensions().get::<RemoteAddr>().map(RemoteAddr::as_str)
    }

    fn host(&self) -> Option<&str> {
        self.uri()
            .host()
            .or_else(|| self.headers().get(HOST).and_then(|v| v.to_str().ok()))
    }

    fn cookie(&self, name: &str) -> Option<&str> {
        self.headers()
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    fn gateway_context(&self) -> Option<&GatewayRequestContext> {
        self.extensions()
            .get::<RawGatewayContext>()
            .map(|raw| &raw.0)
    }

    fn lambda_context(&self) -> Option<&Context> {
        self.extensions().get::<Context>()
    }
}
