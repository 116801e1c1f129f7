//! Gateway event → [`RequestDescriptor`] → `http::Request`.
//!
//! Both event shapes are normalized into one descriptor first, so the
//! materialization rules (URI, body decoding, header precedence, metadata)
//! live in a single place.

mod ext;
mod path;
mod query;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use http::header::{CONTENT_LENGTH, COOKIE, HOST};
use http::uri::{Authority, Scheme};
use http::{HeaderName, HeaderValue, Method, Uri};
use lambda_runtime::Context;
use lambda_runtime::tracing::warn;
use std::collections::BTreeMap;

use crate::models::error::GatewayError;
use crate::models::v1::ApiGatewayProxyRequest;
use crate::models::v2::ApiGatewayV2HttpRequest;

pub use ext::{GatewayRequestContext, RemoteAddr, RequestExt, RequestUri};
pub use path::{ParsedPath, parse_path};
pub use query::{compose_v1_query, encode_query, escape_query};

/// The request type handed to HTTP handlers. The body is fully decoded.
pub type Request = http::Request<Bytes>;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
pub const X_STAGE: HeaderName = HeaderName::from_static("x-stage");
pub const X_AMZN_TRACE_ID: HeaderName = HeaderName::from_static("x-amzn-trace-id");

/// Version-agnostic description of one inbound HTTP call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    /// Raw path as received.
    pub path: String,
    /// Fully composed, form-encoded query string.
    pub query_string: String,
    /// Body as received, still base64 when `is_base64` is set.
    pub body: String,
    pub is_base64: bool,
    /// Empty means unspecified; materialized as `GET`.
    pub method: String,
    pub source_ip: String,
    /// Single-value headers, set before `multi_header` is appended.
    pub headers: BTreeMap<String, String>,
    pub multi_header: BTreeMap<String, Vec<String>>,
    /// Only populated for v2 events.
    pub cookies: Vec<String>,
    pub request_id: String,
    pub stage: String,
    pub raw_context: GatewayRequestContext,
}

impl RequestDescriptor {
    /// Normalizes a v1 proxy event.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::PathParseFailed` when `path` is not a valid URL path.
    pub fn from_v1(event: ApiGatewayProxyRequest) -> Result<Self, GatewayError> {
        let query_string = {
            let parsed = parse_path(&event.path)?;
            compose_v1_query(
                parsed.query,
                &event.query_string_parameters,
                &event.multi_value_query_string_parameters,
            )
        };
        let context = event.request_context;

        Ok(Self {
            path: event.path,
            query_string,
            body: event.body,
            is_base64: event.is_base64_encoded,
            method: event.http_method,
            source_ip: context.identity.source_ip.clone(),
            headers: event.headers.into_iter().collect(),
            multi_header: event.multi_value_headers.into_iter().collect(),
            cookies: Vec::new(),
            request_id: context.request_id.clone(),
            stage: context.stage.clone(),
            raw_context: GatewayRequestContext::V1(context),
        })
    }

    /// Normalizes a v2 HTTP API event. The path is only validated later, in
    /// [`RequestDescriptor::into_request`].
    #[must_use]
    pub fn from_v2(event: ApiGatewayV2HttpRequest) -> Self {
        let multi_header = event
            .headers
            .into_iter()
            .map(|(name, joined)| {
                let values = joined
                    .split(',')
                    .map(|value| value.trim_matches([' ', '\t']).to_string())
                    .collect();
                (name, values)
            })
            .collect();
        let context = event.request_context;

        Self {
            path: event.raw_path,
            query_string: event.raw_query_string,
            body: event.body,
            is_base64: event.is_base64_encoded,
            method: context.http.method.clone(),
            source_ip: context.http.source_ip.clone(),
            headers: BTreeMap::new(),
            multi_header,
            cookies: event.cookies,
            request_id: context.request_id.clone(),
            stage: context.stage.clone(),
            raw_context: GatewayRequestContext::V2(context),
        }
    }

    /// Materializes the descriptor into the request handed to the HTTP handler.
    ///
    /// `ctx` is attached to the request extensions, and its X-Ray trace id
    /// (if any) is forwarded as `X-Amzn-Trace-Id`.
    ///
    /// # Errors
    ///
    /// - `GatewayError::PathParseFailed` when `path` is not a valid URL path.
    /// - `GatewayError::BodyDecodeFailed` when a base64 body does not decode.
    /// - `GatewayError::RequestConstructionFailed` when the method, URI or a
    ///   header is rejected by `http`.
    pub fn into_request(self, ctx: &Context) -> Result<Request, GatewayError> {
        let parsed = parse_path(&self.path)?;
        let request_uri = if self.query_string.is_empty() {
            parsed.path
        } else {
            format!("{}?{}", parsed.path, escape_query(&self.query_string))
        };

        let body = decode_body(self.body, self.is_base64)?;
        let body_len = body.len();

        let method = if self.method.is_empty() {
            Method::GET.as_str()
        } else {
            self.method.as_str()
        };

        let mut request = http::Request::builder()
            .method(method)
            .uri(request_uri.as_str())
            .body(body)?;

        let headers = request.headers_mut();

        for (name, value) in &self.headers {
            headers.insert(header_name(name)?, header_value(value)?);
        }

        // appended, never replacing what the single-value table set
        for (name, values) in &self.multi_header {
            let name = header_name(name)?;
            for value in values {
                headers.append(name.clone(), header_value(value)?);
            }
        }

        for cookie in &self.cookies {
            headers.append(COOKIE, header_value(cookie)?);
        }

        if !headers.contains_key(CONTENT_LENGTH) && body_len > 0 {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(body_len));
        }

        headers.insert(X_REQUEST_ID, header_value(&self.request_id)?);
        headers.insert(X_STAGE, header_value(&self.stage)?);

        if let Some(trace_id) = ctx.xray_trace_id.as_deref() {
            headers.insert(X_AMZN_TRACE_ID, header_value(trace_id)?);
        }

        let extensions = request.extensions_mut();
        extensions.insert(RequestUri::new(request_uri));
        extensions.insert(RemoteAddr::new(self.source_ip));
        extensions.insert(ctx.clone());
        ext::attach_gateway_context(extensions, self.raw_context);

        let host = request
            .headers()
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        if let Some(host) = host {
            match with_authority(request.uri(), &host) {
                Ok(uri) => *request.uri_mut() = uri,
                Err(e) => {
                    warn!(host = %host, error = %e, "Host header is not a valid authority, keeping origin-form URI");
                }
            }
        }

        Ok(request)
    }
}

fn decode_body(body: String, is_base64: bool) -> Result<Bytes, GatewayError> {
    if is_base64 {
        STANDARD
            .decode(body)
            .map(Bytes::from)
            .map_err(GatewayError::BodyDecodeFailed)
    } else {
        Ok(Bytes::from(body))
    }
}

fn header_name(name: &str) -> Result<HeaderName, GatewayError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|e| GatewayError::from(http::Error::from(e)))
}

fn header_value(value: &str) -> Result<HeaderValue, GatewayError> {
    HeaderValue::from_bytes(value.as_bytes()).map_err(|e| GatewayError::from(http::Error::from(e)))
}

fn with_authority(uri: &Uri, host: &str) -> Result<Uri, http::Error> {
    let mut parts = uri.clone().into_parts();
    parts.scheme = Some(Scheme::HTTPS);
    parts.authority = Some(host.parse::<Authority>()?);
    Ok(Uri::from_parts(parts)?)
}
