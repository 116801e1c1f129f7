//! The closed set of event shapes the gateway accepts.

use serde_json::Value;

use super::error::GatewayError;
use super::v1::ApiGatewayProxyRequest;
use super::v2::ApiGatewayV2HttpRequest;

/// Payload format of an API Gateway integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadVersion {
    V1,
    V2,
}

/// A gateway event, resolved once at the boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    V1(ApiGatewayProxyRequest),
    V2(ApiGatewayV2HttpRequest),
}

impl GatewayEvent {
    /// Resolves a raw Lambda payload into one of the supported event shapes.
    ///
    /// `"version": "2.0"` selects the HTTP API shape; any other object that
    /// carries `httpMethod` (or declares `"version": "1.0"`) is a proxy event.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::UnsupportedEvent` when the payload matches
    /// neither shape or fails to deserialize into the selected one.
    pub fn from_value(payload: Value) -> Result<Self, GatewayError> {
        let version = payload.get("version").and_then(Value::as_str);

        if version == Some("2.0") {
            return serde_json::from_value(payload)
                .map(Self::V2)
                .map_err(|e| GatewayError::UnsupportedEvent(format!("invalid v2 event: {e}")));
        }

        if version == Some("1.0") || payload.get("httpMethod").is_some() {
            return serde_json::from_value(payload)
                .map(Self::V1)
                .map_err(|e| GatewayError::UnsupportedEvent(format!("invalid v1 event: {e}")));
        }

        Err(GatewayError::UnsupportedEvent(
            "payload is neither an API Gateway proxy event nor an HTTP API event".to_string(),
        ))
    }

    #[must_use]
    pub const fn version(&self) -> PayloadVersion {
        match self {
            Self::V1(_) => PayloadVersion::V1,
            Self::V2(_) => PayloadVersion::V2,
        }
    }

    /// The gateway-assigned request id, used to correlate log lines.
    #[must_use]
    pub fn request_id(&self) -> &str {
        match self {
            Self::V1(event) => &event.request_context.request_id,
            Self::V2(event) => &event.request_context.request_id,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolves_v1_with_null_maps() {
        let payload = json!({
            "resource": "/{proxy+}",
            "path": "/pets/luna",
            "httpMethod": "POST",
            "headers": null,
            "multiValueHeaders": null,
            "queryStringParameters": null,
            "multiValueQueryStringParameters": null,
            "requestContext": {
                "requestId": "abc",
                "stage": "prod",
                "identity": {"sourceIp": "1.2.3.4", "userAgent": "curl"},
                "accountId": "123456789012"
            },
            "body": null,
            "isBase64Encoded": false
        });

        let event = GatewayEvent::from_value(payload).unwrap();
        assert_eq!(event.version(), PayloadVersion::V1);
        assert_eq!(event.request_id(), "abc");

        let GatewayEvent::V1(event) = event else {
            panic!("expected a v1 event");
        };
        assert_eq!(event.path, "/pets/luna");
        assert!(event.headers.is_empty());
        assert_eq!(event.body, "");
        assert_eq!(event.request_context.identity.source_ip, "1.2.3.4");
        assert_eq!(event.request_context.extra["accountId"], "123456789012");
        assert_eq!(event.request_context.identity.extra["userAgent"], "curl");
    }

    #[test]
    fn test_resolves_v2() {
        let payload = json!({
            "version": "2.0",
            "routeKey": "$default",
            "rawPath": "/pets/luna",
            "rawQueryString": "order=desc",
            "cookies": ["a=1", "b=2"],
            "headers": {"accept": "text/html,application/json"},
            "requestContext": {
                "requestId": "xyz",
                "stage": "$default",
                "http": {"method": "GET", "path": "/pets/luna", "sourceIp": "5.6.7.8"}
            },
            "isBase64Encoded": false
        });

        let event = GatewayEvent::from_value(payload).unwrap();
        assert_eq!(event.version(), PayloadVersion::V2);
        assert_eq!(event.request_id(), "xyz");

        let GatewayEvent::V2(event) = event else {
            panic!("expected a v2 event");
        };
        assert_eq!(event.cookies, vec!["a=1", "b=2"]);
        assert_eq!(event.request_context.http.source_ip, "5.6.7.8");
    }

    #[test]
    fn test_rejects_unknown_payload() {
        let err = GatewayEvent::from_value(json!({"method": "tools/call"})).unwrap_err();
        assert_eq!(err.error_type(), "UnsupportedEvent");
    }

    #[test]
    fn test_rejects_malformed_v2() {
        let err = GatewayEvent::from_value(json!({"version": "2.0", "cookies": "a=1"})).unwrap_err();
        assert!(matches!(err, GatewayError::UnsupportedEvent(_)));
    }
}
