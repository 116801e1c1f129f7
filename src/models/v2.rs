//! API Gateway HTTP API payloads (format version 2.0).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

use crate::utils::null_as_default;

/// Event delivered for every HTTP call through an HTTP API integration.
///
/// Repeated headers arrive comma-joined in `headers`; cookies arrive in their
/// own list instead of a `Cookie` header.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiGatewayV2HttpRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub version: String,
    #[serde(deserialize_with = "null_as_default")]
    pub route_key: String,
    #[serde(deserialize_with = "null_as_default")]
    pub raw_path: String,
    #[serde(deserialize_with = "null_as_default")]
    pub raw_query_string: String,
    #[serde(deserialize_with = "null_as_default")]
    pub cookies: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub headers: HashMap<String, String>,
    #[serde(deserialize_with = "null_as_default")]
    pub query_string_parameters: HashMap<String, String>,
    #[serde(deserialize_with = "null_as_default")]
    pub path_parameters: HashMap<String, String>,
    #[serde(deserialize_with = "null_as_default")]
    pub stage_variables: HashMap<String, String>,
    #[serde(deserialize_with = "null_as_default")]
    pub request_context: ApiGatewayV2HttpRequestContext,
    #[serde(deserialize_with = "null_as_default")]
    pub body: String,
    #[serde(deserialize_with = "null_as_default")]
    pub is_base64_encoded: bool,
}

/// Request context of a v2 event; untyped fields are kept in `extra`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiGatewayV2HttpRequestContext {
    #[serde(deserialize_with = "null_as_default")]
    pub request_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub stage: String,
    #[serde(deserialize_with = "null_as_default")]
    pub http: ApiGatewayV2HttpDescription,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `requestContext.http` block of a v2 event.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiGatewayV2HttpDescription {
    #[serde(deserialize_with = "null_as_default")]
    pub method: String,
    #[serde(deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(deserialize_with = "null_as_default")]
    pub protocol: String,
    #[serde(deserialize_with = "null_as_default")]
    pub source_ip: String,
    #[serde(deserialize_with = "null_as_default")]
    pub user_agent: String,
}

/// Response shape expected back from an HTTP API integration.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayV2HttpResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub multi_value_headers: BTreeMap<String, Vec<String>>,
    pub body: String,
    pub is_base64_encoded: bool,
    pub cookies: Vec<String>,
}
