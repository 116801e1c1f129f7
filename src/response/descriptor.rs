use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::BTreeMap;

use super::headers::HeaderTable;
use super::mime::is_binary;
use crate::models::v1::ApiGatewayProxyResponse;
use crate::models::v2::ApiGatewayV2HttpResponse;

const SET_COOKIE: &str = "Set-Cookie";

/// Version-agnostic description of a captured response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseDescriptor {
    pub status_code: u16,
    /// Last value of every header.
    pub headers: BTreeMap<String, String>,
    /// Full value list of every header written more than once.
    pub multi_value_headers: BTreeMap<String, Vec<String>>,
    /// Raw text, or base64 when `is_base64_encoded` is set.
    pub body: String,
    pub is_base64_encoded: bool,
    /// Every `Set-Cookie` value, in write order.
    pub cookies: Vec<String>,
}

impl ResponseDescriptor {
    /// Builds the descriptor from committed headers and the captured body,
    /// making the text/base64 decision.
    #[must_use]
    pub fn capture(status_code: u16, headers: &HeaderTable, body: Vec<u8>) -> Self {
        let is_base64_encoded = is_binary(headers);
        let body = if is_base64_encoded {
            STANDARD.encode(&body)
        } else {
            String::from_utf8(body)
                .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
        };

        let mut single = BTreeMap::new();
        let mut multi = BTreeMap::new();
        let mut cookies = Vec::new();

        for (name, values) in headers.iter() {
            if let Some(last) = values.last() {
                single.insert(name.to_string(), last.clone());
            }
            if values.len() > 1 {
                multi.insert(name.to_string(), values.to_vec());
            }
            if is_set_cookie(name) {
                cookies.extend(values.iter().cloned());
            }
        }

        Self {
            status_code,
            headers: single,
            multi_value_headers: multi,
            body,
            is_base64_encoded,
            cookies,
        }
    }

    /// Response for a v1 proxy integration. Cookies stay in the header maps.
    #[must_use]
    pub fn to_v1(&self) -> ApiGatewayProxyResponse {
        ApiGatewayProxyResponse {
            status_code: self.status_code,
            headers: self.headers.clone(),
            multi_value_headers: self.multi_value_headers.clone(),
            body: self.body.clone(),
            is_base64_encoded: self.is_base64_encoded,
        }
    }

    /// Response for an HTTP API integration.
    ///
    /// `Set-Cookie` moves from the header maps into `cookies`, and repeated
    /// headers are comma-joined into `headers`, since HTTP APIs ignore
    /// `multiValueHeaders`.
    #[must_use]
    pub fn to_v2(&self) -> ApiGatewayV2HttpResponse {
        let headers = self
            .headers
            .iter()
            .filter(|(name, _)| !is_set_cookie(name))
            .map(|(name, value)| {
                let value = self
                    .multi_value_headers
                    .get(name)
                    .map_or_else(|| value.clone(), |values| values.join(","));
                (name.clone(), value)
            })
            .collect();

        let multi_value_headers = self
            .multi_value_headers
            .iter()
            .filter(|(name, _)| !is_set_cookie(name))
            .map(|(name, values)| (name.clone(), values.clone()))
            .collect();

        ApiGatewayV2HttpResponse {
            status_code: self.status_code,
            headers,
            multi_value_headers,
            body: self.body.clone(),
            is_base64_encoded: self.is_base64_encoded,
            cookies: self.cookies.clone(),
        }
    }
}

fn is_set_cookie(name: &str) -> bool {
    name.eq_ignore_ascii_case(SET_COOKIE)
}
