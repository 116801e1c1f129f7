//! Text vs binary classification of response bodies.
//!
//! API Gateway only passes text bodies through unchanged; anything else must
//! be base64-encoded and flagged as such.

use super::headers::HeaderTable;

/// Non-`text/*` media types whose bodies are text.
const TEXT_MEDIA_TYPES: [&str; 4] = [
    "application/json",
    "application/xml",
    "application/javascript",
    "image/svg+xml",
];

/// Lowercased `type/subtype` of a `Content-Type` value, parameters removed.
///
/// Returns `None` when the value is not a syntactically valid media type.
#[must_use]
pub fn media_type(content_type: &str) -> Option<String> {
    let essence = content_type
        .split_once(';')
        .map_or(content_type, |(essence, _)| essence)
        .trim()
        .to_ascii_lowercase();

    let (kind, subtype) = essence.split_once('/')?;
    if !is_token(kind) || !is_token(subtype) {
        return None;
    }

    Some(essence)
}

/// Whether a body with this `Content-Type` can be sent as text.
///
/// Matching is case-insensitive and ignores parameters. Besides `text/*`,
/// the JSON/XML/JavaScript types and any `+json` / `+xml` structured
/// syntax suffix count as text. Absent or unparseable values do not.
#[must_use]
pub fn is_text_mime(content_type: &str) -> bool {
    let Some(essence) = media_type(content_type) else {
        return false;
    };

    essence.starts_with("text/")
        || TEXT_MEDIA_TYPES.contains(&essence.as_str())
        || essence.ends_with("+json")
        || essence.ends_with("+xml")
}

/// Whether a `Content-Encoding` value means the bytes are no longer plain text.
#[must_use]
pub fn is_compressed(content_encoding: &str) -> bool {
    let encoding = content_encoding.trim();
    !encoding.is_empty() && !encoding.eq_ignore_ascii_case("identity")
}

/// Whether a response with these headers must be base64-encoded.
#[must_use]
pub fn is_binary(headers: &HeaderTable) -> bool {
    !is_text_mime(headers.get("Content-Type").unwrap_or_default())
        || headers.get("Content-Encoding").is_some_and(is_compressed)
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric()
                || matches!(
                    b,
                    b'!' | b'#'
                        | b'$'
                        | b'%'
                        | b'&'
                        | b'\''
                        | b'*'
                        | b'+'
                        | b'-'
                        | b'.'
                        | b'^'
                        | b'_'
                        | b'`'
                        | b'|'
                        | b'~'
                )
        })
}
