use crate::models::error::GatewayError;

/// A request path that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath<'a> {
    /// Percent-escaped path, always starting with `/`.
    pub path: String,
    /// Query embedded in the raw path, without the leading `?`.
    pub query: Option<&'a str>,
}

/// Validates a raw gateway path and splits off any embedded query.
///
/// Control bytes and malformed percent escapes are rejected. Characters that
/// may not appear literally in a URI path are escaped; existing escapes are
/// kept as they are. A fragment, if present, is dropped.
///
/// # Errors
///
/// Returns `GatewayError::PathParseFailed` naming the offending path.
pub fn parse_path(raw: &str) -> Result<ParsedPath<'_>, GatewayError> {
    let fail = |reason| GatewayError::PathParseFailed {
        path: raw.to_string(),
        reason,
    };

    if raw.bytes().any(|b| b < 0x20 || b == 0x7f) {
        return Err(fail("invalid control character in URL"));
    }

    let without_fragment = raw.split_once('#').map_or(raw, |(before, _)| before);
    let (path, query) = match without_fragment.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (without_fragment, None),
    };

    if !has_valid_escapes(path) {
        return Err(fail("invalid URL escape"));
    }

    Ok(ParsedPath {
        path: escape_path(path),
        query,
    })
}

fn has_valid_escapes(path: &str) -> bool {
    let mut bytes = path.bytes();
    while let Some(b) = bytes.next() {
        if b != b'%' {
            continue;
        }
        match (bytes.next(), bytes.next()) {
            (Some(hi), Some(lo)) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => {}
            _ => return false,
        }
    }
    true
}

fn escape_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len() + 1);
    if !path.starts_with('/') {
        escaped.push('/');
    }

    let mut buf = [0; 4];
    for ch in path.chars() {
        if is_path_char(ch) {
            escaped.push(ch);
        } else {
            escaped.push_str(&urlencoding::encode(ch.encode_utf8(&mut buf)));
        }
    }
    escaped
}

// RFC 3986 pchar plus '/', and '%' for escapes that were already validated
const fn is_path_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || matches!(
            ch,
            '-' | '.'
                | '_'
                | '~'
                | '!'
                | '$'
                | '&'
                | '\''
                | '('
                | ')'
                | '*'
                | '+'
                | ','
                | ';'
                | '='
                | ':'
                | '@'
                | '/'
                | '%'
        )
}
