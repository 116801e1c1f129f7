use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use url::form_urlencoded;

/// Builds the query string of a v1 event.
///
/// Precedence, lowest first: the query embedded in the path, then
/// `queryStringParameters` (one value per key, replacing), then
/// `multiValueQueryStringParameters` (the whole list per key, replacing).
/// The result is form-encoded with keys in sorted order.
#[must_use]
#[allow(clippy::implicit_hasher)]
pub fn compose_v1_query(
    embedded: Option<&str>,
    single: &HashMap<String, String>,
    multi: &HashMap<String, Vec<String>>,
) -> String {
    let mut values: BTreeMap<String, Vec<String>> = BTreeMap::new();

    if let Some(query) = embedded {
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            values
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }
    }

    for (key, value) in single {
        values.insert(key.clone(), vec![value.clone()]);
    }

    for (key, list) in multi {
        values.insert(key.clone(), list.clone());
    }

    encode_query(&values)
}

/// Form-encodes `values`, one `key=value` pair per list element.
#[must_use]
pub fn encode_query(values: &BTreeMap<String, Vec<String>>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, list) in values {
        for value in list {
            serializer.append_pair(key, value);
        }
    }
    serializer.finish()
}

/// Percent-escapes the bytes a URI query may not carry literally (controls,
/// space, `"`, `#`, `<`, `>`, `\`). Existing escapes and every other
/// character are kept as they are.
#[must_use]
pub fn escape_query(query: &str) -> Cow<'_, str> {
    if !query.bytes().any(is_unsafe_query_byte) {
        return Cow::Borrowed(query);
    }

    let mut escaped = String::with_capacity(query.len() + 8);
    for ch in query.chars() {
        match u8::try_from(ch).ok().filter(|b| is_unsafe_query_byte(*b)) {
            Some(b) => escaped.push_str(&format!("%{b:02X}")),
            None => escaped.push(ch),
        }
    }
    Cow::Owned(escaped)
}

const fn is_unsafe_query_byte(b: u8) -> bool {
    b < 0x20 || matches!(b, 0x7f | b' ' | b'"' | b'#' | b'<' | b'>' | b'\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn multi(pairs: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.iter().map(ToString::to_string).collect()))
            .collect()
    }

    #[test]
    fn test_single_values_sorted_and_encoded() {
        let query = compose_v1_query(
            None,
            &single(&[("order", "desc"), ("fields", "name,species")]),
            &HashMap::new(),
        );
        assert_eq!(query, "fields=name%2Cspecies&order=desc");
    }

    #[test]
    fn test_multi_replaces_single_for_same_key() {
        let query = compose_v1_query(
            None,
            &single(&[("order", "desc")]),
            &multi(&[("order", &["desc", "asc"])]),
        );
        assert_eq!(query, "order=desc&order=asc");
    }

    #[test]
    fn test_embedded_query_is_lowest_precedence() {
        let query = compose_v1_query(
            Some("order=asc&page=2&page=3"),
            &single(&[("order", "desc")]),
            &HashMap::new(),
        );
        assert_eq!(query, "order=desc&page=2&page=3");
    }

    #[test]
    fn test_spaces_use_plus() {
        let query = compose_v1_query(None, &single(&[("q", "luna the cat")]), &HashMap::new());
        assert_eq!(query, "q=luna+the+cat");
    }

    #[test]
    fn test_escape_query_only_touches_unsafe_bytes() {
        assert_eq!(escape_query("q=%22x%22&a=b|c{d}"), "q=%22x%22&a=b|c{d}");
        assert_eq!(escape_query("q=\"x\""), "q=%22x%22");
        assert_eq!(escape_query("q=a b&tag=#1"), "q=a%20b&tag=%231");
        assert_eq!(escape_query("q=<café>\\"), "q=%3Ccafé%3E%5C");
        assert_eq!(escape_query("q=\u{7f}\t"), "q=%7F%09");
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(compose_v1_query(None, &HashMap::new(), &HashMap::new()), "");
    }
}
