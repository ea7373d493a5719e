use super::HeaderField;

/// Header name prefix compared byte-for-byte (case-sensitive).
const CONTENT_TYPE_PREFIX: &[u8] = b"Content-type";
const HTML_MIME: &str = "text/html";

/// Returns `false` only when a `Content-type` header is present and its value
/// lacks `text/html`. No Content-Type header means the body is treated as HTML.
pub fn is_html(headers: &[HeaderField]) -> bool {
    !headers.iter().any(disqualifies)
}

fn disqualifies(header: &HeaderField) -> bool {
    header.name.as_bytes().starts_with(CONTENT_TYPE_PREFIX) && !header.value.contains(HTML_MIME)
}

/// Returns the response's content coding when it is anything but `identity`.
/// An encoded body cannot be searched for reflected parameters.
pub fn content_encoding(headers: &[HeaderField]) -> Option<&str> {
    headers
        .iter()
        .filter(|h| h.name.eq_ignore_ascii_case("content-encoding"))
        .map(|h| h.value.trim())
        .find(|v| !v.is_empty() && !v.eq_ignore_ascii_case("identity"))
}

/// Renders a lowercase `http` header name the way a CGI-style server emits
/// it: first letter upper-cased, the rest untouched (`content-type` ->
/// `Content-type`).
pub fn staged_header_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
