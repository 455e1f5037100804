use encoding::label::encoding_from_whatwg_label;
use encoding::{DecoderTrap, Encoding};
use url::Url;

/// Decodes a response body with its declared charset.
/// Falls back to lossy UTF-8 when the label is unknown or decoding fails.
pub fn decode_body(body: &[u8], charset: &str) -> String {
    match encoding_from_whatwg_label(charset) {
        Some(enc) => match enc.decode(body, DecoderTrap::Strict) {
            Ok(x) => x,
            _ => String::from_utf8_lossy(body).to_string(),
        },
        None => String::from_utf8_lossy(body).to_string(),
    }
}

/// Lowercased, dash-separated slug: whitespace becomes `-`, anything outside `[a-z0-9-]` is dropped.
pub fn slugify(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

/// Last non-empty path segment of the URL, e.g. `solo-leveling` for `/manga/solo-leveling/`.
pub fn last_path_segment(url: &Url) -> Option<String> {
    url.path_segments()?
        .filter(|part| !part.is_empty())
        .last()
        .map(ToString::to_string)
}

/// Identifier from URL slug, falling back to the slugified title.
pub fn derive_identifier(url: Option<&Url>, title: &str) -> Option<String> {
    url.and_then(last_path_segment)
        .or_else(|| Some(slugify(title)))
        .filter(|id| !id.is_empty())
}

/// Identifier from the last path segment plus the query, e.g. `read-ch-2` for `/read?ch=2`.
/// `None` when the URL has no query.
pub fn query_identifier(url: &Url) -> Option<String> {
    let query = url.query().filter(|q| !q.is_empty())?;
    let base = last_path_segment(url).unwrap_or_default();
    let id = slugify(&format!("{} {}", base, query.replace(|c: char| c == '=' || c == '&', " ")));
    Some(id).filter(|id| !id.is_empty())
}

/// Collapses runs of whitespace into a single space.
pub fn squash_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strips `prefix` from the start of `s`, ignoring ASCII case.
pub fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> &'a str {
    match s.get(..prefix.len()) {
        Some(head) if !prefix.is_empty() && head.eq_ignore_ascii_case(prefix) => {
            s[prefix.len()..].trim_start()
        }
        _ => s,
    }
}

/// Resolves `raw` against `base`. Absolute URLs are returned unchanged,
/// root-relative ones take the origin of `base`.
pub fn absolutize(base: &Url, raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "#" || raw.starts_with("javascript:") || raw.starts_with("data:")
    {
        return None;
    }
    base.join(raw).ok()
}
