//! Query normalization for cache keys.

/// Marker that embedding pages append to the post path.
const SUFFIX_MARKER: &str = "comments.json";

/// Drop the trailing `comments.json` from a request path.
///
/// Only path-derived keys carry the marker; explicit search terms are used as given.
pub fn strip_marker(path: &str) -> &str {
    path.strip_suffix(SUFFIX_MARKER).unwrap_or(path)
}

/// Normalize a raw query into its cache key.
///
/// Surrounding whitespace is stripped, then the remainder is cleaned
/// lexically as a slash-separated path.
pub fn normalize_query(raw: &str) -> String {
    clean_path(raw.trim())
}

/// Lexical path cleaning.
///
/// Repeated separators collapse, `.` segments vanish, `..` consumes the
/// preceding segment (and is dropped at the root of an absolute path), and a
/// trailing separator is removed. An empty result becomes `.`.
fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if !rooted => segments.push(".."),
                _ => {}
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}
