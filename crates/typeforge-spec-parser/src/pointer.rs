//! JSON Pointer (RFC 6901) addressing and `$ref` target parsing.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Location of a fragment: the document it lives in plus a JSON pointer.
///
/// Doubles as the identity of a `$ref` target. Two pointers are equal when
/// both the document URI and the (escaped) pointer are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourcePointer {
    /// Document URI as known to the `DocumentSet`.
    pub document: String,
    /// Escaped JSON pointer, empty for the document root.
    pub pointer: String,
}

impl SourcePointer {
    pub fn new(document: impl Into<String>, pointer: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            pointer: pointer.into(),
        }
    }

    /// The root of a document.
    pub fn root(document: impl Into<String>) -> Self {
        Self::new(document, "")
    }

    /// Pointer to a named child (the segment is escaped).
    pub fn child(&self, segment: &str) -> Self {
        Self {
            document: self.document.clone(),
            pointer: format!("{}/{}", self.pointer, escape_segment(segment)),
        }
    }

    /// Pointer to an array element.
    pub fn index(&self, index: usize) -> Self {
        Self {
            document: self.document.clone(),
            pointer: format!("{}/{}", self.pointer, index),
        }
    }

    /// Unescaped pointer segments.
    pub fn segments(&self) -> Vec<String> {
        self.pointer
            .split('/')
            .skip(1)
            .map(unescape_segment)
            .collect()
    }

    /// The last unescaped segment, if any.
    pub fn last_segment(&self) -> Option<String> {
        self.segments().pop()
    }

    /// Whether this pointer lives in (or below) `other`.
    pub fn starts_with(&self, other: &SourcePointer) -> bool {
        self.document == other.document
            && (self.pointer == other.pointer
                || self.pointer.starts_with(&format!("{}/", other.pointer)))
    }
}

impl fmt::Display for SourcePointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.document, self.pointer)
    }
}

/// Escape a pointer segment (`~` → `~0`, `/` → `~1`).
pub fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Reverse of [`escape_segment`].
pub fn unescape_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// Walk a JSON pointer through a value.
///
/// Returns `None` when any segment does not exist.
pub fn lookup<'a>(root: &'a Value, pointer: &str) -> Option<&'a Value> {
    if pointer.is_empty() {
        return Some(root);
    }
    let rest = pointer.strip_prefix('/')?;
    let mut current = root;
    for segment in rest.split('/') {
        let key = unescape_segment(segment);
        current = match current {
            Value::Object(map) => map.get(&key)?,
            Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Parse a `$ref` string relative to the document that contains it.
///
/// `#/definitions/Pet` stays in `base_document`; `common.yaml#/definitions/Tag`
/// is resolved against the directory of `base_document`. Returns `None` for
/// fragments that are not JSON pointers (e.g. `#anchor`).
pub fn parse_reference(reference: &str, base_document: &str) -> Option<SourcePointer> {
    let (document_part, fragment) = match reference.split_once('#') {
        Some((doc, frag)) => (doc, frag),
        None => (reference, ""),
    };
    if !fragment.is_empty() && !fragment.starts_with('/') {
        return None;
    }
    let document = if document_part.is_empty() {
        base_document.to_string()
    } else {
        join_uri(base_document, document_part)
    };
    Some(SourcePointer::new(document, decode_percent(fragment)))
}

/// Resolve `relative` against the directory of `base`.
pub fn join_uri(base: &str, relative: &str) -> String {
    if is_remote(relative) || relative.starts_with('/') {
        return normalize_uri(relative);
    }
    let directory = match base.rfind('/') {
        Some(idx) if is_remote(base) && idx < base.find("://").map_or(0, |i| i + 3) => {
            format!("{}/", base)
        }
        Some(idx) => base[..=idx].to_string(),
        None => String::new(),
    };
    normalize_uri(&format!("{}{}", directory, relative))
}

/// Whether a URI is fetched over HTTP(S).
pub fn is_remote(uri: &str) -> bool {
    uri.starts_with("http://") || uri.starts_with("https://")
}

/// Collapse `.` and `..` segments, keeping any `scheme://authority` prefix.
fn normalize_uri(uri: &str) -> String {
    let (prefix, path) = match uri.find("://") {
        Some(idx) => {
            let after = idx + 3;
            match uri[after..].find('/') {
                Some(slash) => uri.split_at(after + slash),
                None => (uri, ""),
            }
        }
        None => ("", uri),
    };

    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(segments.last(), Some(last) if *last != "..") {
                    segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let mut out = String::from(prefix);
    if absolute {
        out.push('/');
    }
    out.push_str(&segments.join("/"));
    out
}

/// Decode the percent-escapes that commonly appear in path pointers
/// (`#/paths/~1pets~1%7Bid%7D`).
fn decode_percent(fragment: &str) -> String {
    if !fragment.contains('%') {
        return fragment.to_string();
    }
    let bytes = fragment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(value) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(value);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).unwrap_or_else(|_| fragment.to_string())
}
