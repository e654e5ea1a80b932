//! Storage path helpers
//!
//! Stored files are addressed by `bucket` plus an object path. Rows only keep
//! the public URL, so deleting a file means recovering the object path from
//! that URL first.

/// Recover the object path from a public storage URL.
///
/// Accepts the canonical `/storage/v1/object/public/{bucket}/` form and, as a
/// fallback, any URL containing `/{bucket}/`. Returns `None` for external
/// URLs that never lived in the given bucket.
pub fn object_path_from_public_url(bucket: &str, url: &str) -> Option<String> {
    let canonical = format!("/storage/v1/object/public/{}/", bucket);
    if let Some(idx) = url.find(&canonical) {
        let path = &url[idx + canonical.len()..];
        return non_empty(path);
    }

    let marker = format!("/{}/", bucket);
    if let Some(idx) = url.find(&marker) {
        let path = &url[idx + marker.len()..];
        return non_empty(path);
    }

    None
}

fn non_empty(path: &str) -> Option<String> {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}

/// Object path for a fresh upload: `{prefix_}{millis}_{sanitized name}`.
///
/// The millisecond timestamp keeps concurrent uploads of identically named
/// files from clobbering each other.
pub fn object_name(prefix: Option<&str>, filename: &str, timestamp_millis: i64) -> String {
    let safe = sanitize_filename(filename);
    match prefix {
        Some(prefix) if !prefix.is_empty() => {
            format!("{}_{}_{}", prefix, timestamp_millis, safe)
        }
        _ => format!("{}_{}", timestamp_millis, safe),
    }
}

/// Strip path separators and other URL-hostile characters from a filename
fn sanitize_filename(filename: &str) -> String {
    let cleaned: String = filename
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
