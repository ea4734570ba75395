//! Slash-separated path helpers.
//!
//! Snapshot paths are always `/`-separated regardless of platform, so these
//! helpers work on `&str` rather than [`std::path::Path`].

use std::cmp::Ordering;

use crate::error::VfsError;

/// Lexically clean a slash-separated path.
///
/// Removes empty and `.` segments and resolves `..` against preceding segments.
/// A leading `..` that cannot be resolved is kept for relative paths and dropped
/// for rooted ones. An empty result is returned as `"."`.
///
/// ```
/// use docgen_vfs::path::clean;
///
/// assert_eq!(clean("guide/./../intro.md"), "intro.md");
/// assert_eq!(clean("../x"), "../x");
/// assert_eq!(clean("/a//b/"), "/a/b");
/// assert_eq!(clean(""), ".");
/// ```
#[must_use]
pub fn clean(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut out: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if out.last().is_some_and(|last| *last != "..") {
                    out.pop();
                } else if !rooted {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }

    let joined = out.join("/");
    if rooted {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_owned()
    } else {
        joined
    }
}

/// Join two slash-separated paths and clean the result.
///
/// An empty or `"."` base yields the cleaned `rel`.
#[must_use]
pub fn join(base: &str, rel: &str) -> String {
    if base.is_empty() || base == "." {
        clean(rel)
    } else {
        clean(&format!("{base}/{rel}"))
    }
}

/// Directory part of a path, `"."` for top-level names.
#[must_use]
pub fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(pos) => &path[..pos],
        None => ".",
    }
}

/// Last segment of a path.
#[must_use]
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Extension of the last path segment, without the dot.
#[must_use]
pub fn extension(path: &str) -> Option<&str> {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(pos) => Some(&name[pos + 1..]),
    }
}

/// Validate and normalize a path for lookup in a snapshot.
///
/// The path must be non-empty, relative and must not contain `..` segments.
/// Empty and `.` segments are dropped, so `"."` normalizes to the root (`""`).
///
/// # Errors
///
/// Returns an invalid path error for empty, absolute or escaping paths.
pub fn normalize(path: &str) -> Result<String, VfsError> {
    if path.is_empty() || path.starts_with('/') || path.split('/').any(|s| s == "..") {
        return Err(VfsError::invalid_path(path));
    }
    Ok(path
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/"))
}

/// Order paths segment by segment.
///
/// Unlike plain byte order this keeps every directory's descendants in one
/// contiguous run right after the directory itself (`a`, `a/x`, `a-b` rather
/// than `a`, `a-b`, `a/x`).
#[must_use]
pub fn compare(a: &str, b: &str) -> Ordering {
    a.split('/').cmp(b.split('/'))
}
