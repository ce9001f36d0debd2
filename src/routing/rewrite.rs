//! Forwarded path construction.
//!
//! The gateway forwards under the same prefix it is mounted at, so the
//! remainder after the mount point is re-prefixed instead of concatenated
//! onto the original path. Runs of `/` are collapsed afterwards, which makes
//! the rewrite idempotent.

/// Rebuild the upstream path from the route prefix and the unmatched remainder.
pub fn rewrite_path(prefix: &str, remainder: &str) -> String {
    let mut joined = String::with_capacity(prefix.len() + remainder.len() + 1);
    joined.push_str(prefix);
    if !remainder.is_empty() {
        joined.push('/');
        joined.push_str(remainder);
    }
    collapse_slashes(&joined)
}

/// Replace every run of two or more `/` with a single `/`.
pub fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        if c == '/' {
            if !prev_slash {
                out.push(c);
            }
            prev_slash = true;
        } else {
            out.push(c);
            prev_slash = false;
        }
    }
    out
}
