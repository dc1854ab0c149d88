//! Request path canonicalization checks.
//!
//! Authorization decisions compare raw path prefixes, while the router
//! matches on a partially decoded path. A path is only accepted when both
//! views agree, so encoded unreserved characters, empty segments and dot
//! segments are rejected instead of being normalized.

use percent_encoding::percent_decode_str;
use vibe_auth::AuthError;

/// Reject any path whose raw form differs from its canonical form.
///
/// A single trailing `/` is allowed. Percent escapes are allowed only for
/// characters that must stay encoded, and a decoded segment may not contain
/// a path separator or NUL.
pub fn ensure_canonical_path(path: &str) -> Result<(), AuthError> {
    let Some(rest) = path.strip_prefix('/') else {
        return Err(non_canonical(path, "must start with '/'"));
    };
    let rest = rest.strip_suffix('/').unwrap_or(rest);
    if rest.is_empty() {
        return Ok(());
    }

    for segment in rest.split('/') {
        check_segment(path, segment)?;
    }
    Ok(())
}

fn check_segment(path: &str, segment: &str) -> Result<(), AuthError> {
    if segment.is_empty() {
        return Err(non_canonical(path, "contains an empty segment"));
    }

    check_escapes(path, segment)?;

    let decoded = percent_decode_str(segment)
        .decode_utf8()
        .map_err(|_| non_canonical(path, "is not valid UTF-8 once decoded"))?;

    if decoded == "." || decoded == ".." {
        return Err(non_canonical(path, "contains a dot segment"));
    }
    if decoded.contains('/') || decoded.contains('\\') {
        return Err(non_canonical(path, "contains an encoded path separator"));
    }
    if decoded.contains('\0') {
        return Err(non_canonical(path, "contains a null byte"));
    }
    Ok(())
}

/// Every `%` must start a well-formed escape for a reserved or non-ASCII byte.
fn check_escapes(path: &str, segment: &str) -> Result<(), AuthError> {
    let bytes = segment.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }
        let byte = bytes
            .get(i + 1..i + 3)
            .and_then(|hex| std::str::from_utf8(hex).ok())
            .and_then(|hex| u8::from_str_radix(hex, 16).ok())
            .ok_or_else(|| non_canonical(path, "contains a malformed percent escape"))?;
        if is_unreserved(byte) {
            return Err(non_canonical(path, "percent-encodes an unreserved character"));
        }
        i += 3;
    }
    Ok(())
}

/// RFC 3986 unreserved set: `ALPHA / DIGIT / "-" / "." / "_" / "~"`.
fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~')
}

fn non_canonical(path: &str, reason: &str) -> AuthError {
    AuthError::MalformedRequest(format!("Request path {} {}", path, reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_canonical_paths() {
        for path in [
            "/",
            "/health",
            "/v1/query",
            "/v1/query/",
            "/v1/collections/orders/7",
            "/v1/collections/order%20items",
            "/v1/collections/caf%C3%A9",
            "/v1/collections/a%3Ab",
        ] {
            assert!(ensure_canonical_path(path).is_ok(), "{}", path);
        }
    }

    #[test]
    fn test_rejects_encoded_unreserved_characters() {
        for path in ["/v1/%61dmin/users", "/%761/admin", "/v1/adm%69n", "/v1/%2e%2e/admin", "/v1/a%7Eb"] {
            let err = ensure_canonical_path(path).unwrap_err();
            assert_eq!(err.status_code(), 400, "{}", path);
        }
    }

    #[test]
    fn test_rejects_empty_and_dot_segments() {
        for path in [
            "/v1//admin/users",
            "//v1/admin",
            "/v1/collections/../admin/users",
            "/v1/./admin",
            "/v1/collections/..",
            "/v1/query//",
        ] {
            assert!(ensure_canonical_path(path).is_err(), "{}", path);
        }
    }

    #[test]
    fn test_rejects_encoded_separators_and_bad_escapes() {
        for path in [
            "/v1/collections%2F..%2Fadmin",
            "/v1/collections/a%5Cb",
            "/v1/collections/a%00",
            "/v1/collections/a%zz",
            "/v1/collections/a%4",
            "/v1/collections/%FF",
            "v1/query",
        ] {
            assert!(ensure_canonical_path(path).is_err(), "{}", path);
        }
    }
}
