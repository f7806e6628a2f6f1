//! Hierarchic scope matching.
//!
//! A requested scope is satisfied by an allowed scope that is equal to it
//! or is a dot-separated prefix of it: a client allowed `read` may be
//! granted `read` and `read.reports`, but never `readx`.

/// Whether `allowed` satisfies `requested` under hierarchic matching.
#[must_use]
pub fn scope_matches(allowed: &str, requested: &str) -> bool {
    if allowed == requested {
        return true;
    }
    requested.starts_with(allowed) && requested.as_bytes().get(allowed.len()) == Some(&b'.')
}

/// Whether any of the allowed scopes satisfies `requested`.
#[must_use]
pub fn is_scope_allowed(allowed: &[String], requested: &str) -> bool {
    allowed.iter().any(|a| scope_matches(a, requested))
}

/// Split a space-separated scope string into individual scopes.
#[must_use]
pub fn parse_scope(scope: &str) -> Vec<String> {
    scope
        .split_whitespace()
        .map(ToString::to_string)
        .collect()
}
