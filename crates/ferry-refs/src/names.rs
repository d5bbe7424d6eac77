//! Ref name validation following git-style conventions.
//!
//! Valid ref names:
//! - Must be non-empty
//! - Must not contain whitespace, control characters, `~`, `^`, `:`, `?`,
//!   `*`, `[`, `\`
//! - Must not contain `..` (double dot) or `@{`
//! - Must not start or end with `/`, and must not end with `.`
//! - Components between slashes must be non-empty, must not start with `.`
//!   and must not end with `.lock`
//!
//! Ref patterns (the two sides of a refspec) follow the same rules except
//! that a single `*` is allowed.

use crate::error::{RefError, Result};

/// Characters that are forbidden anywhere in a ref name.
const FORBIDDEN_CHARS: &[char] = &[' ', '~', '^', ':', '?', '[', '\\'];

/// Validate a full ref name such as `refs/heads/main`.
///
/// # Examples
///
/// ```
/// use ferry_refs::names::validate_ref_name;
///
/// assert!(validate_ref_name("refs/heads/main").is_ok());
/// assert!(validate_ref_name("refs/heads/feature/auth").is_ok());
/// assert!(validate_ref_name("").is_err());
/// assert!(validate_ref_name("refs/heads/bad..name").is_err());
/// assert!(validate_ref_name("refs/heads/*").is_err());
/// ```
pub fn validate_ref_name(name: &str) -> Result<()> {
    check(name, false).map_err(|reason| RefError::InvalidName {
        name: name.to_string(),
        reason,
    })
}

/// Validate one side of a refspec: a ref name that may contain one `*`.
pub fn validate_ref_pattern(pattern: &str) -> Result<()> {
    check(pattern, true).map_err(|reason| RefError::InvalidName {
        name: pattern.to_string(),
        reason,
    })
}

/// Validate a remote name. Must be a single ref component (no slashes).
pub fn validate_remote_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(RefError::InvalidName {
            name: name.to_string(),
            reason: "remote name must not be empty".into(),
        });
    }
    if name.contains('/') {
        return Err(RefError::InvalidName {
            name: name.to_string(),
            reason: "remote name must not contain '/'".into(),
        });
    }
    check(name, false).map_err(|reason| RefError::InvalidName {
        name: name.to_string(),
        reason: format!("remote name {reason}"),
    })
}

fn check(name: &str, allow_wildcard: bool) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("must not be empty".into());
    }

    if let Some(ch) = name.chars().find(|c| c.is_control() || c.is_whitespace()) {
        return Err(format!("contains whitespace or control character: {ch:?}"));
    }

    for ch in FORBIDDEN_CHARS {
        if name.contains(*ch) {
            return Err(format!("contains forbidden character: {ch:?}"));
        }
    }

    let stars = name.matches('*').count();
    if stars > 0 && !allow_wildcard {
        return Err("contains forbidden character: '*'".into());
    }
    if stars > 1 {
        return Err("must contain at most one '*'".into());
    }

    if name.contains("..") {
        return Err("must not contain '..'".into());
    }

    if name.contains("@{") {
        return Err("must not contain '@{'".into());
    }

    if name == "@" {
        return Err("must not be '@'".into());
    }

    if name.starts_with('/') || name.ends_with('/') {
        return Err("must not start or end with '/'".into());
    }

    if name.ends_with('.') {
        return Err("must not end with '.'".into());
    }

    for component in name.split('/') {
        if component.is_empty() {
            return Err("path components must not be empty".into());
        }
        if component.starts_with('.') {
            return Err(format!("component must not start with '.': {component:?}"));
        }
        if component.ends_with(".lock") {
            return Err(format!("component must not end with '.lock': {component:?}"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_ref_names() {
        assert!(validate_ref_name("HEAD").is_ok());
        assert!(validate_ref_name("main").is_ok());
        assert!(validate_ref_name("refs/heads/main").is_ok());
        assert!(validate_ref_name("refs/remotes/origin/feature/deep").is_ok());
        assert!(validate_ref_name("refs/tags/v1.0").is_ok());
    }

    #[test]
    fn reject_empty() {
        assert!(validate_ref_name("").is_err());
        assert!(validate_ref_pattern("").is_err());
    }

    #[test]
    fn reject_double_dot_and_reflog_syntax() {
        assert!(validate_ref_name("refs/heads/a..b").is_err());
        assert!(validate_ref_name("refs/heads/main@{0}").is_err());
        assert!(validate_ref_name("@").is_err());
    }

    #[test]
    fn reject_whitespace_and_control() {
        assert!(validate_ref_name("refs/heads/has space").is_err());
        assert!(validate_ref_name("refs/heads/tab\there").is_err());
        assert!(validate_ref_name("refs/heads/nul\0").is_err());
    }

    #[test]
    fn reject_forbidden_chars() {
        for bad in ["a~b", "a^b", "a:b", "a?b", "a[b", "a\\b", "a*b"] {
            assert!(validate_ref_name(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn reject_bad_boundaries() {
        assert!(validate_ref_name("/refs/heads/x").is_err());
        assert!(validate_ref_name("refs/heads/x/").is_err());
        assert!(validate_ref_name("refs/heads/x.").is_err());
        assert!(validate_ref_name("refs//heads").is_err());
        assert!(validate_ref_name("refs/heads/.hidden").is_err());
        assert!(validate_ref_name("refs/heads/main.lock").is_err());
        assert!(validate_ref_name("refs/main.lock/x").is_err());
    }

    #[test]
    fn patterns_allow_one_wildcard() {
        assert!(validate_ref_pattern("refs/heads/*").is_ok());
        assert!(validate_ref_pattern("refs/heads/feature-*").is_ok());
        assert!(validate_ref_pattern("refs/heads/main").is_ok());
        assert!(validate_ref_pattern("refs/*/x/*").is_err());
    }

    #[test]
    fn remote_names() {
        assert!(validate_remote_name("origin").is_ok());
        assert!(validate_remote_name("up-stream.2").is_ok());
        assert!(validate_remote_name("").is_err());
        assert!(validate_remote_name("a/b").is_err());
        assert!(validate_remote_name("has space").is_err());
        assert!(validate_remote_name(".hidden").is_err());
        assert!(validate_remote_name("x*").is_err());
    }
}
