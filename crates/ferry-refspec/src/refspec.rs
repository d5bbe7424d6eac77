//! Parsed refspecs and name transformation.

use std::fmt;

use ferry_refs::names::validate_ref_pattern;
use ferry_types::Direction;

use crate::buffer;
use crate::error::{RefspecError, RefspecResult};
use crate::pattern::Pattern;

/// A parsed `[+]<src>[:<dst>]` mapping.
///
/// Immutable once parsed. For a fetch refspec an omitted destination means
/// "fetch but do not store"; for a push refspec it means "same name as the
/// source", and an empty source (`:<dst>`) deletes `<dst>` on the peer.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Refspec {
    text: String,
    direction: Direction,
    force: bool,
    src: Pattern,
    dst: Option<Pattern>,
}

impl Refspec {
    /// Parse a refspec for the given direction.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferry_refspec::Refspec;
    /// use ferry_types::Direction;
    ///
    /// let spec = Refspec::parse("+refs/heads/*:refs/remotes/origin/*", Direction::Fetch).unwrap();
    /// assert!(spec.is_force());
    /// assert_eq!(spec.transform("refs/heads/main").unwrap(), "refs/remotes/origin/main");
    /// ```
    pub fn parse(text: &str, direction: Direction) -> RefspecResult<Self> {
        let invalid = |reason: &str| RefspecError::Invalid {
            spec: text.to_string(),
            reason: reason.to_string(),
        };

        let (force, rest) = match text.strip_prefix('+') {
            Some(stripped) => (true, stripped),
            None => (false, text),
        };
        let (src, dst) = match rest.split_once(':') {
            Some((src, dst)) => (src, Some(dst)),
            None => (rest, None),
        };

        if dst.is_some_and(|d| d.contains(':')) {
            return Err(invalid("more than one ':'"));
        }

        let (src, dst) = match (direction, dst) {
            (Direction::Fetch, _) if src.is_empty() => {
                return Err(invalid("fetch refspec needs a source"));
            }
            (Direction::Fetch, Some("")) => (src, None),
            (Direction::Fetch, dst) => (src, dst),
            (Direction::Push, None) => (src, Some(src)),
            (Direction::Push, Some("")) => return Err(invalid("push refspec needs a destination")),
            (Direction::Push, Some(dst)) => (src, Some(dst)),
        };

        if !src.is_empty() {
            validate_ref_pattern(src).map_err(|e| invalid(&e.to_string()))?;
        }
        if let Some(dst) = dst {
            validate_ref_pattern(dst).map_err(|e| invalid(&e.to_string()))?;
        }

        let src = Pattern::new(src);
        let dst = dst.map(Pattern::new);

        if let Some(dst) = &dst {
            if src.is_empty() {
                if dst.is_wildcard() {
                    return Err(invalid("a delete refspec cannot contain '*'"));
                }
            } else if src.is_wildcard() != dst.is_wildcard() {
                return Err(invalid("source and destination must both contain '*' or neither"));
            }
        }

        Ok(Self {
            text: text.to_string(),
            direction,
            force,
            src,
            dst,
        })
    }

    pub fn fetch(text: &str) -> RefspecResult<Self> {
        Self::parse(text, Direction::Fetch)
    }

    pub fn push(text: &str) -> RefspecResult<Self> {
        Self::parse(text, Direction::Push)
    }

    /// The default fetch refspec for a remote: every branch into the
    /// remote's tracking namespace, forced.
    pub fn default_fetch(remote: &str) -> RefspecResult<Self> {
        Self::fetch(&format!("+refs/heads/*:refs/remotes/{remote}/*"))
    }

    /// The text this refspec was parsed from.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_force(&self) -> bool {
        self.force
    }

    pub fn source(&self) -> &str {
        self.src.as_str()
    }

    /// The destination pattern. `None` for a fetch refspec without one.
    pub fn destination(&self) -> Option<&str> {
        self.dst.as_ref().map(Pattern::as_str)
    }

    pub fn is_wildcard(&self) -> bool {
        self.src.is_wildcard()
    }

    /// True for a push refspec of the form `:<dst>`.
    pub fn is_delete(&self) -> bool {
        self.src.is_empty()
    }

    pub fn source_matches(&self, candidate: &str) -> bool {
        !self.src.is_empty() && self.src.matches(candidate)
    }

    pub fn destination_matches(&self, candidate: &str) -> bool {
        self.dst.as_ref().is_some_and(|dst| dst.matches(candidate))
    }

    /// Map a source-side name to its destination-side name.
    pub fn transform(&self, candidate: &str) -> RefspecResult<String> {
        buffer::grow(candidate.len(), |buf| self.transform_into(candidate, buf))
    }

    /// Map a destination-side name back to its source-side name.
    pub fn reverse_transform(&self, candidate: &str) -> RefspecResult<String> {
        buffer::grow(candidate.len(), |buf| self.reverse_transform_into(candidate, buf))
    }

    /// Write the transform of `candidate` into the front of `buf` and return
    /// the number of bytes written.
    ///
    /// Fails with [`RefspecError::BufferTooSmall`] without touching `buf`
    /// when the result does not fit.
    pub fn transform_into(&self, candidate: &str, buf: &mut [u8]) -> RefspecResult<usize> {
        let dst = self.dst.as_ref().ok_or_else(|| self.no_destination())?;
        map_into(&self.src, dst, candidate, buf)
    }

    /// [`Self::transform_into`] with source and destination swapped.
    pub fn reverse_transform_into(&self, candidate: &str, buf: &mut [u8]) -> RefspecResult<usize> {
        let dst = self.dst.as_ref().ok_or_else(|| self.no_destination())?;
        if self.src.is_empty() {
            return Err(self.no_destination());
        }
        map_into(dst, &self.src, candidate, buf)
    }

    fn no_destination(&self) -> RefspecError {
        RefspecError::NoDestination {
            spec: self.text.clone(),
        }
    }
}

fn map_into(from: &Pattern, to: &Pattern, candidate: &str, buf: &mut [u8]) -> RefspecResult<usize> {
    let capture = from
        .capture(candidate)
        .filter(|_| !from.is_empty())
        .ok_or_else(|| RefspecError::NoMatch {
            name: candidate.to_string(),
            pattern: from.to_string(),
        })?;
    let required = to.expanded_len(capture);
    if buf.len() < required {
        return Err(RefspecError::BufferTooSmall { required });
    }
    Ok(to.expand_into(capture, buf))
}

impl fmt::Display for Refspec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fetch(s: &str) -> Refspec {
        Refspec::fetch(s).unwrap()
    }

    fn push(s: &str) -> Refspec {
        Refspec::push(s).unwrap()
    }

    #[test]
    fn parse_forced_wildcard() {
        let spec = fetch("+refs/heads/*:refs/remotes/origin/*");
        assert!(spec.is_force());
        assert!(spec.is_wildcard());
        assert_eq!(spec.source(), "refs/heads/*");
        assert_eq!(spec.destination(), Some("refs/remotes/origin/*"));
        assert_eq!(spec.direction(), Direction::Fetch);
        assert_eq!(spec.as_str(), "+refs/heads/*:refs/remotes/origin/*");
    }

    #[test]
    fn fetch_without_destination_stores_nothing() {
        let spec = fetch("refs/heads/main");
        assert_eq!(spec.destination(), None);
        assert!(spec.source_matches("refs/heads/main"));
        assert!(!spec.destination_matches("refs/heads/main"));
        assert!(matches!(
            spec.transform("refs/heads/main"),
            Err(RefspecError::NoDestination { .. })
        ));
    }

    #[test]
    fn push_without_destination_uses_source() {
        let spec = push("refs/heads/feature");
        assert_eq!(spec.destination(), Some("refs/heads/feature"));
        assert_eq!(spec.transform("refs/heads/feature").unwrap(), "refs/heads/feature");
    }

    #[test]
    fn push_delete() {
        let spec = push(":refs/heads/old");
        assert!(spec.is_delete());
        assert!(!spec.source_matches(""));
        assert!(spec.destination_matches("refs/heads/old"));
        assert!(Refspec::push(":refs/heads/*").is_err());
        assert!(Refspec::fetch(":refs/heads/old").is_err());
    }

    #[test]
    fn wildcard_counts_must_agree() {
        assert!(Refspec::fetch("refs/heads/*:refs/remotes/origin/main").is_err());
        assert!(Refspec::fetch("refs/heads/main:refs/remotes/origin/*").is_err());
        assert!(Refspec::fetch("refs/*/a/*:refs/*/b/*").is_err());
        assert!(Refspec::fetch("refs/heads/*").is_ok());
    }

    #[test]
    fn malformed_names_rejected() {
        for bad in [
            "",
            "+",
            "refs/heads/a..b:refs/x",
            "refs/heads/a:refs/b:refs/c",
            "refs/heads/has space",
            "refs/heads/main:refs/remotes/origin/main.lock",
        ] {
            assert!(
                matches!(Refspec::fetch(bad), Err(RefspecError::Invalid { .. })),
                "{bad:?} should be rejected"
            );
        }
        assert!(Refspec::push("refs/heads/a:").is_err());
    }

    #[test]
    fn transform_and_reverse() {
        let spec = fetch("refs/heads/*:refs/remotes/origin/*");
        let tracking = spec.transform("refs/heads/main").unwrap();
        assert_eq!(tracking, "refs/remotes/origin/main");
        assert_eq!(spec.reverse_transform(&tracking).unwrap(), "refs/heads/main");
    }

    #[test]
    fn transform_nested_capture() {
        let spec = fetch("refs/heads/*:refs/remotes/origin/*");
        assert_eq!(
            spec.transform("refs/heads/feature/deep/name").unwrap(),
            "refs/remotes/origin/feature/deep/name"
        );
    }

    #[test]
    fn transform_infix_wildcard() {
        let spec = fetch("refs/heads/release-*:refs/tags/v*-rc");
        assert_eq!(spec.transform("refs/heads/release-1.2").unwrap(), "refs/tags/v1.2-rc");
        assert_eq!(spec.reverse_transform("refs/tags/v1.2-rc").unwrap(), "refs/heads/release-1.2");
    }

    #[test]
    fn exact_source_matches_only_itself() {
        let spec = fetch("refs/heads/main:refs/remotes/origin/main");
        assert!(spec.source_matches("refs/heads/main"));
        assert!(!spec.source_matches("refs/heads/main2"));
        assert!(!spec.source_matches("refs/heads/mai"));
        assert!(!spec.source_matches(""));
    }

    #[test]
    fn non_matching_transform_is_no_match() {
        let spec = fetch("refs/heads/*:refs/remotes/origin/*");
        assert!(matches!(
            spec.transform("refs/tags/v1"),
            Err(RefspecError::NoMatch { .. })
        ));
        assert!(matches!(
            spec.reverse_transform("refs/heads/main"),
            Err(RefspecError::NoMatch { .. })
        ));
    }

    #[test]
    fn transform_into_reports_required_size_and_leaves_buffer() {
        let spec = fetch("refs/heads/*:refs/remotes/origin/*");
        let mut small = [0xAAu8; 8];
        let err = spec.transform_into("refs/heads/main", &mut small).unwrap_err();
        assert_eq!(
            err,
            RefspecError::BufferTooSmall {
                required: "refs/remotes/origin/main".len()
            }
        );
        assert_eq!(small, [0xAAu8; 8]);

        let mut exact = vec![0u8; "refs/remotes/origin/main".len()];
        let n = spec.transform_into("refs/heads/main", &mut exact).unwrap();
        assert_eq!(&exact[..n], b"refs/remotes/origin/main");
    }

    #[test]
    fn long_output_grows_the_buffer() {
        let spec = fetch("refs/heads/*:refs/remotes/a-very-long-remote-name-for-growth/mirror/*");
        let out = spec.transform("refs/heads/x").unwrap();
        assert_eq!(out, "refs/remotes/a-very-long-remote-name-for-growth/mirror/x");
    }

    #[test]
    fn default_fetch_refspec() {
        let spec = Refspec::default_fetch("upstream").unwrap();
        assert_eq!(spec.as_str(), "+refs/heads/*:refs/remotes/upstream/*");
        assert!(spec.is_force());
    }

    proptest! {
        #[test]
        fn wildcard_round_trip(branch in "[a-z][a-z0-9_-]{0,15}(/[a-z][a-z0-9_-]{0,15}){0,3}") {
            let spec = fetch("+refs/heads/*:refs/remotes/origin/*");
            let name = format!("refs/heads/{branch}");
            let tracking = spec.transform(&name).unwrap();
            prop_assert!(spec.destination_matches(&tracking));
            let back = spec.reverse_transform(&tracking).unwrap();
            prop_assert!(spec.source_matches(&back));
            prop_assert_eq!(back, name);
        }

        #[test]
        fn non_matching_never_yields_output(name in "refs/(tags|notes)/[a-z]{1,20}") {
            let spec = fetch("refs/heads/*:refs/remotes/origin/*");
            let is_no_match = matches!(spec.transform(&name), Err(RefspecError::NoMatch { .. }));
            prop_assert!(is_no_match);
        }

        #[test]
        fn output_is_never_truncated(branch in "[a-z]{1,40}", cap in 0usize..80) {
            let spec = fetch("refs/heads/*:refs/remotes/origin/*");
            let name = format!("refs/heads/{branch}");
            let expected = format!("refs/remotes/origin/{branch}");
            let mut buf = vec![0u8; cap];
            match spec.transform_into(&name, &mut buf) {
                Ok(n) => prop_assert_eq!(&buf[..n], expected.as_bytes()),
                Err(RefspecError::BufferTooSmall { required }) => {
                    prop_assert_eq!(required, expected.len());
                    prop_assert!(cap < required);
                }
                Err(other) => prop_assert!(false, "unexpected error: {other}"),
            }
        }

        #[test]
        fn exact_source_equality(candidate in "refs/heads/[a-z]{1,8}") {
            let spec = fetch("refs/heads/main:refs/remotes/origin/main");
            prop_assert_eq!(spec.source_matches(&candidate), candidate == "refs/heads/main");
        }
    }
}
