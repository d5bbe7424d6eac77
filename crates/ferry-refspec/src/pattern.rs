//! One side of a refspec.

use std::fmt;

/// A ref name pattern with at most one `*` wildcard.
///
/// The wildcard matches any (possibly empty) run of characters at its
/// position, including `/`. A pattern without a wildcard matches only the
/// identical string.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Pattern {
    text: String,
    star: Option<usize>,
}

impl Pattern {
    /// Wrap a pattern string. The caller is responsible for having validated
    /// it; more than one `*` is treated as literal text after the first.
    pub(crate) fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let star = text.find('*');
        Self { text, star }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn is_wildcard(&self) -> bool {
        self.star.is_some()
    }

    fn prefix(&self) -> &str {
        match self.star {
            Some(at) => &self.text[..at],
            None => &self.text,
        }
    }

    fn suffix(&self) -> &str {
        match self.star {
            Some(at) => &self.text[at + 1..],
            None => "",
        }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.capture(candidate).is_some()
    }

    /// The text the wildcard stands for in `candidate`, or `None` if
    /// `candidate` does not match. A non-wildcard match captures `""`.
    pub fn capture<'a>(&self, candidate: &'a str) -> Option<&'a str> {
        if self.star.is_none() {
            return (candidate == self.text).then_some("");
        }
        let (prefix, suffix) = (self.prefix(), self.suffix());
        if candidate.len() < prefix.len() + suffix.len() {
            return None;
        }
        if !candidate.starts_with(prefix) || !candidate.ends_with(suffix) {
            return None;
        }
        candidate.get(prefix.len()..candidate.len() - suffix.len())
    }

    /// Byte length of this pattern with `capture` substituted for the
    /// wildcard.
    pub fn expanded_len(&self, capture: &str) -> usize {
        match self.star {
            Some(_) => self.text.len() - 1 + capture.len(),
            None => self.text.len(),
        }
    }

    /// Write this pattern with `capture` substituted for the wildcard into
    /// the front of `out`. `out` must be at least [`Self::expanded_len`]
    /// bytes long.
    pub(crate) fn expand_into(&self, capture: &str, out: &mut [u8]) -> usize {
        let parts: [&str; 3] = match self.star {
            Some(_) => [self.prefix(), capture, self.suffix()],
            None => [&self.text, "", ""],
        };
        let mut at = 0;
        for part in parts {
            out[at..at + part.len()].copy_from_slice(part.as_bytes());
            at += part.len();
        }
        at
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
