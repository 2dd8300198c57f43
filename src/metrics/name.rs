use std::fmt;
use std::sync::Arc;

/// Segment separator inside a [`Name`].
pub const SEPARATOR: char = '.';

/// Validated, dot-joined metric name.
///
/// Names compare and sort by their joined string form, which is also the
/// order stats appear in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(Arc<str>);

impl Name {
    /// Joins `segments` with `.`.
    ///
    /// A single argument may itself hold several dotted segments, so
    /// `["a.b", "c"]` and `["a", "b.c"]` build the same name.
    ///
    /// # Panics
    ///
    /// Panics when `segments` is empty, when any argument is empty after
    /// trimming, or when an argument holds an empty dotted segment such as
    /// `"a..b"` or `".a"`. Names are built at registration time, so a bad
    /// one is a bug in the caller rather than something to recover from.
    pub fn new(segments: &[&str]) -> Self {
        assert!(!segments.is_empty(), "metric name needs at least one segment");

        let mut joined = String::new();
        for seg in segments {
            let seg = seg.trim();
            assert!(
                !seg.split(SEPARATOR).any(str::is_empty),
                "empty segment in metric name {segments:?}"
            );

            if !joined.is_empty() {
                joined.push(SEPARATOR);
            }
            joined.push_str(seg);
        }

        Self(joined.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the dot-separated segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Splits a prefix on `.` and drops empty pieces, so `"..a..b."` becomes
/// `["a", "b"]`.
pub(crate) fn normalize_prefix(prefix: &str) -> Vec<String> {
    prefix
        .split(SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
