//! Tag parsing into a totally ordered version identity.

use std::cmp::Ordering;
use std::fmt;

use crate::fork::ForkSpec;

/// Comparable form of a release tag.
///
/// Field order is the sort order. `parsed` leads so that a tag which did not
/// match its fork's shape can never outrank one that did.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionIdentity {
    pub parsed: bool,
    pub prefix: String,
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl VersionIdentity {
    /// The `(tag, 0, 0, 0)` identity given to tags that do not parse.
    pub fn unparsed(tag: &str) -> Self {
        Self {
            parsed: false,
            prefix: tag.to_string(),
            major: 0,
            minor: 0,
            patch: 0,
        }
    }
}

impl fmt::Display for VersionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parsed {
            write!(
                f,
                "{} {}.{}.{}",
                self.prefix, self.major, self.minor, self.patch
            )
        } else {
            write!(f, "{} (unparsed)", self.prefix)
        }
    }
}

/// Parse `tag` (bare or directory-decorated) under `spec`'s convention.
///
/// `GE-Proton10-20` becomes `(GE-Proton, 10, 0, 20)`; the second number
/// of a GE tag sits in the patch slot.
pub fn parse_version(tag: &str, spec: &ForkSpec) -> VersionIdentity {
    match spec.tag_numbers(tag) {
        Some(numbers) => VersionIdentity {
            parsed: true,
            prefix: spec.version_prefix.to_string(),
            major: numbers.major,
            minor: numbers.minor,
            patch: numbers.patch,
        },
        None => VersionIdentity::unparsed(tag),
    }
}

pub fn compare_versions(tag1: &str, tag2: &str, spec: &ForkSpec) -> Ordering {
    parse_version(tag1, spec).cmp(&parse_version(tag2, spec))
}

pub fn get_asset_name(tag: &str, spec: &ForkSpec) -> String {
    spec.asset_name(tag)
}
