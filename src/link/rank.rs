//! Ordering candidates and choosing the ones that get links.

use super::discovery::Candidate;
use super::version::VersionIdentity;

/// Number of managed links per fork.
pub const LINK_SLOTS: usize = 3;

/// The `n` newest candidates, newest first.
pub fn top_n(mut candidates: Vec<Candidate>, n: usize) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.version.cmp(&a.version).then_with(|| a.path.cmp(&b.path)));
    candidates.truncate(n);
    candidates
}

/// Add `injected` unless a candidate with the same identity is already present.
pub fn inject_candidate(candidates: &mut Vec<Candidate>, injected: Candidate) {
    if !contains_version(candidates, &injected.version) {
        candidates.push(injected);
    }
}

fn contains_version(candidates: &[Candidate], version: &VersionIdentity) -> bool {
    candidates.iter().any(|c| &c.version == version)
}
