//! Collapsing directories that hold the same version under different names.

use log::debug;
use std::collections::BTreeMap;

use super::discovery::Candidate;
use super::version::VersionIdentity;
use crate::fork::ForkSpec;

/// Keep one candidate per version identity.
///
/// Within a group the winner is the smallest of
/// `(is_decorated, name length, name)`, so the choice is stable across runs.
/// The result is sorted by version, ascending.
pub fn deduplicate(candidates: Vec<Candidate>, spec: &ForkSpec) -> Vec<Candidate> {
    let mut best: BTreeMap<VersionIdentity, Candidate> = BTreeMap::new();

    for candidate in candidates {
        let replace = match best.get(&candidate.version) {
            Some(current) => preference_key(&candidate, spec) < preference_key(current, spec),
            None => true,
        };
        if replace {
            best.insert(candidate.version.clone(), candidate);
        } else {
            debug!("Dropping duplicate {:?}", candidate.path);
        }
    }

    best.into_values().collect()
}

fn preference_key<'c>(candidate: &'c Candidate, spec: &ForkSpec) -> (bool, usize, &'c str) {
    let name = candidate.dir_name();
    (spec.is_decorated(name), name.len(), name)
}
