//! Link management for installed Proton releases.
//!
//! Each fork owns three symlinks under the install root (main, fallback,
//! fallback2) that always point at its three newest installed versions.
//! The pipeline is scan ([`discovery`]), collapse duplicates ([`dedup`]),
//! order ([`rank`]) and reconcile ([`link_set`]), driven by [`LinkManager`].

pub mod dedup;
pub mod discovery;
pub mod error;
pub mod link_set;
pub mod lock;
pub mod manager;
pub mod rank;
pub mod remove;
pub mod version;

pub use discovery::{Candidate, DirectoryScanner};
pub use error::LinkError;
pub use link_set::LinkSet;
pub use lock::RootLock;
pub use manager::{LinkManager, LinkPlan};
pub use rank::LINK_SLOTS;
pub use remove::{ReleaseRemover, Removal};
pub use version::{VersionIdentity, compare_versions, get_asset_name, parse_version};
