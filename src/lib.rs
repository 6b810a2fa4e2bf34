//! Fetch Proton compatibility tool releases from GitHub and keep each
//! fork's three newest installed versions behind stable symlinks.

pub mod archive;
pub mod commands;
pub mod download;
pub mod fetcher;
pub mod fork;
pub mod http;
pub mod link;
pub mod release;
pub mod runtime;
