//! Known Proton forks and their naming conventions.
//!
//! Every fork-specific rule (repository, archive format, directory
//! decoration, tag shape, link names) is data on a [`ForkSpec`]. The
//! [`ForkRegistry`] is built once at startup and handed to whoever needs it.

use anyhow::{Context, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// A build variant of Proton published on GitHub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Fork {
    GeProton,
    ProtonEm,
    CachyOs,
}

impl Fork {
    pub const ALL: [Fork; 3] = [Fork::GeProton, Fork::ProtonEm, Fork::CachyOs];

    /// The name used on the command line and in link names.
    pub fn name(self) -> &'static str {
        match self {
            Fork::GeProton => "GE-Proton",
            Fork::ProtonEm => "Proton-EM",
            Fork::CachyOs => "CachyOS",
        }
    }

    fn index(self) -> usize {
        match self {
            Fork::GeProton => 0,
            Fork::ProtonEm => 1,
            Fork::CachyOs => 2,
        }
    }
}

impl fmt::Display for Fork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Fork {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Fork::ALL
            .into_iter()
            .find(|fork| fork.name().eq_ignore_ascii_case(s))
            .with_context(|| {
                let names: Vec<_> = Fork::ALL.iter().map(|f| f.name()).collect();
                format!("Unknown fork '{}', expected one of: {}", s, names.join(", "))
            })
    }
}

/// Numeric components captured from a tag. Missing groups are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagNumbers {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

#[derive(Debug, Clone)]
pub struct ForkSpec {
    pub fork: Fork,
    pub repo: &'static str,
    pub archive_extension: &'static str,
    /// Prepended to the tag in asset and directory names (`proton-`).
    pub dir_prefix: Option<&'static str>,
    /// Appended to the tag in asset and directory names (`-x86_64`).
    pub dir_suffix: Option<&'static str>,
    /// Leading component of every parsed version of this fork.
    pub version_prefix: &'static str,
    tag_pattern: Regex,
    tag_shape: Regex,
}

impl ForkSpec {
    fn new(
        fork: Fork,
        repo: &'static str,
        archive_extension: &'static str,
        dir_prefix: Option<&'static str>,
        dir_suffix: Option<&'static str>,
        version_prefix: &'static str,
        pattern: &str,
    ) -> Result<Self> {
        let tag_pattern = Regex::new(&format!("^{}", pattern))
            .with_context(|| format!("Invalid tag pattern for {}", fork))?;
        let tag_shape = Regex::new(&format!("^{}$", pattern))
            .with_context(|| format!("Invalid tag pattern for {}", fork))?;
        Ok(Self {
            fork,
            repo,
            archive_extension,
            dir_prefix,
            dir_suffix,
            version_prefix,
            tag_pattern,
            tag_shape,
        })
    }

    fn builtin(fork: Fork) -> Result<Self> {
        match fork {
            Fork::GeProton => Self::new(
                fork,
                "GloriousEggroll/proton-ge-custom",
                ".tar.gz",
                None,
                None,
                "GE-Proton",
                r"GE-Proton(?P<major>\d+)-(?P<patch>\d+)",
            ),
            Fork::ProtonEm => Self::new(
                fork,
                "Etaash-mathamsetty/Proton",
                ".tar.xz",
                Some("proton-"),
                None,
                "EM",
                r"EM-(?P<major>\d+)\.(?P<minor>\d+)-(?P<patch>\d+)",
            ),
            Fork::CachyOs => Self::new(
                fork,
                "CachyOS/proton-cachyos",
                ".tar.xz",
                Some("proton-"),
                Some("-x86_64"),
                "cachyos",
                r"cachyos-(?P<major>\d+)\.(?P<minor>\d+)-(?P<patch>\d+)-slr",
            ),
        }
    }

    pub fn display_name(&self) -> &'static str {
        self.fork.name()
    }

    /// Strip this fork's directory decoration from a name.
    pub fn normalize_tag<'a>(&self, name: &'a str) -> &'a str {
        let name = match self.dir_prefix {
            Some(prefix) => name.strip_prefix(prefix).unwrap_or(name),
            None => name,
        };
        match self.dir_suffix {
            Some(suffix) => name.strip_suffix(suffix).unwrap_or(name),
            None => name,
        }
    }

    /// True when `name` carries this fork's prefix or suffix.
    pub fn is_decorated(&self, name: &str) -> bool {
        self.normalize_tag(name) != name
    }

    /// True when the normalized `name` is entirely a tag of this fork.
    pub fn claims(&self, name: &str) -> bool {
        self.tag_shape.is_match(self.normalize_tag(name))
    }

    /// Numbers from the start of the normalized tag, if it has this fork's shape.
    pub fn tag_numbers(&self, tag: &str) -> Option<TagNumbers> {
        let caps = self.tag_pattern.captures(self.normalize_tag(tag))?;
        let group = |name: &str| -> Option<u64> {
            match caps.name(name) {
                Some(m) => m.as_str().parse().ok(),
                None => Some(0),
            }
        };
        Some(TagNumbers {
            major: group("major")?,
            minor: group("minor")?,
            patch: group("patch")?,
        })
    }

    /// File name of the release archive for `tag`.
    pub fn asset_name(&self, tag: &str) -> String {
        format!(
            "{}{}{}{}",
            self.dir_prefix.unwrap_or(""),
            tag,
            self.dir_suffix.unwrap_or(""),
            self.archive_extension
        )
    }

    /// Directory names a release of `tag` may be extracted as, most specific last.
    pub fn dir_forms(&self, tag: &str) -> Vec<String> {
        let mut forms = vec![tag.to_string()];
        if let Some(prefix) = self.dir_prefix {
            forms.push(format!("{}{}", prefix, tag));
            if let Some(suffix) = self.dir_suffix {
                forms.push(format!("{}{}{}", prefix, tag, suffix));
            }
        } else if let Some(suffix) = self.dir_suffix {
            forms.push(format!("{}{}", tag, suffix));
        }
        forms.dedup();
        forms
    }

    /// Main, fallback and fallback2 link names, in priority order.
    pub fn link_names(&self) -> [String; 3] {
        let name = self.display_name();
        [
            name.to_string(),
            format!("{}-Fallback", name),
            format!("{}-Fallback2", name),
        ]
    }
}

/// Immutable table of every supported fork.
#[derive(Debug, Clone)]
pub struct ForkRegistry {
    specs: Vec<ForkSpec>,
}

impl ForkRegistry {
    pub fn builtin() -> Result<Self> {
        let specs = Fork::ALL
            .into_iter()
            .map(ForkSpec::builtin)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { specs })
    }

    pub fn spec(&self, fork: Fork) -> &ForkSpec {
        &self.specs[fork.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ForkSpec> {
        self.specs.iter()
    }

    /// The fork, other than `fork`, whose tag shape claims `name`.
    pub fn claimed_by_other(&self, fork: Fork, name: &str) -> Option<Fork> {
        self.specs
            .iter()
            .filter(|spec| spec.fork != fork)
            .find(|spec| spec.claims(name))
            .map(|spec| spec.fork)
    }
}
