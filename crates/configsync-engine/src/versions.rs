//! Version markers in documents and the remote manifest they are checked
//! against.
//!
//! A document carries its version in a `Version: X.Y.Z` marker anywhere in
//! its text, usually a comment. The manifest is `name=X.Y.Z` lines keyed by
//! file name.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static VERSION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Version:\s*v?(\d+\.\d+\.\d+)").unwrap());

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parses `X.Y.Z` (an optional leading `v` is allowed). Parts after the
    /// third are ignored; anything else reads as `0.0.0`.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        let s = s.strip_prefix(['v', 'V']).unwrap_or(s);
        let parts: Vec<_> = s.split('.').take(3).map(str::parse::<u32>).collect();
        match parts.as_slice() {
            [Ok(major), Ok(minor), Ok(patch)] => Self::new(*major, *minor, *patch),
            _ => Self::default(),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// First `Version: X.Y.Z` marker in `text`.
pub fn extract_version(text: &str) -> Option<Version> {
    VERSION_MARKER
        .captures(text)
        .map(|caps| Version::parse(&caps[1]))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionManifest {
    entries: BTreeMap<String, Version>,
}

impl VersionManifest {
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once('='))
            .map(|(name, version)| (name.trim().to_string(), Version::parse(version)))
            .collect();
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<Version> {
        self.entries.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VersionStatus {
    Outdated,
    UpToDate,
    Ahead,
    NoLocalVersion,
    NoRemoteVersion,
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VersionStatus::Outdated => "update available",
            VersionStatus::UpToDate => "up to date",
            VersionStatus::Ahead => "newer than published",
            VersionStatus::NoLocalVersion => "no version marker",
            VersionStatus::NoRemoteVersion => "not in manifest",
        })
    }
}

pub fn compare(local: Version, remote: Version) -> VersionStatus {
    match local.cmp(&remote) {
        Ordering::Less => VersionStatus::Outdated,
        Ordering::Equal => VersionStatus::UpToDate,
        Ordering::Greater => VersionStatus::Ahead,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionReport {
    pub file: String,
    pub local: Option<Version>,
    pub remote: Option<Version>,
    pub status: VersionStatus,
}

/// Checks each `(file name, text)` against the manifest entry of that name.
pub fn check_buffers(manifest: &VersionManifest, buffers: &[(&str, &str)]) -> Vec<VersionReport> {
    buffers
        .iter()
        .map(|&(file, text)| {
            let local = extract_version(text);
            let remote = manifest.get(file);
            let status = match (local, remote) {
                (None, _) => VersionStatus::NoLocalVersion,
                (Some(_), None) => VersionStatus::NoRemoteVersion,
                (Some(l), Some(r)) => compare(l, r),
            };
            VersionReport {
                file: file.to_string(),
                local,
                remote,
                status,
            }
        })
        .collect()
}
