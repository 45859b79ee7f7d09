//! Release version tags
//!
//! Target types are versioned by the release that defines them. Release
//! identifiers are dotted numeric tags of any length (`1.8`, `1.12.2`),
//! optionally followed by a pre-release suffix (`1.13-pre7`). Missing
//! trailing components compare as zero, so `1.8` and `1.8.0` are the same
//! release.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while parsing version tags
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VersionError {
    /// Invalid version format
    #[error("Invalid version format: {0}")]
    InvalidVersion(String),

    /// Invalid range (start is not strictly before end)
    #[error("Invalid version range: {from} -> {to}")]
    InvalidRange {
        /// Range start
        from: String,
        /// Range end
        to: String,
    },
}

/// A release version tag
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionTag {
    components: Vec<u64>,
    prerelease: Option<String>,
}

impl VersionTag {
    /// The version that sorts before every release (`0`)
    pub fn zero() -> Self {
        Self {
            components: vec![0],
            prerelease: None,
        }
    }

    /// Create a version from numeric components
    pub fn new(components: &[u64]) -> Self {
        let components = if components.is_empty() {
            vec![0]
        } else {
            components.to_vec()
        };
        Self {
            components,
            prerelease: None,
        }
    }

    /// Parse a version string
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let s = s.trim();

        // Remove 'v' prefix if present
        let s = s.strip_prefix('v').unwrap_or(s);
        if s.is_empty() {
            return Err(VersionError::InvalidVersion(s.to_string()));
        }

        // Split by - to separate prerelease
        let (core_version, prerelease) = match s.find('-') {
            Some(pos) => {
                let (v, p) = s.split_at(pos);
                let p = &p[1..];
                if p.is_empty() {
                    return Err(VersionError::InvalidVersion(format!(
                        "Empty pre-release tag in '{}'",
                        s
                    )));
                }
                (v, Some(p.to_string()))
            }
            None => (s, None),
        };

        let components = core_version
            .split('.')
            .map(|part| {
                part.parse::<u64>().map_err(|_| {
                    VersionError::InvalidVersion(format!("Invalid component '{}' in '{}'", part, s))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            components,
            prerelease,
        })
    }

    /// Numeric components as written
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    /// Check if this is a pre-release version
    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }

    fn component(&self, index: usize) -> u64 {
        self.components.get(index).copied().unwrap_or(0)
    }

    /// Components with trailing zeros removed (canonical form for hashing)
    fn significant(&self) -> &[u64] {
        let mut len = self.components.len();
        while len > 0 && self.components[len - 1] == 0 {
            len -= 1;
        }
        &self.components[..len]
    }
}

impl Default for VersionTag {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for c in &self.components {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{}", c)?;
            first = false;
        }
        if let Some(ref pre) = self.prerelease {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for VersionTag {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        VersionTag::parse(&value)
    }
}

impl From<VersionTag> for String {
    fn from(value: VersionTag) -> Self {
        value.to_string()
    }
}

impl std::str::FromStr for VersionTag {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VersionTag::parse(s)
    }
}

impl PartialEq for VersionTag {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionTag {}

impl Hash for VersionTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
        self.prerelease.hash(state);
    }
}

impl PartialOrd for VersionTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionTag {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for i in 0..len {
            match self.component(i).cmp(&other.component(i)) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }

        // Compare prerelease (versions with prerelease are less than without)
        match (&self.prerelease, &other.prerelease) {
            (None, None) => Ordering::Equal,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(a), Some(b)) => a.cmp(b),
        }
    }
}

/// A half-open span between two releases, `from` strictly before `to`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionRange {
    /// Release the change is measured from
    pub from: VersionTag,
    /// Release the change took effect in
    pub to: VersionTag,
}

impl VersionRange {
    /// Create a range, rejecting empty or inverted spans
    pub fn new(from: VersionTag, to: VersionTag) -> Result<Self, VersionError> {
        if from >= to {
            return Err(VersionError::InvalidRange {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        Ok(Self { from, to })
    }

    /// Parse both ends of a range
    pub fn parse(from: &str, to: &str) -> Result<Self, VersionError> {
        Self::new(VersionTag::parse(from)?, VersionTag::parse(to)?)
    }

    /// Check if a version falls within `[from, to)`
    pub fn contains(&self, version: &VersionTag) -> bool {
        &self.from <= version && version < &self.to
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        let v = VersionTag::parse("1.12.2").unwrap();
        assert_eq!(v.components(), &[1, 12, 2]);
        assert!(!v.is_prerelease());
    }

    #[test]
    fn test_parse_short_version() {
        let v = VersionTag::parse("1.8").unwrap();
        assert_eq!(v.components(), &[1, 8]);
        assert_eq!(v, VersionTag::parse("1.8.0").unwrap());
    }

    #[test]
    fn test_parse_version_with_v_prefix() {
        let v = VersionTag::parse("v2.1").unwrap();
        assert_eq!(v.components(), &[2, 1]);
    }

    #[test]
    fn test_parse_prerelease() {
        let v = VersionTag::parse("1.13-pre7").unwrap();
        assert!(v.is_prerelease());
        assert!(v < VersionTag::parse("1.13").unwrap());
        assert!(v > VersionTag::parse("1.12.2").unwrap());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(VersionTag::parse("").is_err());
        assert!(VersionTag::parse("1.x").is_err());
        assert!(VersionTag::parse("1.2-").is_err());
    }

    #[test]
    fn test_version_ordering() {
        let v = |s| VersionTag::parse(s).unwrap();
        assert!(v("1.8") < v("1.9"));
        assert!(v("1.9") < v("1.10"));
        assert!(v("1.12") < v("1.12.1"));
        assert!(v("2") > v("1.99.99"));
    }

    #[test]
    fn test_equal_versions_hash_equal() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(VersionTag::parse("1.8").unwrap());
        assert!(set.contains(&VersionTag::parse("1.8.0.0").unwrap()));
    }

    #[test]
    fn test_display_roundtrip() {
        assert_eq!(VersionTag::parse("1.13-pre7").unwrap().to_string(), "1.13-pre7");
        assert_eq!(VersionTag::parse("v3.0.1").unwrap().to_string(), "3.0.1");
    }

    #[test]
    fn test_range() {
        let range = VersionRange::parse("1.8", "1.9").unwrap();
        assert!(range.contains(&VersionTag::parse("1.8.5").unwrap()));
        assert!(!range.contains(&VersionTag::parse("1.9").unwrap()));
        assert!(VersionRange::parse("1.9", "1.9").is_err());
        assert!(VersionRange::parse("2.0", "1.9").is_err());
    }
}
