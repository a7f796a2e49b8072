//! Format versions and the presence conditions evaluated against them

use std::fmt;

use crate::error::{CodecError, Result};

/// A historical revision of a binary layout.
///
/// `Unknown` is a wildcard: it satisfies every [`Condition`] and has no
/// ordering against known versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Version {
    #[default]
    Unknown,
    Known(u16),
}

impl Version {
    pub const fn new(number: u16) -> Self {
        Version::Known(number)
    }

    pub const fn number(self) -> Option<u16> {
        match self {
            Version::Unknown => None,
            Version::Known(n) => Some(n),
        }
    }

    pub const fn is_known(self) -> bool {
        matches!(self, Version::Known(_))
    }
}

impl From<u16> for Version {
    fn from(number: u16) -> Self {
        Version::Known(number)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Unknown => f.write_str("unknown"),
            Version::Known(n) => write!(f, "v{}", n),
        }
    }
}

/// When a field is present in the wire format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Condition {
    /// Present in every version
    #[default]
    Always,
    /// Present in exactly one version
    Exact(u16),
    /// Present in `min..=max`
    Range(u16, u16),
}

impl Condition {
    /// Exact-version condition; the version must be known
    pub fn exact(version: Version) -> Result<Self> {
        match version {
            Version::Known(v) => Ok(Condition::Exact(v)),
            Version::Unknown => Err(CodecError::config("exact condition on unknown version")),
        }
    }

    /// Inclusive range condition; both bounds must be known and ordered
    pub fn range(min: Version, max: Version) -> Result<Self> {
        match (min, max) {
            (Version::Known(lo), Version::Known(hi)) if lo <= hi => Ok(Condition::Range(lo, hi)),
            (Version::Known(lo), Version::Known(hi)) => Err(CodecError::config(format!(
                "inverted version range v{}..=v{}",
                lo, hi
            ))),
            _ => Err(CodecError::config("version range bound is unknown")),
        }
    }

    /// Whether a field with this condition is present for `requested`.
    ///
    /// Decode and encode both go through this one predicate.
    pub fn includes(self, requested: Version) -> bool {
        let Version::Known(v) = requested else {
            return true;
        };
        match self {
            Condition::Always => true,
            Condition::Exact(exact) => v == exact,
            Condition::Range(min, max) => (min..=max).contains(&v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const E1: Version = Version::new(1);
    const E2: Version = Version::new(2);
    const E3: Version = Version::new(3);
    const E4: Version = Version::new(4);
    const E5: Version = Version::new(5);

    #[test]
    fn test_always() {
        assert!(Condition::Always.includes(E1));
        assert!(Condition::Always.includes(Version::Unknown));
    }

    #[test]
    fn test_exact() {
        let cond = Condition::exact(E2).unwrap();
        assert!(cond.includes(E2));
        assert!(!cond.includes(E1));
        assert!(!cond.includes(E3));
        assert!(cond.includes(Version::Unknown));
    }

    #[test]
    fn test_range_is_inclusive() {
        let cond = Condition::range(E2, E4).unwrap();
        assert!(!cond.includes(E1));
        assert!(cond.includes(E2));
        assert!(cond.includes(E3));
        assert!(cond.includes(E4));
        assert!(!cond.includes(E5));
        assert!(cond.includes(Version::Unknown));
    }

    #[test]
    fn test_invalid_conditions() {
        assert!(Condition::exact(Version::Unknown).is_err());
        assert!(Condition::range(E4, E2).is_err());
        assert!(Condition::range(Version::Unknown, E2).is_err());
        assert!(Condition::range(E3, E3).is_ok());
    }
}
