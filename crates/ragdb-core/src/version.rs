//! Packed semantic versions.
//!
//! A `MAJOR.MINOR.PATCH` version is packed into one integer as
//! `(major << 16) | (minor << 8) | patch` so it fits SQLite's
//! `user_version` header slot.

use std::fmt;
use std::str::FromStr;

use crate::error::{RagError, Result};

/// A three-part version as stored in the schema version marker.
///
/// Field order gives the derived ordering its semantic meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SchemaVersion {
    pub major: u16,
    pub minor: u8,
    pub patch: u8,
}

impl SchemaVersion {
    /// Create a version from its parts.
    pub const fn new(major: u16, minor: u8, patch: u8) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Version zero, the marker of a file that was never stamped.
    pub const fn zero() -> Self {
        Self::new(0, 0, 0)
    }

    /// Version of the running software.
    pub fn current() -> Self {
        env!("CARGO_PKG_VERSION").parse().unwrap_or_default()
    }

    /// Pack into `(major << 16) | (minor << 8) | patch`.
    pub fn to_packed(self) -> u32 {
        (u32::from(self.major) << 16) | (u32::from(self.minor) << 8) | u32::from(self.patch)
    }

    /// Unpack a value produced by [`SchemaVersion::to_packed`].
    pub fn from_packed(value: u32) -> Self {
        Self {
            major: (value >> 16) as u16,
            minor: ((value >> 8) & 0xFF) as u8,
            patch: (value & 0xFF) as u8,
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SchemaVersion {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| RagError::InvalidVersion {
            version: s.to_string(),
            reason: reason.to_string(),
        };

        // Pre-release and build metadata do not take part in the packed form.
        let core = s
            .trim()
            .split(|c: char| c == '-' || c == '+')
            .next()
            .unwrap_or_default();

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() != 3 {
            return Err(invalid("expected MAJOR.MINOR.PATCH"));
        }

        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            *slot = part
                .parse::<u64>()
                .map_err(|_| invalid("components must be non-negative integers"))?;
        }

        let major = u16::try_from(numbers[0]).map_err(|_| invalid("major must be at most 65535"))?;
        let minor = u8::try_from(numbers[1]).map_err(|_| invalid("minor must be at most 255"))?;
        let patch = u8::try_from(numbers[2]).map_err(|_| invalid("patch must be at most 255"))?;

        Ok(Self::new(major, minor, patch))
    }
}

/// Encode a `MAJOR.MINOR.PATCH` string into its packed integer.
pub fn encode_version(version: &str) -> Result<u32> {
    Ok(version.parse::<SchemaVersion>()?.to_packed())
}

/// Decode a packed integer back into a `MAJOR.MINOR.PATCH` string.
pub fn decode_version(value: u32) -> String {
    SchemaVersion::from_packed(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packing_layout() {
        assert_eq!(encode_version("0.3.4").unwrap(), 0x0304);
        assert_eq!(encode_version("1.2.3").unwrap(), (1 << 16) | (2 << 8) | 3);
        assert_eq!(decode_version(0x0304), "0.3.4");
    }

    #[test]
    fn test_round_trip_boundaries() {
        for major in [0u32, 1, 7, 255, 256, 65535] {
            for minor in [0u32, 1, 128, 255] {
                for patch in [0u32, 9, 255] {
                    let s = format!("{}.{}.{}", major, minor, patch);
                    assert_eq!(decode_version(encode_version(&s).unwrap()), s);
                }
            }
        }
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        assert!(matches!(
            encode_version("1.300.0"),
            Err(RagError::InvalidVersion { .. })
        ));
        assert!(encode_version("1.0.256").is_err());
        assert!(encode_version("70000.0.0").is_err());
    }

    #[test]
    fn test_malformed_versions() {
        assert!(encode_version("1.2").is_err());
        assert!(encode_version("1.2.3.4").is_err());
        assert!(encode_version("a.b.c").is_err());
        assert!(encode_version("1.-2.3").is_err());
    }

    #[test]
    fn test_suffixes_are_ignored() {
        assert_eq!(
            "0.4.0-beta.1".parse::<SchemaVersion>().unwrap(),
            SchemaVersion::new(0, 4, 0)
        );
        assert_eq!(
            "1.0.2+build.5".parse::<SchemaVersion>().unwrap(),
            SchemaVersion::new(1, 0, 2)
        );
    }

    #[test]
    fn test_current_matches_package_version() {
        assert_eq!(
            SchemaVersion::current().to_string(),
            env!("CARGO_PKG_VERSION")
        );
        assert!(SchemaVersion::current() > SchemaVersion::zero());
    }

    #[test]
    fn test_ordering() {
        let v = |s: &str| s.parse::<SchemaVersion>().unwrap();
        assert!(v("0.3.4") > v("0.3.0"));
        assert!(v("0.10.0") > v("0.9.255"));
        assert!(v("1.0.0") > v("0.255.255"));
        assert!(v("0.3.4").to_packed() > v("0.3.0").to_packed());
    }
}
