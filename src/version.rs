//! SNMP version enumeration.

/// SNMP protocol version.
///
/// The version decides whether user-based security is provisioned at all:
/// only [`Version::V3`] carries a USM, v1/v2c traps are community-based and
/// handled without per-user credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Version {
    /// SNMPv1 (RFC 1157)
    V1,
    /// SNMPv2c (RFC 1901)
    #[default]
    V2c,
    /// SNMPv3 (RFC 3411-3418)
    V3,
}

impl Version {
    /// Get the BER-encoded version number.
    pub const fn as_i32(self) -> i32 {
        match self {
            Version::V1 => 0,
            Version::V2c => 1,
            Version::V3 => 3,
        }
    }

    /// Create from a BER-encoded version number.
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Version::V1),
            1 => Some(Version::V2c),
            3 => Some(Version::V3),
            _ => None,
        }
    }

    /// Whether this version uses the User-based Security Model.
    pub const fn requires_usm(self) -> bool {
        matches!(self, Version::V3)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Version::V1 => write!(f, "SNMPv1"),
            Version::V2c => write!(f, "SNMPv2c"),
            Version::V3 => write!(f, "SNMPv3"),
        }
    }
}

impl std::str::FromStr for Version {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "v1" | "snmpv1" => Ok(Version::V1),
            "2c" | "v2c" | "snmpv2c" => Ok(Version::V2c),
            "3" | "v3" | "snmpv3" => Ok(Version::V3),
            _ => Err(ParseVersionError {
                input: s.to_string(),
            }),
        }
    }
}

/// Error returned when parsing a version string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseVersionError {
    input: String,
}

impl std::fmt::Display for ParseVersionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown SNMP version '{}'; expected one of: v1, v2c, v3",
            self.input
        )
    }
}

impl std::error::Error for ParseVersionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_wire_numbers() {
        assert_eq!(Version::V1.as_i32(), 0);
        assert_eq!(Version::V2c.as_i32(), 1);
        assert_eq!(Version::V3.as_i32(), 3);
        assert_eq!(Version::from_i32(3), Some(Version::V3));
        assert_eq!(Version::from_i32(2), None);
    }

    #[test]
    fn test_version_from_str() {
        assert_eq!("v1".parse::<Version>().unwrap(), Version::V1);
        assert_eq!("V2C".parse::<Version>().unwrap(), Version::V2c);
        assert_eq!("snmpv3".parse::<Version>().unwrap(), Version::V3);
        assert!("v4".parse::<Version>().is_err());
    }

    #[test]
    fn test_only_v3_requires_usm() {
        assert!(!Version::V1.requires_usm());
        assert!(!Version::V2c.requires_usm());
        assert!(Version::V3.requires_usm());
    }
}
