//! SNMPv3 security module.
//!
//! This module implements the credential side of the User-based Security
//! Model (RFC 3414 and RFC 7860) as needed by a trap-receiving endpoint:
//!
//! - Security level and protocol-name resolution
//! - Key localization (password-to-key derivation)
//! - The engine-scoped USM user table and its provisioning from a
//!   credentials file
//!
//! Message-level authentication and decryption of incoming traps are the
//! engine's business, not this module's.

pub mod auth;
pub mod usm;

pub use auth::{LocalizedKey, localize_password};
pub use usm::{EngineId, Usm, UsmUser, provision};

/// Key extension strategy for privacy key derivation.
///
/// Selected automatically from the auth/priv protocol combination when the
/// auth protocol's digest is shorter than the cipher's key requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum KeyExtension {
    /// No key extension. Use standard RFC 3414 key derivation.
    #[default]
    None,
    /// Blumenthal key extension (draft-blumenthal-aes-usm-04) for AES-192/256.
    Blumenthal,
    /// Reeder key extension (draft-reeder-snmpv3-usm-3desede-00) for 3DES.
    Reeder,
}

/// Error returned when parsing a protocol name fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseProtocolError {
    input: String,
    kind: ProtocolKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProtocolKind {
    Auth,
    Priv,
}

impl std::fmt::Display for ParseProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ProtocolKind::Auth => write!(
                f,
                "unknown authentication protocol '{}'; expected one of: MD5, SHA, SHA-224, SHA-256, SHA-384, SHA-512",
                self.input
            ),
            ProtocolKind::Priv => write!(
                f,
                "unknown privacy protocol '{}'; expected one of: DES, 3DES, AES, AES-192, AES-256",
                self.input
            ),
        }
    }
}

impl std::error::Error for ParseProtocolError {}

/// SNMPv3 security level (RFC 3411).
///
/// The level is a per-endpoint policy: it caps what a derived USM user may
/// carry. A user under `NoAuthNoPriv` never carries keys even if the
/// credentials file specifies them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum SecurityLevel {
    /// No authentication, no privacy.
    #[default]
    #[serde(rename = "noAuthNoPriv")]
    NoAuthNoPriv,
    /// Authentication, no privacy.
    #[serde(rename = "authNoPriv")]
    AuthNoPriv,
    /// Authentication and privacy.
    #[serde(rename = "authPriv")]
    AuthPriv,
}

impl SecurityLevel {
    /// Whether this level requires message authentication.
    pub const fn requires_auth(self) -> bool {
        !matches!(self, Self::NoAuthNoPriv)
    }

    /// Whether this level permits encrypted traffic.
    pub const fn allows_priv(self) -> bool {
        matches!(self, Self::AuthPriv)
    }
}

impl std::fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoAuthNoPriv => write!(f, "noAuthNoPriv"),
            Self::AuthNoPriv => write!(f, "authNoPriv"),
            Self::AuthPriv => write!(f, "authPriv"),
        }
    }
}

impl std::str::FromStr for SecurityLevel {
    type Err = ParseSecurityLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "noauthnopriv" => Ok(Self::NoAuthNoPriv),
            "authnopriv" => Ok(Self::AuthNoPriv),
            "authpriv" => Ok(Self::AuthPriv),
            _ => Err(ParseSecurityLevelError {
                input: s.to_string(),
            }),
        }
    }
}

/// Error returned when parsing a security level string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSecurityLevelError {
    input: String,
}

impl std::fmt::Display for ParseSecurityLevelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown security level '{}'; expected one of: noAuthNoPriv, authNoPriv, authPriv",
            self.input
        )
    }
}

impl std::error::Error for ParseSecurityLevelError {}

/// Authentication protocol identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum AuthProtocol {
    /// HMAC-MD5-96 (RFC 3414)
    Md5,
    /// HMAC-SHA-96 (RFC 3414)
    Sha1,
    /// HMAC-SHA-224 (RFC 7860)
    Sha224,
    /// HMAC-SHA-256 (RFC 7860)
    Sha256,
    /// HMAC-SHA-384 (RFC 7860)
    Sha384,
    /// HMAC-SHA-512 (RFC 7860)
    Sha512,
}

impl std::fmt::Display for AuthProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Md5 => write!(f, "MD5"),
            Self::Sha1 => write!(f, "SHA"),
            Self::Sha224 => write!(f, "SHA-224"),
            Self::Sha256 => write!(f, "SHA-256"),
            Self::Sha384 => write!(f, "SHA-384"),
            Self::Sha512 => write!(f, "SHA-512"),
        }
    }
}

impl std::str::FromStr for AuthProtocol {
    type Err = ParseProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MD5" => Ok(Self::Md5),
            "SHA" | "SHA1" | "SHA-1" => Ok(Self::Sha1),
            "SHA224" | "SHA-224" => Ok(Self::Sha224),
            "SHA256" | "SHA-256" => Ok(Self::Sha256),
            "SHA384" | "SHA-384" => Ok(Self::Sha384),
            "SHA512" | "SHA-512" => Ok(Self::Sha512),
            _ => Err(ParseProtocolError {
                input: s.to_string(),
                kind: ProtocolKind::Auth,
            }),
        }
    }
}

impl AuthProtocol {
    /// Get the digest output length in bytes.
    ///
    /// This is also the length of the key produced by the localization
    /// algorithm, which privacy key derivation starts from.
    pub fn digest_len(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha224 => 28,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }
}

/// Privacy protocol identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum PrivProtocol {
    /// DES-CBC (RFC 3414).
    ///
    /// Insecure: 56-bit keys are brute-forceable. Accepted because operator
    /// credential files for legacy senders still reference it.
    Des,
    /// 3DES-EDE in "Outside" CBC mode (draft-reeder-snmpv3-usm-3desede-00).
    Des3,
    /// AES-128-CFB (RFC 3826)
    Aes128,
    /// AES-192-CFB (RFC 3826)
    Aes192,
    /// AES-256-CFB (RFC 3826)
    Aes256,
}

impl std::fmt::Display for PrivProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Des => write!(f, "DES"),
            Self::Des3 => write!(f, "3DES"),
            Self::Aes128 => write!(f, "AES"),
            Self::Aes192 => write!(f, "AES-192"),
            Self::Aes256 => write!(f, "AES-256"),
        }
    }
}

impl std::str::FromStr for PrivProtocol {
    type Err = ParseProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DES" => Ok(Self::Des),
            "3DES" | "3DES-EDE" | "DES3" | "TDES" => Ok(Self::Des3),
            "AES" | "AES128" | "AES-128" => Ok(Self::Aes128),
            "AES192" | "AES-192" => Ok(Self::Aes192),
            "AES256" | "AES-256" => Ok(Self::Aes256),
            _ => Err(ParseProtocolError {
                input: s.to_string(),
                kind: ProtocolKind::Priv,
            }),
        }
    }
}

impl PrivProtocol {
    /// Get the key length in bytes.
    pub fn key_len(self) -> usize {
        match self {
            Self::Des => 16,  // 8 key + 8 pre-IV
            Self::Des3 => 32, // 24 key + 8 pre-IV
            Self::Aes128 => 16,
            Self::Aes192 => 24,
            Self::Aes256 => 32,
        }
    }

    /// Returns the key extension algorithm for this privacy protocol given
    /// the authentication protocol.
    ///
    /// Key extension is needed when the auth protocol's digest is shorter
    /// than the privacy protocol's key requirement:
    /// - AES-192/256: Blumenthal (draft-blumenthal-aes-usm-04)
    /// - 3DES: Reeder (draft-reeder-snmpv3-usm-3desede-00)
    pub(crate) fn key_extension_for(self, auth_protocol: AuthProtocol) -> KeyExtension {
        if auth_protocol.digest_len() >= self.key_len() {
            return KeyExtension::None;
        }

        match self {
            Self::Des3 => KeyExtension::Reeder,
            Self::Aes192 | Self::Aes256 => KeyExtension::Blumenthal,
            Self::Des | Self::Aes128 => KeyExtension::None, // Never need extension
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_level_round_trip() {
        for (s, level) in [
            ("noAuthNoPriv", SecurityLevel::NoAuthNoPriv),
            ("authNoPriv", SecurityLevel::AuthNoPriv),
            ("authPriv", SecurityLevel::AuthPriv),
        ] {
            assert_eq!(s.parse::<SecurityLevel>().unwrap(), level);
            assert_eq!(level.to_string(), s);
        }
        assert!("authpriv".parse::<SecurityLevel>().is_ok());
        assert!("full".parse::<SecurityLevel>().is_err());
    }

    #[test]
    fn test_security_level_policy() {
        assert!(!SecurityLevel::NoAuthNoPriv.requires_auth());
        assert!(SecurityLevel::AuthNoPriv.requires_auth());
        assert!(!SecurityLevel::AuthNoPriv.allows_priv());
        assert!(SecurityLevel::AuthPriv.allows_priv());
    }

    #[test]
    fn test_auth_protocol_from_str() {
        assert_eq!("MD5".parse::<AuthProtocol>().unwrap(), AuthProtocol::Md5);
        assert_eq!("md5".parse::<AuthProtocol>().unwrap(), AuthProtocol::Md5);
        assert_eq!("SHA".parse::<AuthProtocol>().unwrap(), AuthProtocol::Sha1);
        assert_eq!("SHA-1".parse::<AuthProtocol>().unwrap(), AuthProtocol::Sha1);
        assert_eq!("sha-224".parse::<AuthProtocol>().unwrap(), AuthProtocol::Sha224);
        assert_eq!("SHA256".parse::<AuthProtocol>().unwrap(), AuthProtocol::Sha256);
        assert_eq!("sha384".parse::<AuthProtocol>().unwrap(), AuthProtocol::Sha384);
        assert_eq!("SHA-512".parse::<AuthProtocol>().unwrap(), AuthProtocol::Sha512);
        assert!("invalid".parse::<AuthProtocol>().is_err());
    }

    #[test]
    fn test_priv_protocol_from_str() {
        assert_eq!("DES".parse::<PrivProtocol>().unwrap(), PrivProtocol::Des);
        assert_eq!("3des".parse::<PrivProtocol>().unwrap(), PrivProtocol::Des3);
        assert_eq!("TDES".parse::<PrivProtocol>().unwrap(), PrivProtocol::Des3);
        assert_eq!("AES".parse::<PrivProtocol>().unwrap(), PrivProtocol::Aes128);
        assert_eq!("aes-128".parse::<PrivProtocol>().unwrap(), PrivProtocol::Aes128);
        assert_eq!("AES192".parse::<PrivProtocol>().unwrap(), PrivProtocol::Aes192);
        assert_eq!("aes256".parse::<PrivProtocol>().unwrap(), PrivProtocol::Aes256);
        assert!("invalid".parse::<PrivProtocol>().is_err());
    }

    #[test]
    fn test_parse_protocol_error_display() {
        let err = "bogus".parse::<AuthProtocol>().unwrap_err();
        assert!(err.to_string().contains("bogus"));
        assert!(err.to_string().contains("authentication protocol"));

        let err = "bogus".parse::<PrivProtocol>().unwrap_err();
        assert!(err.to_string().contains("privacy protocol"));
    }

    #[test]
    fn test_key_extension_selection() {
        use KeyExtension::*;
        assert_eq!(PrivProtocol::Aes128.key_extension_for(AuthProtocol::Md5), None);
        assert_eq!(PrivProtocol::Aes256.key_extension_for(AuthProtocol::Sha1), Blumenthal);
        assert_eq!(PrivProtocol::Aes256.key_extension_for(AuthProtocol::Sha512), None);
        assert_eq!(PrivProtocol::Des3.key_extension_for(AuthProtocol::Md5), Reeder);
        assert_eq!(PrivProtocol::Des3.key_extension_for(AuthProtocol::Sha384), None);
    }
}
