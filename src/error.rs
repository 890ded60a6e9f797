//! Error types for trapsink.
//!
//! The error enum is `#[non_exhaustive]` to allow adding new variants without
//! breaking changes.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::v3::ParseProtocolError;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a credentials-file entry cannot be turned into a USM user.
///
/// The valid field combinations depend on the configured
/// [`SecurityLevel`](crate::v3::SecurityLevel), so these are raised by the
/// provisioner rather than by the credentials parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialErrorKind {
    /// `securityName` absent or empty.
    MissingSecurityName,
    /// `authProtocol` absent while the security level requires authentication.
    MissingAuthProtocol,
    /// `authPassphrase` absent while an authentication protocol is set.
    MissingAuthPassphrase,
    /// `privPassphrase` absent while a privacy protocol is set.
    MissingPrivPassphrase,
    /// Passphrase shorter than the RFC 3414 minimum of 8 octets.
    PassphraseTooShort { length: usize },
    /// Authentication or privacy protocol name not recognized.
    UnknownProtocol(ParseProtocolError),
}

impl std::fmt::Display for CredentialErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingSecurityName => write!(f, "securityName must be provided"),
            Self::MissingAuthProtocol => write!(f, "authProtocol must be provided"),
            Self::MissingAuthPassphrase => write!(f, "authPassphrase must be provided"),
            Self::MissingPrivPassphrase => write!(f, "privPassphrase must be provided"),
            Self::PassphraseTooShort { length } => {
                write!(f, "passphrase is {} octets, RFC 3414 requires at least 8", length)
            }
            Self::UnknownProtocol(e) => write!(f, "{}", e),
        }
    }
}

/// Library error type.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The configured credentials file path does not resolve to a readable file.
    #[error("credentials file {} not found or not readable", path.display())]
    CredentialsFileNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The credentials file is not a well-formed list of user entries.
    #[error("could not parse credentials file {}: {source}", path.display())]
    CredentialsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A credentials-file entry is invalid under the configured security level.
    #[error("invalid credential entry {index}: {kind}")]
    InvalidCredential {
        /// Zero-based position of the entry in the credentials file.
        index: usize,
        kind: CredentialErrorKind,
    },

    /// `start` called on a receiver that is already started.
    #[error("trap receiver already started")]
    AlreadyStarted,

    /// I/O error while setting up the engine transport.
    #[error("I/O error{}: {source}", target.map(|t| format!(" binding {}", t)).unwrap_or_default())]
    Io {
        target: Option<SocketAddr>,
        #[source]
        source: std::io::Error,
    },

    /// The underlying engine failed to release its resources during close.
    #[error("could not close SNMP engine: {source}")]
    Shutdown {
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create an invalid-credential error for the entry at `index`.
    pub fn invalid_credential(index: usize, kind: CredentialErrorKind) -> Self {
        Self::InvalidCredential { index, kind }
    }

    /// Whether this error means the credentials file itself was unusable
    /// (missing or malformed), as opposed to a single bad entry.
    pub fn is_credentials_file_error(&self) -> bool {
        matches!(
            self,
            Self::CredentialsFileNotFound { .. } | Self::CredentialsParse { .. }
        )
    }
}
