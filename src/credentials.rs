//! Credentials file loading.
//!
//! The credentials file is an operator-managed JSON list of user entries:
//!
//! ```json
//! [
//!   {
//!     "securityName": "alice",
//!     "authProtocol": "SHA",
//!     "authPassphrase": "pw12345678",
//!     "privProtocol": "AES",
//!     "privPassphrase": "pw87654321"
//!   }
//! ]
//! ```
//!
//! Loading only checks that the file is a well-formed list of entries with
//! the expected field names and types. Which fields are actually required
//! depends on the configured security level, so that validation lives in the
//! provisioner ([`crate::v3::usm::provision`]).

use std::path::Path;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};

/// One entry of the credentials file.
///
/// Parsed once per provisioning pass and discarded after conversion into a
/// [`UsmUser`](crate::v3::UsmUser). Passphrases are zeroized on drop and
/// redacted from the `Debug` output.
#[derive(Clone, serde::Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserCredential {
    /// USM security name.
    pub security_name: Option<String>,
    /// Authentication protocol name, e.g. `"SHA"`.
    pub auth_protocol: Option<String>,
    /// Authentication passphrase.
    pub auth_passphrase: Option<String>,
    /// Privacy protocol name, e.g. `"AES"`.
    pub priv_protocol: Option<String>,
    /// Privacy passphrase.
    pub priv_passphrase: Option<String>,
}

impl std::fmt::Debug for UserCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCredential")
            .field("security_name", &self.security_name)
            .field("auth_protocol", &self.auth_protocol)
            .field("auth_passphrase", &self.auth_passphrase.as_ref().map(|_| "<redacted>"))
            .field("priv_protocol", &self.priv_protocol)
            .field("priv_passphrase", &self.priv_passphrase.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Load and parse a credentials file.
///
/// The file is read in full before parsing; credential lists are small and
/// operator-managed, so there is no streaming path.
///
/// # Errors
///
/// - [`Error::CredentialsFileNotFound`] when the path cannot be read.
/// - [`Error::CredentialsParse`] when the contents are not a JSON list of
///   [`UserCredential`] entries.
pub fn load_from_file(path: &Path) -> Result<Vec<UserCredential>> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::CredentialsFileNotFound {
        path: path.to_path_buf(),
        source,
    })?;

    let users: Vec<UserCredential> =
        serde_json::from_str(&content).map_err(|source| Error::CredentialsParse {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::debug!(
        snmp.users_file = %path.display(),
        snmp.user_count = users.len(),
        "loaded credentials file"
    );

    Ok(users)
}
