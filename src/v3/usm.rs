//! Engine-scoped USM user table and credential provisioning.
//!
//! [`provision`] is the bridge between the credentials file and the running
//! engine: it loads the file, derives one [`UsmUser`] per entry under the
//! configured security level, and registers the populated [`Usm`] with the
//! security-model registry. Provisioning only happens for SNMPv3; for v1/v2c
//! it is a no-op and the credentials file is never read.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::config::TrapConfig;
use crate::credentials::{self, UserCredential};
use crate::error::{CredentialErrorKind, Error, Result};
use crate::registry::SecurityModelRegistry;

use super::auth::{self, LocalizedKey};
use super::{AuthProtocol, PrivProtocol, SecurityLevel};

/// RFC 3414 minimum passphrase length in octets.
const MIN_PASSPHRASE_LEN: usize = 8;

/// Enterprise arc used in locally generated engine IDs (RFC 5612
/// documentation enterprise).
const LOCAL_ENTERPRISE: u32 = 32473;

/// A local SNMP engine identifier (RFC 3411).
///
/// Opaque byte sequence unique to one engine instance; scopes the USM and
/// its localized keys.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EngineId(Vec<u8>);

impl EngineId {
    /// Wrap an existing engine ID.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Generate a fresh local engine ID.
    ///
    /// RFC 3411 layout: enterprise arc with the high bit set, a format octet
    /// marking an administratively assigned octet string, and a random
    /// 8-byte tail so that every engine instance in the process gets a
    /// distinct identity.
    pub fn generate_local() -> Self {
        let mut bytes = Vec::with_capacity(13);
        bytes.extend_from_slice(&(0x8000_0000 | LOCAL_ENTERPRISE).to_be_bytes());
        bytes.push(0x05);

        let mut tail = [0u8; 8];
        getrandom::fill(&mut tail).expect("operating system RNG unavailable");
        bytes.extend_from_slice(&tail);

        Self(bytes)
    }

    /// Raw engine ID bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Display for EngineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for EngineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EngineId({})", self)
    }
}

/// A derived USM user record.
///
/// Protocols and keys come in pairs: `auth_key` is present exactly when
/// `auth_protocol` is, and likewise for privacy.
#[derive(Debug, Clone)]
pub struct UsmUser {
    /// USM security name.
    pub security_name: String,
    /// Authentication protocol, absent at `noAuthNoPriv`.
    pub auth_protocol: Option<AuthProtocol>,
    /// Localized authentication key.
    pub auth_key: Option<LocalizedKey>,
    /// Privacy protocol, absent unless the level is `authPriv`.
    pub priv_protocol: Option<PrivProtocol>,
    /// Localized privacy key.
    pub priv_key: Option<LocalizedKey>,
}

/// Engine-scoped User-based Security Model instance.
///
/// The user table sits behind a mutex: the lifecycle owner populates and
/// clears it while the engine's dispatch task resolves users concurrently.
pub struct Usm {
    engine_id: EngineId,
    users: Mutex<HashMap<String, UsmUser>>,
}

impl Usm {
    /// Security-model number for USM in the message processing subsystem
    /// (RFC 3411).
    pub const SECURITY_MODEL_ID: i32 = 3;

    /// Create an empty USM bound to `engine_id`.
    pub fn new(engine_id: EngineId) -> Self {
        Self {
            engine_id,
            users: Mutex::new(HashMap::new()),
        }
    }

    /// The engine ID this model is scoped to.
    pub fn engine_id(&self) -> &EngineId {
        &self.engine_id
    }

    /// Add a user, replacing any previous entry with the same security name.
    ///
    /// Returns the replaced entry, if any.
    pub fn add_user(&self, user: UsmUser) -> Option<UsmUser> {
        self.users
            .lock()
            .unwrap()
            .insert(user.security_name.clone(), user)
    }

    /// Look up a user by security name.
    pub fn user(&self, security_name: &str) -> Option<UsmUser> {
        self.users.lock().unwrap().get(security_name).cloned()
    }

    /// Number of users in the table.
    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    /// Remove every user from the table.
    pub fn remove_all_users(&self) {
        self.users.lock().unwrap().clear();
    }
}

impl std::fmt::Debug for Usm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Usm")
            .field("engine_id", &self.engine_id)
            .field("users", &self.user_count())
            .finish()
    }
}

/// Provision a USM from a credentials file and register it.
///
/// For versions other than SNMPv3 this returns `Ok(None)` without touching
/// the file. Otherwise the file is loaded, every entry is derived into a
/// [`UsmUser`] under `config.security_level`, and the fully populated model
/// is registered with `registry` under a freshly generated engine ID.
///
/// Registration is the last step: a pass that fails on any entry leaves
/// nothing behind in the registry.
pub fn provision(
    config: &TrapConfig,
    users_file: &Path,
    registry: &SecurityModelRegistry,
) -> Result<Option<Arc<Usm>>> {
    if !config.version.requires_usm() {
        return Ok(None);
    }

    let entries = credentials::load_from_file(users_file)?;

    let engine_id = EngineId::generate_local();
    let usm = Usm::new(engine_id.clone());

    for (index, entry) in entries.iter().enumerate() {
        let user = derive_user(config.security_level, &engine_id, index, entry)?;
        if let Some(replaced) = usm.add_user(user) {
            tracing::warn!(
                snmp.security_name = %replaced.security_name,
                snmp.entry_index = index,
                "duplicate security name in credentials file, last entry wins"
            );
        }
    }

    let usm = Arc::new(usm);
    registry.register(usm.clone());

    tracing::info!(
        snmp.engine_id = %engine_id,
        snmp.user_count = usm.user_count(),
        snmp.security_level = %config.security_level,
        "provisioned USM security model"
    );

    Ok(Some(usm))
}

/// Derive one USM user from a credentials-file entry.
///
/// The configured security level caps the derived record: at
/// `noAuthNoPriv` authentication and privacy are forced absent regardless
/// of what the entry specifies, and privacy is only derived at `authPriv`.
fn derive_user(
    level: SecurityLevel,
    engine_id: &EngineId,
    index: usize,
    entry: &UserCredential,
) -> Result<UsmUser> {
    let security_name = entry
        .security_name
        .as_deref()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| Error::invalid_credential(index, CredentialErrorKind::MissingSecurityName))?
        .to_string();

    if !level.requires_auth() {
        return Ok(UsmUser {
            security_name,
            auth_protocol: None,
            auth_key: None,
            priv_protocol: None,
            priv_key: None,
        });
    }

    let auth_protocol: AuthProtocol = entry
        .auth_protocol
        .as_deref()
        .ok_or_else(|| Error::invalid_credential(index, CredentialErrorKind::MissingAuthProtocol))?
        .parse()
        .map_err(|e| Error::invalid_credential(index, CredentialErrorKind::UnknownProtocol(e)))?;

    let auth_passphrase = entry
        .auth_passphrase
        .as_deref()
        .ok_or_else(|| {
            Error::invalid_credential(index, CredentialErrorKind::MissingAuthPassphrase)
        })?;
    check_passphrase_len(index, auth_passphrase)?;

    let auth_key = auth::localize_password(
        auth_protocol,
        auth_passphrase.as_bytes(),
        engine_id.as_bytes(),
    );

    let mut priv_protocol = None;
    let mut priv_key = None;
    if level.allows_priv() {
        if let Some(name) = entry.priv_protocol.as_deref() {
            let protocol: PrivProtocol = name.parse().map_err(|e| {
                Error::invalid_credential(index, CredentialErrorKind::UnknownProtocol(e))
            })?;
            let passphrase = entry.priv_passphrase.as_deref().ok_or_else(|| {
                Error::invalid_credential(index, CredentialErrorKind::MissingPrivPassphrase)
            })?;
            check_passphrase_len(index, passphrase)?;

            priv_key = Some(auth::localize_priv_password(
                auth_protocol,
                protocol,
                passphrase.as_bytes(),
                engine_id.as_bytes(),
            ));
            priv_protocol = Some(protocol);
        }
    }

    Ok(UsmUser {
        security_name,
        auth_protocol: Some(auth_protocol),
        auth_key: Some(auth_key),
        priv_protocol,
        priv_key,
    })
}

fn check_passphrase_len(index: usize, passphrase: &str) -> Result<()> {
    let length = passphrase.len();
    if length < MIN_PASSPHRASE_LEN {
        return Err(Error::invalid_credential(
            index,
            CredentialErrorKind::PassphraseTooShort { length },
        ));
    }
    Ok(())
}
