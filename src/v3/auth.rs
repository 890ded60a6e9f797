//! Password-to-key derivation and key localization (RFC 3414, RFC 7860).
//!
//! A USM passphrase is first expanded into a master key by digesting one
//! megabyte of the cyclically repeated passphrase, then localized to a
//! specific engine by digesting `key || engineID || key`. Privacy keys reuse
//! the user's authentication protocol for derivation and, when the cipher
//! needs more key material than the digest provides, are extended with the
//! Blumenthal or Reeder construction.

use digest::Digest;
use md5::Md5;
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{AuthProtocol, KeyExtension, PrivProtocol};

/// Number of passphrase bytes digested during key expansion (RFC 3414 A.2).
const EXPANSION_BYTES: usize = 1_048_576;

/// A key localized to one engine ID.
///
/// Key material is zeroized on drop and redacted from `Debug`.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct LocalizedKey(Vec<u8>);

impl LocalizedKey {
    /// Key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Key length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the key is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for LocalizedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LocalizedKey({} bytes)", self.0.len())
    }
}

/// Expand a passphrase into a master key (RFC 3414 A.2).
///
/// The passphrase must not be empty; the provisioner enforces the RFC 3414
/// 8-octet minimum before calling into this module.
fn password_to_key<D: Digest>(password: &[u8]) -> Vec<u8> {
    debug_assert!(!password.is_empty());

    let mut hasher = D::new();
    let mut block = [0u8; 64];
    let mut index = 0;
    let mut digested = 0;

    while digested < EXPANSION_BYTES {
        for byte in &mut block {
            *byte = password[index];
            index += 1;
            if index == password.len() {
                index = 0;
            }
        }
        hasher.update(block);
        digested += block.len();
    }

    let key = hasher.finalize().to_vec();
    block.zeroize();
    key
}

/// Localize a master key to an engine: `H(key || engineID || key)`.
fn localize<D: Digest>(master: &[u8], engine_id: &[u8]) -> Vec<u8> {
    let mut hasher = D::new();
    hasher.update(master);
    hasher.update(engine_id);
    hasher.update(master);
    hasher.finalize().to_vec()
}

fn derive<D: Digest>(password: &[u8], engine_id: &[u8]) -> Vec<u8> {
    let mut master = password_to_key::<D>(password);
    let localized = localize::<D>(&master, engine_id);
    master.zeroize();
    localized
}

/// Derive the localized key for `password` under `engine_id` using the given
/// authentication protocol.
pub fn localize_password(
    protocol: AuthProtocol,
    password: &[u8],
    engine_id: &[u8],
) -> LocalizedKey {
    let key = match protocol {
        AuthProtocol::Md5 => derive::<Md5>(password, engine_id),
        AuthProtocol::Sha1 => derive::<Sha1>(password, engine_id),
        AuthProtocol::Sha224 => derive::<Sha224>(password, engine_id),
        AuthProtocol::Sha256 => derive::<Sha256>(password, engine_id),
        AuthProtocol::Sha384 => derive::<Sha384>(password, engine_id),
        AuthProtocol::Sha512 => derive::<Sha512>(password, engine_id),
    };
    LocalizedKey(key)
}

fn digest_once(protocol: AuthProtocol, data: &[u8]) -> Vec<u8> {
    match protocol {
        AuthProtocol::Md5 => Md5::digest(data).to_vec(),
        AuthProtocol::Sha1 => Sha1::digest(data).to_vec(),
        AuthProtocol::Sha224 => Sha224::digest(data).to_vec(),
        AuthProtocol::Sha256 => Sha256::digest(data).to_vec(),
        AuthProtocol::Sha384 => Sha384::digest(data).to_vec(),
        AuthProtocol::Sha512 => Sha512::digest(data).to_vec(),
    }
}

/// Derive the localized privacy key for `password` under `engine_id`.
///
/// Derivation runs through the user's *authentication* protocol; the
/// resulting key is truncated or extended to the cipher's key length.
pub fn localize_priv_password(
    auth_protocol: AuthProtocol,
    priv_protocol: PrivProtocol,
    password: &[u8],
    engine_id: &[u8],
) -> LocalizedKey {
    let mut key = localize_password(auth_protocol, password, engine_id).0.clone();
    let need = priv_protocol.key_len();

    match priv_protocol.key_extension_for(auth_protocol) {
        KeyExtension::None => {}
        KeyExtension::Blumenthal => {
            // Kul' = Kul || H(Kul) || H(Kul || H(Kul)) || ...
            while key.len() < need {
                let chunk = digest_once(auth_protocol, &key);
                key.extend_from_slice(&chunk);
            }
        }
        KeyExtension::Reeder => {
            // Each round treats the current key as a passphrase and runs the
            // full expand-and-localize chain again.
            while key.len() < need {
                let chunk = derive_dyn(auth_protocol, &key, engine_id);
                key.extend_from_slice(&chunk);
            }
        }
    }

    key.truncate(need);
    LocalizedKey(key)
}

fn derive_dyn(protocol: AuthProtocol, password: &[u8], engine_id: &[u8]) -> Vec<u8> {
    match protocol {
        AuthProtocol::Md5 => derive::<Md5>(password, engine_id),
        AuthProtocol::Sha1 => derive::<Sha1>(password, engine_id),
        AuthProtocol::Sha224 => derive::<Sha224>(password, engine_id),
        AuthProtocol::Sha256 => derive::<Sha256>(password, engine_id),
        AuthProtocol::Sha384 => derive::<Sha384>(password, engine_id),
        AuthProtocol::Sha512 => derive::<Sha512>(password, engine_id),
    }
}
