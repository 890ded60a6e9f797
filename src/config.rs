//! Receiver configuration.

use crate::v3::SecurityLevel;
use crate::version::Version;

/// Default trap listen address (snmptrapd convention).
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:162";

/// Default maximum datagram size accepted by the engine.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 65535;

/// Configuration for a trap-receiving endpoint.
///
/// Immutable once handed to a [`TrapReceiver`](crate::receiver::TrapReceiver).
/// The `version`/`security_level` pair drives USM provisioning; the remaining
/// fields are transport-level settings consumed by the engine.
///
/// # Example
///
/// ```rust
/// use trapsink::{SecurityLevel, TrapConfig, Version};
///
/// let config = TrapConfig {
///     version: Version::V3,
///     security_level: SecurityLevel::AuthPriv,
///     listen_addr: "0.0.0.0:10162".into(),
///     ..TrapConfig::default()
/// };
/// ```
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct TrapConfig {
    /// SNMP protocol version of the expected traps.
    pub version: Version,
    /// Security level applied when deriving v3 users.
    pub security_level: SecurityLevel,
    /// Address the engine binds its UDP socket to. Use `[::]:162` for
    /// dual-stack operation.
    pub listen_addr: String,
    /// Maximum size of an incoming datagram. Larger datagrams are truncated.
    pub max_message_size: usize,
    /// Optional socket receive buffer size. The kernel may cap this at
    /// `net.core.rmem_max`; larger buffers absorb trap bursts.
    pub recv_buffer_size: Option<usize>,
}

impl Default for TrapConfig {
    fn default() -> Self {
        Self {
            version: Version::V2c,
            security_level: SecurityLevel::NoAuthNoPriv,
            listen_addr: DEFAULT_LISTEN_ADDR.into(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            recv_buffer_size: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TrapConfig::default();
        assert_eq!(config.version, Version::V2c);
        assert_eq!(config.security_level, SecurityLevel::NoAuthNoPriv);
        assert_eq!(config.listen_addr, "0.0.0.0:162");
        assert_eq!(config.max_message_size, 65535);
        assert!(config.recv_buffer_size.is_none());
    }

    #[test]
    fn test_config_from_json() {
        let config: TrapConfig = serde_json::from_str(
            r#"{"version":"v3","security_level":"authPriv","listen_addr":"[::]:162"}"#,
        )
        .unwrap();
        assert_eq!(config.version, Version::V3);
        assert_eq!(config.security_level, SecurityLevel::AuthPriv);
        assert_eq!(config.listen_addr, "[::]:162");
        // omitted fields fall back to defaults
        assert_eq!(config.max_message_size, DEFAULT_MAX_MESSAGE_SIZE);
    }
}
