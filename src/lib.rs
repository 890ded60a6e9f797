//! # trapsink
//!
//! Async SNMP trap-receiving endpoint for Rust.
//!
//! The crate manages the lifecycle and security provisioning of a listening
//! trap endpoint:
//!
//! - a UDP engine with its own dispatch task hands raw trap events to a
//!   caller-supplied responder,
//! - SNMPv3 USM users are provisioned from an operator-managed JSON
//!   credentials file, with RFC 3414/7860 key localization,
//! - start/stop are synchronous, idempotence-hardened operations that keep
//!   the process-wide security-model registry consistent.
//!
//! Decoding trap PDUs and turning them into application records is left to
//! the responder; this crate stops at delivering the raw event.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use trapsink::{
//!     SecurityLevel, TrapConfig, TrapEvent, TrapReceiver, TrapResponder, Version,
//! };
//!
//! struct LogResponder;
//!
//! impl TrapResponder for LogResponder {
//!     fn on_trap(&self, event: TrapEvent) {
//!         tracing::info!(source = %event.source, bytes = event.payload.len(), "trap");
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> trapsink::Result<()> {
//!     let config = TrapConfig {
//!         version: Version::V3,
//!         security_level: SecurityLevel::AuthPriv,
//!         listen_addr: "0.0.0.0:162".into(),
//!         ..TrapConfig::default()
//!     };
//!
//!     let mut receiver = TrapReceiver::bind(config, "/etc/snmp/usm-users.json").await?;
//!     receiver.start(Arc::new(LogResponder))?;
//!
//!     // ... traps flow to the responder until shutdown ...
//!     tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
//!     receiver.close()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Credentials File
//!
//! A JSON list of user entries with stable field names:
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
//! Which fields are required depends on the configured [`SecurityLevel`];
//! see [`v3::usm::provision`]. The configured level caps the derived user:
//! at `noAuthNoPriv` the auth/priv fields are ignored, below `authPriv` the
//! privacy fields are.
//!
//! ## Tracing
//!
//! The crate logs through `tracing` with `snmp.`-prefixed structured fields:
//!
//! | Level | What's logged |
//! |-------|---------------|
//! | ERROR | Engine socket errors, failed shutdown |
//! | WARN  | Duplicate credential entries |
//! | INFO  | Receiver start/stop, USM provisioning |
//! | DEBUG | Engine bind, credentials loading, model unregistration |
//! | TRACE | Per-datagram dispatch |

pub mod config;
pub mod credentials;
pub mod engine;
pub mod error;
pub mod prelude;
pub mod receiver;
pub mod registry;
pub mod v3;
pub mod version;

pub(crate) mod util;

// Re-exports for convenience
pub use config::TrapConfig;
pub use credentials::UserCredential;
pub use engine::{TrapEngine, TrapEvent, TrapResponder, UdpEngine};
pub use error::{CredentialErrorKind, Error, Result};
pub use receiver::{ReceiverState, TrapReceiver};
pub use registry::SecurityModelRegistry;
pub use v3::{
    AuthProtocol, EngineId, LocalizedKey, ParseProtocolError, PrivProtocol, SecurityLevel, Usm,
    UsmUser,
};
pub use version::Version;
