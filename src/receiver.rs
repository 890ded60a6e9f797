//! Trap receiver lifecycle.
//!
//! [`TrapReceiver`] owns the started/stopped lifecycle of a listening
//! engine: on start it provisions the USM from the credentials file (v3
//! only) and attaches the responder; on close it tears the security model
//! down, unregisters it, and releases the engine. `start` and `close` take
//! `&mut self` — one lifecycle owner at a time, enforced by the type system
//! — while the engine's dispatch task delivers trap events concurrently.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::TrapConfig;
use crate::engine::{TrapEngine, TrapResponder, UdpEngine};
use crate::error::{Error, Result};
use crate::registry::SecurityModelRegistry;
use crate::v3::usm;

/// Lifecycle state of a [`TrapReceiver`].
///
/// `start` and `close` are synchronous: there are no transient
/// starting/stopping states. A failed `start` leaves the receiver
/// `Stopped`; a failed `close` leaves the instance unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    /// Not listening for application traffic; no responder attached.
    Stopped,
    /// Responder attached, trap events flowing.
    Started,
}

/// Handler owning an SNMP trap-receiving endpoint.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use trapsink::{TrapConfig, TrapEvent, TrapReceiver, TrapResponder, Version};
///
/// struct PrintResponder;
///
/// impl TrapResponder for PrintResponder {
///     fn on_trap(&self, event: TrapEvent) {
///         println!("trap from {}: {} bytes", event.source, event.payload.len());
///     }
/// }
///
/// # async fn example() -> trapsink::Result<()> {
/// let config = TrapConfig {
///     version: Version::V2c,
///     listen_addr: "0.0.0.0:10162".into(),
///     ..TrapConfig::default()
/// };
///
/// let mut receiver = TrapReceiver::bind(config, "/etc/snmp/usm-users.json").await?;
/// receiver.start(Arc::new(PrintResponder))?;
/// // ... traps flow to the responder ...
/// receiver.close()?;
/// # Ok(())
/// # }
/// ```
pub struct TrapReceiver<E: TrapEngine = UdpEngine> {
    config: TrapConfig,
    users_file: PathBuf,
    registry: Arc<SecurityModelRegistry>,
    engine: E,
    state: ReceiverState,
}

impl TrapReceiver<UdpEngine> {
    /// Create a receiver backed by the bundled [`UdpEngine`] and the global
    /// security-model registry.
    ///
    /// The socket is bound here; trap events do not reach a responder until
    /// [`start`](Self::start).
    pub async fn bind(config: TrapConfig, users_file: impl Into<PathBuf>) -> Result<Self> {
        let engine = UdpEngine::create(&config).await?;
        Ok(Self::with_engine(
            engine,
            config,
            users_file,
            SecurityModelRegistry::global(),
        ))
    }
}

impl<E: TrapEngine> TrapReceiver<E> {
    /// Create a receiver around an existing engine and registry.
    ///
    /// This is the injection point for embedders with their own engine
    /// implementation and for tests that need an isolated registry.
    pub fn with_engine(
        engine: E,
        config: TrapConfig,
        users_file: impl Into<PathBuf>,
        registry: Arc<SecurityModelRegistry>,
    ) -> Self {
        Self {
            config,
            users_file: users_file.into(),
            registry,
            engine,
            state: ReceiverState::Stopped,
        }
    }

    /// Provision security and attach `responder`, marking the receiver
    /// started.
    ///
    /// For SNMPv3 configurations this loads the credentials file, derives
    /// the USM users and registers the security model; for v1/v2c the file
    /// is never read. On any failure the receiver stays `Stopped`, nothing
    /// is registered, and the error propagates.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyStarted`] when called on a started receiver, plus
    /// everything the provisioner raises: [`Error::CredentialsFileNotFound`],
    /// [`Error::CredentialsParse`], [`Error::InvalidCredential`].
    pub fn start(&mut self, responder: Arc<dyn TrapResponder>) -> Result<()> {
        if self.state == ReceiverState::Started {
            return Err(Error::AlreadyStarted);
        }

        if let Some(model) = usm::provision(&self.config, &self.users_file, &self.registry)? {
            self.engine.install_usm(model);
        }

        self.engine.add_responder(responder);
        self.state = ReceiverState::Started;

        tracing::info!(
            snmp.version = %self.config.version,
            snmp.local_addr = ?self.engine.local_addr(),
            "trap receiver started"
        );

        Ok(())
    }

    /// Whether the receiver is currently started. Pure query.
    pub fn is_started(&self) -> bool {
        self.state == ReceiverState::Started
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ReceiverState {
        self.state
    }

    /// Tear down the security model and release the engine.
    ///
    /// If a security model is bound to the engine, all its users are removed
    /// and it is unregistered from the registry before the engine itself is
    /// closed. Calling `close` on a stopped receiver is a safe no-op.
    ///
    /// # Errors
    ///
    /// [`Error::Shutdown`] (or whatever the engine raises) when the engine
    /// fails to release its resources. The failure is logged and propagated;
    /// the receiver is not marked stopped and should be treated as unusable.
    pub fn close(&mut self) -> Result<()> {
        if let Some(model) = self.engine.usm() {
            model.remove_all_users();
            self.registry.unregister(model.engine_id());
            tracing::debug!(
                snmp.engine_id = %model.engine_id(),
                "unregistered USM security model"
            );
        }

        if let Err(e) = self.engine.close() {
            tracing::error!(error = %e, "could not close SNMP engine");
            return Err(e);
        }

        self.state = ReceiverState::Stopped;
        tracing::info!("trap receiver stopped");
        Ok(())
    }

    /// The engine's bound listen address, when it has one.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.engine.local_addr()
    }

    /// Access the underlying engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }
}
