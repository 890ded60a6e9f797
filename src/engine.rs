//! Engine boundary: the listening SNMP engine and its responder callback.
//!
//! The receiver only depends on the narrow [`TrapEngine`] contract, not on a
//! concrete transport. [`UdpEngine`] is the bundled implementation: it binds
//! a UDP socket at creation and runs its own dispatch task, handing every
//! received datagram to the attached [`TrapResponder`]. Datagrams arriving
//! while no responder is attached are counted and dropped — the engine makes
//! no delivery guarantee around start/stop edges.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::config::TrapConfig;
use crate::error::{Error, Result};
use crate::util::bind_listener;
use crate::v3::Usm;

/// A raw received trap message.
///
/// Decoding the payload into PDUs is downstream's business; the engine hands
/// over the datagram as received.
#[derive(Debug, Clone)]
pub struct TrapEvent {
    /// Address the trap was sent from.
    pub source: SocketAddr,
    /// Raw message bytes.
    pub payload: Bytes,
}

/// Callback target for received traps.
///
/// Invoked from the engine's dispatch task, concurrently with the lifecycle
/// owner's thread; an invocation may race a `close` call. Implementations
/// that need to block should hand the event off to their own task.
pub trait TrapResponder: Send + Sync + 'static {
    /// Handle one received trap.
    fn on_trap(&self, event: TrapEvent);
}

/// Narrow contract the receiver requires from a listening SNMP engine.
pub trait TrapEngine: Send + Sync {
    /// Bind a provisioned security model to this engine.
    fn install_usm(&self, usm: Arc<Usm>);

    /// The security model currently bound to this engine, if any.
    fn usm(&self) -> Option<Arc<Usm>>;

    /// Attach the responder that receives subsequent trap events.
    fn add_responder(&self, responder: Arc<dyn TrapResponder>);

    /// Release the engine's transport resources.
    ///
    /// Closing an already-closed engine is a no-op.
    fn close(&self) -> Result<()>;

    /// The engine's bound listen address, when it has one.
    fn local_addr(&self) -> Option<SocketAddr>;
}

/// UDP trap engine.
///
/// Created with [`UdpEngine::create`], which binds the socket and spawns the
/// dispatch task immediately. The task runs until [`close`](TrapEngine::close)
/// cancels it; the socket is released when the task exits.
pub struct UdpEngine {
    inner: Arc<UdpEngineInner>,
}

impl std::fmt::Debug for UdpEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpEngine")
            .field("local_addr", &self.inner.local_addr)
            .finish_non_exhaustive()
    }
}

struct UdpEngineInner {
    local_addr: SocketAddr,
    usm: Mutex<Option<Arc<Usm>>>,
    responder: Mutex<Option<Arc<dyn TrapResponder>>>,
    cancel: CancellationToken,
    closed: AtomicBool,
    /// Datagrams received, including dropped ones.
    received: AtomicU64,
    /// Datagrams dropped because no responder was attached.
    dropped: AtomicU64,
}

impl UdpEngine {
    /// Bind the listening socket and start the dispatch task.
    pub async fn create(config: &TrapConfig) -> Result<Self> {
        let bind_addr: SocketAddr = config.listen_addr.parse().map_err(|_| Error::Io {
            target: None,
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid listen address: {}", config.listen_addr),
            ),
        })?;

        let socket = bind_listener(bind_addr, config.recv_buffer_size)
            .await
            .map_err(|source| Error::Io {
                target: Some(bind_addr),
                source,
            })?;

        let local_addr = socket.local_addr().map_err(|source| Error::Io {
            target: Some(bind_addr),
            source,
        })?;

        let inner = Arc::new(UdpEngineInner {
            local_addr,
            usm: Mutex::new(None),
            responder: Mutex::new(None),
            cancel: CancellationToken::new(),
            closed: AtomicBool::new(false),
            received: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        });

        tracing::debug!(snmp.local_addr = %local_addr, "trap engine listening");

        Self::start_dispatch_loop(inner.clone(), socket, config.max_message_size);

        Ok(Self { inner })
    }

    /// Datagrams received since creation, including dropped ones.
    pub fn received(&self) -> u64 {
        self.inner.received.load(Ordering::Relaxed)
    }

    /// Datagrams dropped because no responder was attached.
    pub fn dropped(&self) -> u64 {
        self.inner.dropped.load(Ordering::Relaxed)
    }

    fn start_dispatch_loop(
        inner: Arc<UdpEngineInner>,
        socket: tokio::net::UdpSocket,
        max_message_size: usize,
    ) {
        tokio::spawn(async move {
            let mut buf = vec![0u8; max_message_size];

            loop {
                let (len, source) = tokio::select! {
                    _ = inner.cancel.cancelled() => {
                        tracing::debug!(
                            snmp.local_addr = %inner.local_addr,
                            "trap engine dispatch stopped"
                        );
                        return;
                    }
                    result = socket.recv_from(&mut buf) => match result {
                        Ok(pair) => pair,
                        Err(e) => {
                            // Datagram socket errors are transient; keep listening.
                            tracing::error!(error = %e, "trap engine recv error");
                            continue;
                        }
                    },
                };

                inner.received.fetch_add(1, Ordering::Relaxed);

                let responder = inner.responder.lock().unwrap().clone();
                match responder {
                    Some(responder) => {
                        tracing::trace!(
                            snmp.source = %source,
                            snmp.bytes = len,
                            "dispatching trap event"
                        );
                        responder.on_trap(TrapEvent {
                            source,
                            payload: Bytes::copy_from_slice(&buf[..len]),
                        });
                    }
                    None => {
                        inner.dropped.fetch_add(1, Ordering::Relaxed);
                        tracing::trace!(
                            snmp.source = %source,
                            "dropping trap received with no responder attached"
                        );
                    }
                }
            }
        });
    }
}

impl TrapEngine for UdpEngine {
    fn install_usm(&self, usm: Arc<Usm>) {
        *self.inner.usm.lock().unwrap() = Some(usm);
    }

    fn usm(&self) -> Option<Arc<Usm>> {
        self.inner.usm.lock().unwrap().clone()
    }

    fn add_responder(&self, responder: Arc<dyn TrapResponder>) {
        *self.inner.responder.lock().unwrap() = Some(responder);
    }

    fn close(&self) -> Result<()> {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.inner.cancel.cancel();
        Ok(())
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        Some(self.inner.local_addr)
    }
}
