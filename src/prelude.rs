//! Prelude module for convenient imports.
//!
//! # Usage
//!
//! ```rust,no_run
//! use trapsink::prelude::*;
//! ```
//!
//! This imports:
//! - Lifecycle types: [`TrapReceiver`], [`ReceiverState`], [`TrapConfig`]
//! - The engine boundary: [`TrapEngine`], [`TrapEvent`], [`TrapResponder`]
//! - Error handling: [`Error`], [`Result`]
//! - V3 security: [`AuthProtocol`], [`PrivProtocol`], [`SecurityLevel`]

pub use crate::config::TrapConfig;
pub use crate::engine::{TrapEngine, TrapEvent, TrapResponder, UdpEngine};
pub use crate::error::{Error, Result};
pub use crate::receiver::{ReceiverState, TrapReceiver};
pub use crate::registry::SecurityModelRegistry;
pub use crate::v3::{AuthProtocol, PrivProtocol, SecurityLevel};
pub use crate::version::Version;
