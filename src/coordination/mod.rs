//! Coordination layer
//!
//! Shutdown signalling shared by the poll loop and the reconciliation engine.

pub mod shutdown;

pub use shutdown::{install_signal_handlers, ShutdownHandle, ShutdownSignal};
