//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → routing table → spawn supervised units
//!
//! Supervision (supervisor.rs):
//!     build unit → run → on error: backoff → rebuild
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → broadcast → units finish current message → exit
//! ```
//!
//! # Design Decisions
//! - Invalid configuration is the only fatal startup error
//! - Shutdown has a grace period; stragglers are abandoned

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod supervisor;

pub use shutdown::Shutdown;
pub use startup::{run, spawn_units, Units};
pub use supervisor::{supervise, Exit};
