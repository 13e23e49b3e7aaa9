//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Unit fails (connect / subscribe / receive error):
//!     → lifecycle supervisor logs the failure
//!     → backoff.rs (exponential delay with jitter)
//!     → supervisor rebuilds the unit with fresh connections
//! ```
//!
//! # Design Decisions
//! - No per-operation timeouts; a stalled call stalls only its own unit
//! - Per-message failures never restart a unit, they drop the message
//! - Delays carry up to 10% random jitter

pub mod backoff;

pub use backoff::{calculate_backoff, Backoff};
