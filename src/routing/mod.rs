//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Cleaned Reading (source_id)
//!     → table.rs (source lookup)
//!     → Return: channel name or no-route
//!
//! Table Compilation (at startup):
//!     [routes] config section
//!     → HashMap<source_id, channel>
//!     → Freeze as immutable RoutingTable, shared via Arc
//! ```
//!
//! # Design Decisions
//! - Routes are static for the lifetime of the process
//! - Exact, case-sensitive source match
//! - Explicit no-route rather than a default channel; the relay drops and
//!   reports unrouted sources

pub mod table;

pub use table::RoutingTable;
