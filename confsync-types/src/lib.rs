//! Shared DTOs (schemas-as-code) for the confsync workspace.
//!
//! # Design constraints
//! - These types are printed as JSON by the CLI and consumed by CI tooling.
//! - Be conservative with breaking changes.
//! - Prefer adding optional fields over changing semantics.

pub mod deps;
pub mod ops;
pub mod patch;
pub mod report;

/// Schema identifiers.
pub mod schema {
    pub const CONFSYNC_CONFIGURE_V1: &str = "confsync.configure.v1";
    pub const CONFSYNC_UPGRADE_V1: &str = "confsync.upgrade.v1";
}
