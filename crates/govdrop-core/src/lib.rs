//! # govdrop Core
//!
//! Shared building blocks for governance-snapshot computations.
//!
//! This crate provides:
//! - `Dec` - exact decimal arithmetic over big rationals
//! - `Account`, `Delegation`, `WeightedVote` - snapshot records
//! - `ValidatorGovInfo`, `StakeDelegation` - raw staking records and the
//!   account assembly that resolves vote inheritance
//! - `GovdropError` - the error type of every library crate
//!
//! ## Data flow
//!
//! ```text
//!   votes ───────┐
//!   validators ──┼──► assemble_accounts ──► [Account] ──► distribution
//!   delegations ─┤
//!   balances ────┘
//!
//!   votes + validators + delegations ───────────────────► tally
//! ```

pub mod decimal;
pub mod error;
pub mod snapshot;
pub mod types;

pub use decimal::*;
pub use error::*;
pub use snapshot::*;
pub use types::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::decimal::Dec;
    pub use crate::error::{GovdropError, Result};
    pub use crate::snapshot::*;
    pub use crate::types::*;
}
