//! # govdrop Distribution
//!
//! Supply-conserving airdrop over a governance snapshot.
//!
//! ## Effective multipliers
//!
//! | Bucket      | Multiplier            | Bonus/malus |
//! |-------------|-----------------------|-------------|
//! | Yes         | `yes_votes_multiplier`| 1           |
//! | Abstain     | non-voters multiplier | 1           |
//! | No          | `no_votes_multiplier` | 1           |
//! | NoWithVeto  | `no_votes_multiplier` | `bonus`     |
//! | non-voter   | non-voters multiplier | `malus`     |
//!
//! The non-voters multiplier is solved per run so that
//! `Σ allocations = conversion_factor × Σ (liquid + staked)` exactly.

pub mod bucket;
pub mod calibrator;
pub mod engine;
pub mod params;
pub mod result;

pub use bucket::{AccountSplit, Bucket, BucketTotals};
pub use calibrator::{calibrate, solve_non_voters_multiplier};
pub use engine::{distribute, sweep, DistributionEngine, SweepRun};
pub use params::{parameter_sweep, DistributionParameters, DustPolicy, DEFAULT_ADDRESS_PREFIX};
pub use result::{
    rank_holders, AddressDetail, AirdropResult, BucketDetail, DustSummary, Holder, SupplyStats,
};
