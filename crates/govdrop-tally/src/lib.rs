//! # govdrop Tally
//!
//! Re-derives the aggregate voting power of a governance proposal from a
//! staking snapshot and compares it with the tally reported on-chain.
//!
//! ## Inheritance
//!
//! | Delegator voted? | Validator voted? | Power goes to         |
//! |------------------|------------------|-----------------------|
//! | yes              | any              | delegator's options   |
//! | no               | yes              | validator's options   |
//! | no               | no               | nobody                |

pub mod report;
pub mod tally;

pub use report::{TallyComparison, TallyResult};
pub use tally::{tally, tally_direct_votes, tally_validator_votes, Deductions, Tally};
