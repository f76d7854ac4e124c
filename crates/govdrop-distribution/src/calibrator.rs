//! # Calibrator
//!
//! Pass 2 of a distribution: solve the non-voters multiplier `C` so that
//! the weighted buckets add up to the source supply.
//!
//! ```text
//!        total − yesMult·yes − noMult·no − noMult·bonus·nwv
//!   C = ────────────────────────────────────────────────────
//!                   abstain + malus·nonVoter
//! ```
//!
//! Abstain stake and the non-voter pool are the only buckets scaled by `C`,
//! which makes the solve closed-form.

use crate::bucket::BucketTotals;
use crate::params::DistributionParameters;
use govdrop_core::prelude::*;
use tracing::debug;

/// Solve the non-voters multiplier from bucket totals
pub fn solve_non_voters_multiplier(
    totals: &BucketTotals,
    yes_multiplier: &Dec,
    no_multiplier: &Dec,
    bonus: &Dec,
    malus: &Dec,
) -> Result<Dec> {
    let weighted_voters = yes_multiplier * &totals.yes
        + no_multiplier * &totals.no
        + no_multiplier * bonus * &totals.no_with_veto;
    let numerator = totals.total() - weighted_voters;
    let denominator = &totals.abstain + malus * &totals.non_voter;

    let multiplier = numerator
        .checked_div(&denominator)
        .ok_or(GovdropError::DegenerateCalibration)?;
    if multiplier.is_negative() {
        return Err(GovdropError::NegativeCalibration { multiplier });
    }

    debug!(
        numerator = %numerator,
        denominator = %denominator,
        non_voters_multiplier = %multiplier,
        "Calibrated non-voters multiplier"
    );
    Ok(multiplier)
}

/// Solve with the multipliers of a parameter set
pub fn calibrate(totals: &BucketTotals, params: &DistributionParameters) -> Result<Dec> {
    solve_non_voters_multiplier(
        totals,
        &params.yes_votes_multiplier,
        &params.no_votes_multiplier,
        &params.bonus,
        &params.malus,
    )
}
