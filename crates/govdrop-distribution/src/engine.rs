//! # Distribution Engine
//!
//! Converts a snapshot of accounts into destination-ledger allocations in
//! three passes:
//!
//! 1. **Buckets**: split every account across Yes, Abstain, No,
//!    NoWithVeto and the non-voter pool (source units).
//! 2. **Calibration**: solve the non-voters multiplier that conserves supply.
//! 3. **Materialization**: convert each bucket with its effective
//!    multiplier, apply the dust policy, accumulate statistics.
//!
//! Every pass is a sequential fold; partial results merge by summation.

use crate::bucket::{AccountSplit, BucketTotals};
use crate::calibrator::calibrate;
use crate::params::DistributionParameters;
use crate::result::{AddressDetail, AirdropResult, DustSummary, SupplyStats};
use govdrop_core::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Distribution engine bound to one validated parameter set
#[derive(Clone, Debug)]
pub struct DistributionEngine {
    params: DistributionParameters,
}

impl DistributionEngine {
    /// Create an engine, rejecting invalid parameters
    pub fn new(params: DistributionParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &DistributionParameters {
        &self.params
    }

    /// Run the three passes over `accounts`
    pub fn run(&self, accounts: &[Account]) -> Result<AirdropResult> {
        validate_accounts(accounts)?;

        // Pass 1
        let splits: Vec<AccountSplit> = accounts.iter().map(AccountSplit::of).collect();
        let totals: BucketTotals = splits.iter().collect();
        debug!(
            accounts = accounts.len(),
            yes = %totals.yes,
            abstain = %totals.abstain,
            no = %totals.no,
            no_with_veto = %totals.no_with_veto,
            non_voter = %totals.non_voter,
            "Bucket totals accumulated"
        );

        // Pass 2
        let non_voters_multiplier = calibrate(&totals, &self.params)?;

        // Pass 3
        let mut addresses = BTreeMap::new();
        let mut addresses_detail = BTreeMap::new();
        let mut source = SupplyStats::default();
        let mut destination = SupplyStats::default();
        let mut dust = DustSummary::default();

        for (account, split) in accounts.iter().zip(&splits) {
            let detail = AddressDetail::materialize(split, &self.params, &non_voters_multiplier);

            source.add(split);
            destination.add(&detail.destination_split());

            if detail.total.is_positive() {
                if self.params.dust.is_dust(&detail.total) {
                    dust.addresses += 1;
                    dust.amount += &detail.total;
                } else {
                    addresses.insert(account.address.clone(), detail.total.clone());
                }
            }
            addresses_detail.insert(account.address.clone(), detail);
        }

        if dust.addresses > 0 {
            warn!(
                addresses = dust.addresses,
                amount = %dust.amount,
                threshold = %self.params.dust.min_allocation,
                "Allocations below the dust threshold excluded"
            );
        }

        let result = AirdropResult {
            params: self.params.clone(),
            non_voters_multiplier,
            addresses,
            addresses_detail,
            source,
            destination,
            dust,
        };

        info!(
            yes_multiplier = %self.params.yes_votes_multiplier,
            no_multiplier = %self.params.no_votes_multiplier,
            non_voters_multiplier = %result.non_voters_multiplier,
            addresses = result.addresses.len(),
            supply = %result.destination.supply,
            "Distribution computed"
        );
        Ok(result)
    }
}

/// Validate `params` and run one distribution
pub fn distribute(accounts: &[Account], params: &DistributionParameters) -> Result<AirdropResult> {
    DistributionEngine::new(params.clone())?.run(accounts)
}

/// Outcome of one parameter set of a sweep
#[derive(Clone, Debug)]
pub struct SweepRun {
    pub params: DistributionParameters,
    pub outcome: Result<AirdropResult>,
}

/// Run every parameter set over the same accounts
///
/// Calibration failures are kept per run; any other error aborts the sweep
/// since it would hit every run alike.
pub fn sweep(accounts: &[Account], sets: &[DistributionParameters]) -> Result<Vec<SweepRun>> {
    validate_accounts(accounts)?;

    let mut runs = Vec::with_capacity(sets.len());
    for params in sets {
        let outcome = distribute(accounts, params);
        match &outcome {
            Err(err) if !err.is_calibration_failure() => return Err(err.clone()),
            Err(err) => warn!(
                yes_multiplier = %params.yes_votes_multiplier,
                no_multiplier = %params.no_votes_multiplier,
                error = %err,
                "Parameter set skipped"
            ),
            Ok(_) => {}
        }
        runs.push(SweepRun {
            params: params.clone(),
            outcome,
        });
    }
    Ok(runs)
}
