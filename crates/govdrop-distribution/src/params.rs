//! Distribution parameters and parameter sweeps

use crate::bucket::Bucket;
use govdrop_core::prelude::*;
use serde::{Deserialize, Serialize};

/// Prefix of destination-ledger addresses
pub const DEFAULT_ADDRESS_PREFIX: &str = "atone";

/// Exclusion rule for allocations too small to be worth materializing
///
/// Allocations strictly below `min_allocation` (destination units) are left
/// out of `addresses` and accounted for in the dust summary instead. Zero
/// allocations are always left out.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DustPolicy {
    #[serde(default)]
    pub min_allocation: Dec,
}

impl DustPolicy {
    pub fn new(min_allocation: Dec) -> Self {
        Self { min_allocation }
    }

    pub fn is_dust(&self, amount: &Dec) -> bool {
        amount < &self.min_allocation
    }
}

/// Parameters of one distribution run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionParameters {
    /// Multiplier of Yes stake
    pub yes_votes_multiplier: Dec,

    /// Multiplier of No and NoWithVeto stake
    pub no_votes_multiplier: Dec,

    /// Extra factor on NoWithVeto stake
    pub bonus: Dec,

    /// Factor on the non-voter pool
    pub malus: Dec,

    /// Source to destination unit ratio
    pub conversion_factor: Dec,

    /// Passed through to reports
    pub address_prefix: String,

    #[serde(default)]
    pub dust: DustPolicy,
}

impl Default for DistributionParameters {
    fn default() -> Self {
        Self {
            yes_votes_multiplier: Dec::one(),
            no_votes_multiplier: Dec::from_int(9),
            bonus: Dec::new_with_prec(103, 2),
            malus: Dec::new_with_prec(97, 2),
            conversion_factor: Dec::new_with_prec(1, 1),
            address_prefix: DEFAULT_ADDRESS_PREFIX.to_string(),
            dust: DustPolicy::default(),
        }
    }
}

impl DistributionParameters {
    /// Same parameters with other vote multipliers
    pub fn with_multipliers(&self, yes: Dec, no: Dec) -> Self {
        Self {
            yes_votes_multiplier: yes,
            no_votes_multiplier: no,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(GovdropError::InvalidParameters(msg));

        if self.yes_votes_multiplier.is_negative() {
            return invalid(format!("negative yes multiplier {}", self.yes_votes_multiplier));
        }
        if self.no_votes_multiplier.is_negative() {
            return invalid(format!("negative no multiplier {}", self.no_votes_multiplier));
        }
        if !self.conversion_factor.is_positive() {
            return invalid(format!(
                "conversion factor must be positive, got {}",
                self.conversion_factor
            ));
        }
        if self.bonus < Dec::one() {
            return invalid(format!("bonus {} below 1", self.bonus));
        }
        if self.malus.is_negative() || self.malus > Dec::one() {
            return invalid(format!("malus {} outside [0, 1]", self.malus));
        }
        if self.dust.min_allocation.is_negative() {
            return invalid(format!(
                "negative dust threshold {}",
                self.dust.min_allocation
            ));
        }
        Ok(())
    }

    /// `(multiplier, bonus/malus)` applied to a bucket once the non-voters
    /// multiplier is known
    pub fn bucket_factors(&self, bucket: Bucket, non_voters_multiplier: &Dec) -> (Dec, Dec) {
        match bucket {
            Bucket::Yes => (self.yes_votes_multiplier.clone(), Dec::one()),
            Bucket::Abstain => (non_voters_multiplier.clone(), Dec::one()),
            Bucket::No => (self.no_votes_multiplier.clone(), Dec::one()),
            Bucket::NoWithVeto => (self.no_votes_multiplier.clone(), self.bonus.clone()),
            Bucket::NonVoter => (non_voters_multiplier.clone(), self.malus.clone()),
        }
    }

    /// Product of the bucket factors
    pub fn effective_multiplier(&self, bucket: Bucket, non_voters_multiplier: &Dec) -> Dec {
        let (multiplier, bonus_malus) = self.bucket_factors(bucket, non_voters_multiplier);
        multiplier * bonus_malus
    }
}

/// One parameter set per `(yes, no)` combination, yes-major
pub fn parameter_sweep(
    base: &DistributionParameters,
    yes_multipliers: &[Dec],
    no_multipliers: &[Dec],
) -> Vec<DistributionParameters> {
    let yes_multipliers = if yes_multipliers.is_empty() {
        std::slice::from_ref(&base.yes_votes_multiplier)
    } else {
        yes_multipliers
    };
    let no_multipliers = if no_multipliers.is_empty() {
        std::slice::from_ref(&base.no_votes_multiplier)
    } else {
        no_multipliers
    };

    yes_multipliers
        .iter()
        .flat_map(|yes| {
            no_multipliers
                .iter()
                .map(move |no| base.with_multipliers(yes.clone(), no.clone()))
        })
        .collect()
}
