//! Airdrop results, per-address detail and aggregate statistics

use crate::bucket::{AccountSplit, Bucket};
use crate::params::DistributionParameters;
use govdrop_core::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One bucket of one address
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketDetail {
    /// Amount before conversion
    pub source_amount: Dec,
    pub multiplier: Dec,
    pub bonus_malus: Dec,
    /// `source × conversion × multiplier × bonus_malus`
    pub destination_amount: Dec,
}

impl BucketDetail {
    pub fn convert(source_amount: &Dec, conversion_factor: &Dec, factors: (Dec, Dec)) -> Self {
        let (multiplier, bonus_malus) = factors;
        let destination_amount = source_amount * conversion_factor * &multiplier * &bonus_malus;
        Self {
            source_amount: source_amount.clone(),
            multiplier,
            bonus_malus,
            destination_amount,
        }
    }
}

/// Per-bucket breakdown of one address' allocation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressDetail {
    pub yes: BucketDetail,
    pub abstain: BucketDetail,
    pub no: BucketDetail,
    pub no_with_veto: BucketDetail,
    pub did_not_vote: BucketDetail,
    pub liquid: BucketDetail,
    /// Σ destination amounts
    pub total: Dec,
}

impl AddressDetail {
    /// Row labels in display order
    pub const ROWS: [&'static str; 6] = [
        "yes",
        "abstain",
        "no",
        "no_with_veto",
        "did_not_vote",
        "liquid",
    ];

    /// Convert one account split with a calibrated multiplier
    pub fn materialize(
        split: &AccountSplit,
        params: &DistributionParameters,
        non_voters_multiplier: &Dec,
    ) -> Self {
        let cf = &params.conversion_factor;
        let factors = |bucket| params.bucket_factors(bucket, non_voters_multiplier);

        let yes = BucketDetail::convert(&split.yes, cf, factors(Bucket::Yes));
        let abstain = BucketDetail::convert(&split.abstain, cf, factors(Bucket::Abstain));
        let no = BucketDetail::convert(&split.no, cf, factors(Bucket::No));
        let no_with_veto = BucketDetail::convert(&split.no_with_veto, cf, factors(Bucket::NoWithVeto));
        let did_not_vote = BucketDetail::convert(&split.did_not_vote, cf, factors(Bucket::NonVoter));
        let liquid = BucketDetail::convert(&split.liquid, cf, factors(Bucket::NonVoter));

        let mut detail = Self {
            yes,
            abstain,
            no,
            no_with_veto,
            did_not_vote,
            liquid,
            total: Dec::zero(),
        };
        detail.total = detail.rows().iter().map(|(_, row)| &row.destination_amount).sum();
        detail
    }

    pub fn rows(&self) -> [(&'static str, &BucketDetail); 6] {
        [
            (Self::ROWS[0], &self.yes),
            (Self::ROWS[1], &self.abstain),
            (Self::ROWS[2], &self.no),
            (Self::ROWS[3], &self.no_with_veto),
            (Self::ROWS[4], &self.did_not_vote),
            (Self::ROWS[5], &self.liquid),
        ]
    }

    /// Destination amounts laid out as a split
    pub fn destination_split(&self) -> AccountSplit {
        AccountSplit {
            yes: self.yes.destination_amount.clone(),
            abstain: self.abstain.destination_amount.clone(),
            no: self.no.destination_amount.clone(),
            no_with_veto: self.no_with_veto.destination_amount.clone(),
            did_not_vote: self.did_not_vote.destination_amount.clone(),
            liquid: self.liquid.destination_amount.clone(),
        }
    }
}

/// Supply broken down by vote option
///
/// Stake without a vote is reported under `Empty` and liquid balance
/// as `unstaked`, so `supply == Σ votes + unstaked`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyStats {
    pub supply: Dec,
    pub unstaked: Dec,
    pub votes: BTreeMap<VoteOption, Dec>,
}

impl Default for SupplyStats {
    fn default() -> Self {
        Self {
            supply: Dec::zero(),
            unstaked: Dec::zero(),
            votes: VoteOption::ALL.iter().map(|o| (*o, Dec::zero())).collect(),
        }
    }
}

impl SupplyStats {
    pub fn add(&mut self, split: &AccountSplit) {
        for option in VoteOption::ALL {
            *self.votes.entry(option).or_default() += split.option_amount(option);
        }
        self.unstaked += &split.liquid;
        self.supply += split.total();
    }

    pub fn vote(&self, option: VoteOption) -> Dec {
        self.votes.get(&option).cloned().unwrap_or_default()
    }
}

/// Allocations excluded by the dust policy
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DustSummary {
    pub addresses: usize,
    pub amount: Dec,
}

/// One entry of the top-holders ranking
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Holder {
    /// 1-based
    pub rank: usize,
    pub address: String,
    pub amount: Dec,
    /// Fraction of the destination supply
    pub share: Dec,
}

/// Outcome of one distribution run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirdropResult {
    pub params: DistributionParameters,
    pub non_voters_multiplier: Dec,

    /// Destination amount per address
    pub addresses: BTreeMap<String, Dec>,

    /// Per-bucket breakdown of every processed address
    pub addresses_detail: BTreeMap<String, AddressDetail>,

    /// Statistics in source units
    pub source: SupplyStats,

    /// Statistics in destination units
    pub destination: SupplyStats,

    pub dust: DustSummary,
}

impl AirdropResult {
    /// Σ allocations kept in `addresses`
    pub fn total_distributed(&self) -> Dec {
        self.addresses.values().sum()
    }

    /// Re-check supply conservation and per-address consistency
    pub fn verify_conservation(&self) -> bool {
        let expected = &self.params.conversion_factor * &self.source.supply;
        if self.destination.supply != expected {
            return false;
        }
        if &self.total_distributed() + &self.dust.amount != expected {
            return false;
        }

        self.addresses.iter().all(|(address, amount)| {
            self.addresses_detail.get(address).is_some_and(|detail| {
                let rows: Dec = detail.rows().iter().map(|(_, row)| &row.destination_amount).sum();
                &detail.total == amount && rows == detail.total
            })
        })
    }

    /// The `count` largest allocations with their share of the supply
    pub fn top_holders(&self, count: usize) -> Vec<Holder> {
        rank_holders(&self.addresses, &self.destination.supply, count)
    }
}

/// The `count` largest allocations, ties broken by address
pub fn rank_holders(addresses: &BTreeMap<String, Dec>, supply: &Dec, count: usize) -> Vec<Holder> {
    let mut ranked: Vec<(&String, &Dec)> = addresses.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    ranked
        .into_iter()
        .take(count)
        .enumerate()
        .map(|(i, (address, amount))| Holder {
            rank: i + 1,
            address: address.clone(),
            amount: amount.clone(),
            share: amount.checked_div(supply).unwrap_or_default(),
        })
        .collect()
}
