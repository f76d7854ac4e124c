//! # Voting-Power Tally
//!
//! Recomputes the per-option voting power of a proposal from a snapshot of
//! votes, bonded validators and delegations.
//!
//! ## Algorithm
//!
//! 1. **Direct votes**: every delegation of a direct voter to a bonded
//!    validator counts `shares × tokens / delegator_shares`, split by the
//!    voter's weights. Its shares are recorded as a deduction against the
//!    validator.
//! 2. **Validator votes**: a validator that voted casts the power of its
//!    remaining shares, `delegator_shares − deductions`.
//!
//! Delegations to validators outside the bonded set contribute nothing.

use crate::report::TallyResult;
use govdrop_core::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// Shares already voted directly, keyed by validator operator address
pub type Deductions = HashMap<String, Dec>;

/// Voting power per option plus the grand total
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    /// Power per cast option
    pub results: BTreeMap<VoteOption, Dec>,

    /// Power of every counted stake fragment
    pub total_voting_power: Dec,
}

impl Default for Tally {
    fn default() -> Self {
        Self {
            results: VoteOption::CAST.iter().map(|o| (*o, Dec::zero())).collect(),
            total_voting_power: Dec::zero(),
        }
    }
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Power for `option`, zero if nothing was cast
    pub fn get(&self, option: VoteOption) -> Dec {
        self.results.get(&option).cloned().unwrap_or_default()
    }

    /// Add `voting_power` split across the weights of `vote`
    pub fn add_vote(&mut self, voting_power: &Dec, vote: &WeightedVote) {
        for entry in vote.iter() {
            let sub_power = voting_power * &entry.weight;
            *self.results.entry(entry.option).or_default() += sub_power;
        }
        self.total_voting_power += voting_power;
    }

    /// Sum two partial tallies
    pub fn merge(mut self, other: &Tally) -> Tally {
        for (option, power) in &other.results {
            *self.results.entry(*option).or_default() += power;
        }
        self.total_voting_power += &other.total_voting_power;
        self
    }

    /// `yes / (total − abstain)`, `None` when nobody voted anything but abstain
    pub fn yes_percent(&self) -> Option<Dec> {
        let denominator = &self.total_voting_power - self.get(VoteOption::Abstain);
        self.get(VoteOption::Yes).checked_div(&denominator)
    }

    pub fn to_result(&self) -> TallyResult {
        TallyResult {
            yes: self.get(VoteOption::Yes),
            abstain: self.get(VoteOption::Abstain),
            no: self.get(VoteOption::No),
            no_with_veto: self.get(VoteOption::NoWithVeto),
        }
    }
}

/// Full tally: direct votes, then validator votes on the remaining shares
pub fn tally(
    votes: &VotesByAddr,
    validators: &ValidatorsByAddr,
    delegations: &DelegationsByAddr,
) -> Tally {
    let (direct, deductions) = tally_direct_votes(votes, validators, delegations);
    let inherited = tally_validator_votes(validators, &deductions);
    let result = direct.merge(&inherited);

    info!(
        voters = votes.len(),
        validators = validators.len(),
        total_voting_power = %result.total_voting_power,
        "Tally computed"
    );
    result
}

/// Power of direct voters and the shares to deduct from their validators
pub fn tally_direct_votes(
    votes: &VotesByAddr,
    validators: &ValidatorsByAddr,
    delegations: &DelegationsByAddr,
) -> (Tally, Deductions) {
    let mut result = Tally::new();
    let mut deductions = Deductions::new();
    let mut excluded = 0usize;

    for (voter, vote) in votes {
        if vote.is_empty() {
            continue;
        }
        let Some(stake) = delegations.get(voter) else {
            continue;
        };

        for delegation in stake {
            let Some(validator) = validators.get(&delegation.validator_address) else {
                // validator not bonded
                excluded += 1;
                continue;
            };

            *deductions
                .entry(delegation.validator_address.clone())
                .or_default() += &delegation.shares;

            let voting_power = voting_power(validator, &delegation.shares);
            result.add_vote(&voting_power, vote);
        }
    }

    if excluded > 0 {
        warn!(
            delegations = excluded,
            "Direct-vote delegations to validators outside the bonded set ignored"
        );
    }
    debug!(
        validators_deducted = deductions.len(),
        power = %result.total_voting_power,
        "Direct votes tallied"
    );
    (result, deductions)
}

/// Power validators cast on behalf of delegators that did not vote
pub fn tally_validator_votes(validators: &ValidatorsByAddr, deductions: &Deductions) -> Tally {
    let mut result = Tally::new();

    for (address, validator) in validators {
        let Some(vote) = validator.effective_vote() else {
            continue;
        };

        let deducted = deductions.get(address).cloned().unwrap_or_default();
        let remaining = &validator.delegator_shares - &deducted;
        if !remaining.is_positive() {
            debug!(validator = %address, "All shares voted directly, skipping");
            continue;
        }

        let voting_power = voting_power(validator, &remaining);
        result.add_vote(&voting_power, vote);
    }

    debug!(power = %result.total_voting_power, "Validator votes tallied");
    result
}

fn voting_power(validator: &ValidatorGovInfo, shares: &Dec) -> Dec {
    match validator.tokens_for_shares(shares) {
        Some(power) => power,
        None => {
            warn!(
                validator = %validator.operator_address,
                "Validator has no delegator shares, counting zero power"
            );
            Dec::zero()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Dec {
        s.parse().unwrap()
    }

    fn single_validator(vote: Option<VoteOption>) -> ValidatorsByAddr {
        let mut validator = ValidatorGovInfo::new("val1", dec("1000"), dec("500"));
        if let Some(option) = vote {
            validator = validator.with_vote(WeightedVote::single(option));
        }
        index_validators(vec![validator]).unwrap()
    }

    #[test]
    fn test_validator_votes_for_silent_delegators() {
        let validators = single_validator(Some(VoteOption::Yes));
        let result = tally(&VotesByAddr::new(), &validators, &DelegationsByAddr::new());

        assert_eq!(result.get(VoteOption::Yes), dec("1000"));
        assert_eq!(result.total_voting_power, dec("1000"));
    }

    #[test]
    fn test_direct_vote_overrides_validator() {
        let validators = single_validator(Some(VoteOption::Yes));
        let delegations = group_delegations(vec![StakeDelegation::new("alice", "val1", dec("100"))]);
        let mut votes = VotesByAddr::new();
        votes.insert("alice".into(), WeightedVote::single(VoteOption::No));

        let result = tally(&votes, &validators, &delegations);

        // 100 shares at 2 tokens per share
        assert_eq!(result.get(VoteOption::No), dec("200"));
        assert_eq!(result.get(VoteOption::Yes), dec("800"));
        assert_eq!(result.total_voting_power, dec("1000"));
    }

    #[test]
    fn test_deductions_accumulate_per_validator() {
        let validators = single_validator(Some(VoteOption::Yes));
        let delegations = group_delegations(vec![
            StakeDelegation::new("alice", "val1", dec("100")),
            StakeDelegation::new("bob", "val1", dec("50")),
        ]);
        let mut votes = VotesByAddr::new();
        votes.insert("alice".into(), WeightedVote::single(VoteOption::No));
        votes.insert("bob".into(), WeightedVote::single(VoteOption::Abstain));

        let (_, deductions) = tally_direct_votes(&votes, &validators, &delegations);
        assert_eq!(deductions.get("val1"), Some(&dec("150")));
    }

    #[test]
    fn test_absent_validator_contributes_nothing() {
        let validators = single_validator(None);
        let delegations = group_delegations(vec![StakeDelegation::new("alice", "jailed", dec("100"))]);
        let mut votes = VotesByAddr::new();
        votes.insert("alice".into(), WeightedVote::single(VoteOption::Yes));

        let result = tally(&votes, &validators, &delegations);
        assert_eq!(result, Tally::new());
    }

    #[test]
    fn test_fully_deducted_validator_skipped() {
        let validators = single_validator(Some(VoteOption::Yes));
        let delegations = group_delegations(vec![StakeDelegation::new("alice", "val1", dec("500"))]);
        let mut votes = VotesByAddr::new();
        votes.insert("alice".into(), WeightedVote::single(VoteOption::Abstain));

        let result = tally(&votes, &validators, &delegations);
        assert_eq!(result.get(VoteOption::Yes), Dec::zero());
        assert_eq!(result.get(VoteOption::Abstain), dec("1000"));
        assert_eq!(result.yes_percent(), None);
    }

    #[test]
    fn test_weighted_split_and_yes_percent() {
        let validators = single_validator(None);
        let delegations = group_delegations(vec![StakeDelegation::new("alice", "val1", dec("500"))]);
        let vote = WeightedVote::new(vec![
            WeightedVoteOption::new(VoteOption::Yes, dec("0.6")),
            WeightedVoteOption::new(VoteOption::Abstain, dec("0.2")),
            WeightedVoteOption::new(VoteOption::No, dec("0.2")),
        ]);
        let mut votes = VotesByAddr::new();
        votes.insert("alice".into(), vote);

        let result = tally(&votes, &validators, &delegations);
        assert_eq!(result.get(VoteOption::Yes), dec("600"));
        assert_eq!(result.get(VoteOption::Abstain), dec("200"));
        assert_eq!(result.get(VoteOption::No), dec("200"));
        assert_eq!(result.yes_percent(), Some(dec("0.75")));
    }

    #[test]
    fn test_empty_direct_vote_is_absent() {
        let validators = single_validator(Some(VoteOption::No));
        let delegations = group_delegations(vec![StakeDelegation::new("alice", "val1", dec("100"))]);
        let mut votes = VotesByAddr::new();
        votes.insert("alice".into(), WeightedVote::default());

        let result = tally(&votes, &validators, &delegations);
        assert_eq!(result.get(VoteOption::No), dec("1000"));
    }

    #[test]
    fn test_merge_is_summation() {
        let mut a = Tally::new();
        a.add_vote(&dec("3"), &WeightedVote::single(VoteOption::Yes));
        let mut b = Tally::new();
        b.add_vote(&dec("2"), &WeightedVote::single(VoteOption::No));

        let merged = a.merge(&b);
        assert_eq!(merged.get(VoteOption::Yes), dec("3"));
        assert_eq!(merged.get(VoteOption::No), dec("2"));
        assert_eq!(merged.total_voting_power, dec("5"));
    }
}
