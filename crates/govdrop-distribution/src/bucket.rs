//! # Buckets
//!
//! Pass 1 of a distribution: each account's holdings are split across the
//! five buckets that carry a multiplier.
//!
//! | Holding                          | Bucket                      |
//! |----------------------------------|-----------------------------|
//! | liquid balance                   | non-voter (`liquid`)        |
//! | stake × weight of a cast option  | that option                 |
//! | stake × unassigned weight        | non-voter (`did_not_vote`)  |
//! | stake without any vote           | non-voter (`did_not_vote`)  |

use govdrop_core::prelude::*;
use serde::{Deserialize, Serialize};

/// Group of holdings sharing one effective multiplier
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Bucket {
    Yes,
    Abstain,
    No,
    NoWithVeto,
    NonVoter,
}

impl Bucket {
    pub const ALL: [Bucket; 5] = [
        Bucket::Yes,
        Bucket::Abstain,
        Bucket::No,
        Bucket::NoWithVeto,
        Bucket::NonVoter,
    ];

    pub fn for_option(option: VoteOption) -> Bucket {
        match option {
            VoteOption::Yes => Bucket::Yes,
            VoteOption::Abstain => Bucket::Abstain,
            VoteOption::No => Bucket::No,
            VoteOption::NoWithVeto => Bucket::NoWithVeto,
            VoteOption::Empty => Bucket::NonVoter,
        }
    }
}

/// One account's holdings per bucket, with the non-voter pool itemized
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSplit {
    pub yes: Dec,
    pub abstain: Dec,
    pub no: Dec,
    pub no_with_veto: Dec,
    /// Staked, no effective vote
    pub did_not_vote: Dec,
    pub liquid: Dec,
}

impl AccountSplit {
    /// Split an account into buckets (source units)
    pub fn of(account: &Account) -> Self {
        let mut split = AccountSplit {
            liquid: account.liquid_amount.clone(),
            ..Default::default()
        };

        if let Some(vote) = account.direct_vote() {
            split.add_voted(&account.staked_amount, vote);
        } else if account.delegations.is_empty() {
            split.did_not_vote += &account.staked_amount;
        } else {
            for delegation in &account.delegations {
                match delegation.effective_vote() {
                    Some(vote) => split.add_voted(&delegation.amount, vote),
                    None => split.did_not_vote += &delegation.amount,
                }
            }
        }
        split
    }

    fn add_voted(&mut self, amount: &Dec, vote: &WeightedVote) {
        for entry in vote.iter() {
            let sub_amount = amount * &entry.weight;
            match entry.option {
                VoteOption::Yes => self.yes += sub_amount,
                VoteOption::Abstain => self.abstain += sub_amount,
                VoteOption::No => self.no += sub_amount,
                VoteOption::NoWithVeto => self.no_with_veto += sub_amount,
                VoteOption::Empty => self.did_not_vote += sub_amount,
            }
        }
        self.did_not_vote += amount * vote.remainder();
    }

    /// Amount in `bucket`; the non-voter pool is `did_not_vote + liquid`
    pub fn amount(&self, bucket: Bucket) -> Dec {
        match bucket {
            Bucket::Yes => self.yes.clone(),
            Bucket::Abstain => self.abstain.clone(),
            Bucket::No => self.no.clone(),
            Bucket::NoWithVeto => self.no_with_veto.clone(),
            Bucket::NonVoter => &self.did_not_vote + &self.liquid,
        }
    }

    pub fn total(&self) -> Dec {
        &self.yes + &self.abstain + &self.no + &self.no_with_veto + &self.did_not_vote + &self.liquid
    }

    /// Amount reported under each vote option, `Empty` for staked non-votes.
    /// Liquid is reported apart, as unstaked.
    pub fn option_amount(&self, option: VoteOption) -> &Dec {
        match option {
            VoteOption::Yes => &self.yes,
            VoteOption::Abstain => &self.abstain,
            VoteOption::No => &self.no,
            VoteOption::NoWithVeto => &self.no_with_veto,
            VoteOption::Empty => &self.did_not_vote,
        }
    }
}

/// Running per-bucket totals over all accounts
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketTotals {
    pub yes: Dec,
    pub abstain: Dec,
    pub no: Dec,
    pub no_with_veto: Dec,
    pub non_voter: Dec,
}

impl BucketTotals {
    pub fn add(&mut self, split: &AccountSplit) {
        self.yes += &split.yes;
        self.abstain += &split.abstain;
        self.no += &split.no;
        self.no_with_veto += &split.no_with_veto;
        self.non_voter += split.amount(Bucket::NonVoter);
    }

    pub fn get(&self, bucket: Bucket) -> &Dec {
        match bucket {
            Bucket::Yes => &self.yes,
            Bucket::Abstain => &self.abstain,
            Bucket::No => &self.no,
            Bucket::NoWithVeto => &self.no_with_veto,
            Bucket::NonVoter => &self.non_voter,
        }
    }

    pub fn total(&self) -> Dec {
        Bucket::ALL.iter().map(|b| self.get(*b)).sum()
    }
}

impl<'a> FromIterator<&'a AccountSplit> for BucketTotals {
    fn from_iter<I: IntoIterator<Item = &'a AccountSplit>>(iter: I) -> Self {
        let mut totals = BucketTotals::default();
        for split in iter {
            totals.add(split);
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Dec {
        s.parse().unwrap()
    }

    #[test]
    fn test_direct_vote_takes_staked_amount() {
        let account = Account::new("a", dec("10"), dec("20"))
            .with_vote(WeightedVote::single(VoteOption::No))
            .with_delegations(vec![
                Delegation::new(dec("20")).with_vote(WeightedVote::single(VoteOption::Yes)),
            ]);
        let split = AccountSplit::of(&account);

        assert_eq!(split.no, dec("20"));
        assert_eq!(split.yes, Dec::zero());
        assert_eq!(split.amount(Bucket::NonVoter), dec("10"));
    }

    #[test]
    fn test_partial_weights_route_remainder_to_pool() {
        let vote = WeightedVote::new(vec![WeightedVoteOption::new(VoteOption::Yes, dec("0.75"))]);
        let account = Account::new("a", Dec::zero(), dec("100")).with_vote(vote);
        let split = AccountSplit::of(&account);

        assert_eq!(split.yes, dec("75"));
        assert_eq!(split.did_not_vote, dec("25"));
        assert_eq!(split.total(), dec("100"));
    }

    #[test]
    fn test_delegations_split_by_inherited_vote() {
        let account = Account::new("a", dec("1"), dec("30")).with_delegations(vec![
            Delegation::new(dec("10")).with_vote(WeightedVote::single(VoteOption::NoWithVeto)),
            Delegation::new(dec("20")),
        ]);
        let split = AccountSplit::of(&account);

        assert_eq!(split.no_with_veto, dec("10"));
        assert_eq!(split.did_not_vote, dec("20"));
        assert_eq!(split.liquid, dec("1"));
        assert_eq!(split.option_amount(VoteOption::Empty), &dec("20"));
    }

    #[test]
    fn test_unitemized_stake_without_vote_is_pooled() {
        let split = AccountSplit::of(&Account::new("a", Dec::zero(), dec("5")));
        assert_eq!(split.did_not_vote, dec("5"));
    }

    #[test]
    fn test_totals_accumulate() {
        let splits = vec![
            AccountSplit::of(&Account::new("a", dec("1"), dec("2")).with_vote(WeightedVote::single(VoteOption::Yes))),
            AccountSplit::of(&Account::new("b", dec("3"), dec("4"))),
        ];
        let totals: BucketTotals = splits.iter().collect();

        assert_eq!(totals.yes, dec("2"));
        assert_eq!(totals.non_voter, dec("8"));
        assert_eq!(totals.total(), dec("10"));
    }
}
