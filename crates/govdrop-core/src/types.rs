//! # Snapshot Records
//!
//! Immutable input of a tally or distribution run: accounts, their
//! delegations and the weighted votes attached to either.

use crate::decimal::Dec;
use crate::error::{GovdropError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Governance vote option
///
/// `Empty` marks stake that cast no vote. It only appears in reports and
/// never carries a multiplier of its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VoteOption {
    #[serde(alias = "VOTE_OPTION_UNSPECIFIED", alias = "empty")]
    Empty,
    #[serde(alias = "VOTE_OPTION_YES", alias = "yes")]
    Yes,
    #[serde(alias = "VOTE_OPTION_ABSTAIN", alias = "abstain")]
    Abstain,
    #[serde(alias = "VOTE_OPTION_NO", alias = "no")]
    No,
    #[serde(alias = "VOTE_OPTION_NO_WITH_VETO", alias = "no_with_veto")]
    NoWithVeto,
}

impl VoteOption {
    /// Options a voter can actually cast
    pub const CAST: [VoteOption; 4] = [
        VoteOption::Yes,
        VoteOption::Abstain,
        VoteOption::No,
        VoteOption::NoWithVeto,
    ];

    /// Every option including `Empty`, in report order
    pub const ALL: [VoteOption; 5] = [
        VoteOption::Yes,
        VoteOption::Abstain,
        VoteOption::No,
        VoteOption::NoWithVeto,
        VoteOption::Empty,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Empty => "Empty",
            Self::Yes => "Yes",
            Self::Abstain => "Abstain",
            Self::No => "No",
            Self::NoWithVeto => "NoWithVeto",
        }
    }

    pub fn is_cast(&self) -> bool {
        !matches!(self, Self::Empty)
    }
}

impl fmt::Display for VoteOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VoteOption {
    type Err = GovdropError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "");
        let option = match normalized.trim_start_matches("voteoption") {
            "yes" => Self::Yes,
            "abstain" => Self::Abstain,
            "no" => Self::No,
            "nowithveto" => Self::NoWithVeto,
            "empty" | "unspecified" | "" => Self::Empty,
            _ => return Err(GovdropError::invalid_input(s, "unknown vote option")),
        };
        Ok(option)
    }
}

/// One (option, weight) pair of a weighted vote
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedVoteOption {
    pub option: VoteOption,
    pub weight: Dec,
}

impl WeightedVoteOption {
    pub fn new(option: VoteOption, weight: Dec) -> Self {
        Self { option, weight }
    }
}

/// Ordered set of weighted options. Weights are non-negative and sum to at
/// most 1; whatever is left is treated as not voted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightedVote(Vec<WeightedVoteOption>);

impl WeightedVote {
    pub fn new(options: Vec<WeightedVoteOption>) -> Self {
        Self(options)
    }

    /// Full weight on a single option
    pub fn single(option: VoteOption) -> Self {
        Self(vec![WeightedVoteOption::new(option, Dec::one())])
    }

    pub fn options(&self) -> &[WeightedVoteOption] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeightedVoteOption> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total_weight(&self) -> Dec {
        self.0.iter().map(|o| &o.weight).sum()
    }

    /// Weight not assigned to any option
    pub fn remainder(&self) -> Dec {
        Dec::one() - self.total_weight()
    }

    /// Weight assigned to `option`, zero if absent
    pub fn weight_of(&self, option: VoteOption) -> Dec {
        self.0
            .iter()
            .find(|o| o.option == option)
            .map(|o| o.weight.clone())
            .unwrap_or_default()
    }

    /// Check weights are non-negative, unique per option and sum to at most 1
    pub fn validate(&self, address: &str) -> Result<()> {
        let mut seen = HashSet::new();
        for entry in &self.0 {
            if !entry.option.is_cast() {
                return Err(GovdropError::invalid_input(
                    address,
                    "vote carries the Empty option",
                ));
            }
            if entry.weight.is_negative() {
                return Err(GovdropError::invalid_input(
                    address,
                    format!("negative weight {} for {}", entry.weight, entry.option),
                ));
            }
            if !seen.insert(entry.option) {
                return Err(GovdropError::invalid_input(
                    address,
                    format!("duplicate vote option {}", entry.option),
                ));
            }
        }

        let total = self.total_weight();
        if total > Dec::one() {
            return Err(GovdropError::invalid_input(
                address,
                format!("vote weights sum to {}, above 1", total),
            ));
        }
        Ok(())
    }
}

/// One bonded-stake fragment of an account, tagged with its effective vote
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    /// Validator the stake is bonded to (audit only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator_address: Option<String>,

    /// Bonded amount in source units
    pub amount: Dec,

    /// Effective vote, inherited from the validator when the owner did not vote
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote: Option<WeightedVote>,
}

impl Delegation {
    pub fn new(amount: Dec) -> Self {
        Self {
            validator_address: None,
            amount,
            vote: None,
        }
    }

    pub fn with_vote(mut self, vote: WeightedVote) -> Self {
        self.vote = Some(vote);
        self
    }

    pub fn with_validator(mut self, validator_address: impl Into<String>) -> Self {
        self.validator_address = Some(validator_address.into());
        self
    }

    /// Vote to apply, `None` for an absent or empty vote
    pub fn effective_vote(&self) -> Option<&WeightedVote> {
        self.vote.as_ref().filter(|v| !v.is_empty())
    }
}

/// One source-ledger holder
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier
    pub address: String,

    /// Balance not bonded
    pub liquid_amount: Dec,

    /// Bonded balance, the sum of `delegations` when they are itemized
    pub staked_amount: Dec,

    /// Direct vote
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote: Option<WeightedVote>,

    #[serde(default)]
    pub delegations: Vec<Delegation>,
}

impl Account {
    pub fn new(address: impl Into<String>, liquid_amount: Dec, staked_amount: Dec) -> Self {
        Self {
            address: address.into(),
            liquid_amount,
            staked_amount,
            vote: None,
            delegations: Vec::new(),
        }
    }

    pub fn with_vote(mut self, vote: WeightedVote) -> Self {
        self.vote = Some(vote);
        self
    }

    pub fn with_delegations(mut self, delegations: Vec<Delegation>) -> Self {
        self.delegations = delegations;
        self
    }

    /// Direct vote, `None` for an absent or empty vote
    pub fn direct_vote(&self) -> Option<&WeightedVote> {
        self.vote.as_ref().filter(|v| !v.is_empty())
    }

    pub fn total_amount(&self) -> Dec {
        &self.liquid_amount + &self.staked_amount
    }

    /// Check the record is well formed
    pub fn validate(&self) -> Result<()> {
        let address = self.address.as_str();
        if address.trim().is_empty() {
            return Err(GovdropError::invalid_input(address, "empty address"));
        }
        if self.liquid_amount.is_negative() {
            return Err(GovdropError::invalid_input(address, "negative liquid amount"));
        }
        if self.staked_amount.is_negative() {
            return Err(GovdropError::invalid_input(address, "negative staked amount"));
        }
        if let Some(vote) = &self.vote {
            vote.validate(address)?;
        }

        for delegation in &self.delegations {
            if delegation.amount.is_negative() {
                return Err(GovdropError::invalid_input(
                    address,
                    "negative delegation amount",
                ));
            }
            if let Some(vote) = &delegation.vote {
                vote.validate(address)?;
            }
        }

        if !self.delegations.is_empty() {
            let delegated: Dec = self.delegations.iter().map(|d| &d.amount).sum();
            if delegated != self.staked_amount {
                return Err(GovdropError::invalid_input(
                    address,
                    format!(
                        "delegations sum to {} but staked amount is {}",
                        delegated, self.staked_amount
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Validate every account and reject duplicate addresses
pub fn validate_accounts(accounts: &[Account]) -> Result<()> {
    let mut seen = HashSet::with_capacity(accounts.len());
    for account in accounts {
        account.validate()?;
        if !seen.insert(account.address.as_str()) {
            return Err(GovdropError::invalid_input(
                &account.address,
                "duplicate address",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Dec {
        s.parse().unwrap()
    }

    fn weighted(entries: &[(VoteOption, &str)]) -> WeightedVote {
        WeightedVote::new(
            entries
                .iter()
                .map(|(option, weight)| WeightedVoteOption::new(*option, dec(weight)))
                .collect(),
        )
    }

    #[test]
    fn test_vote_option_parsing() {
        assert_eq!("VOTE_OPTION_YES".parse::<VoteOption>().unwrap(), VoteOption::Yes);
        assert_eq!(
            "VOTE_OPTION_NO_WITH_VETO".parse::<VoteOption>().unwrap(),
            VoteOption::NoWithVeto
        );
        assert_eq!("NoWithVeto".parse::<VoteOption>().unwrap(), VoteOption::NoWithVeto);
        assert_eq!("abstain".parse::<VoteOption>().unwrap(), VoteOption::Abstain);
        assert!("maybe".parse::<VoteOption>().is_err());
    }

    #[test]
    fn test_vote_option_serde_aliases() {
        let option: VoteOption = serde_json::from_str("\"VOTE_OPTION_NO\"").unwrap();
        assert_eq!(option, VoteOption::No);
        let option: VoteOption = serde_json::from_str("\"Yes\"").unwrap();
        assert_eq!(option, VoteOption::Yes);
    }

    #[test]
    fn test_weighted_vote_remainder() {
        let vote = weighted(&[(VoteOption::Yes, "0.5"), (VoteOption::No, "0.2")]);
        assert_eq!(vote.total_weight(), dec("0.7"));
        assert_eq!(vote.remainder(), dec("0.3"));
        assert_eq!(vote.weight_of(VoteOption::No), dec("0.2"));
        assert_eq!(vote.weight_of(VoteOption::Abstain), Dec::zero());
    }

    #[test]
    fn test_weighted_vote_validation() {
        assert!(weighted(&[(VoteOption::Yes, "0.6"), (VoteOption::No, "0.5")])
            .validate("a")
            .is_err());
        assert!(weighted(&[(VoteOption::Yes, "-0.1")]).validate("a").is_err());
        assert!(weighted(&[(VoteOption::Yes, "0.3"), (VoteOption::Yes, "0.3")])
            .validate("a")
            .is_err());
        assert!(weighted(&[(VoteOption::Empty, "1")]).validate("a").is_err());
        assert!(WeightedVote::single(VoteOption::Abstain).validate("a").is_ok());
    }

    #[test]
    fn test_empty_vote_is_absent() {
        let account = Account::new("a", Dec::zero(), Dec::zero()).with_vote(WeightedVote::default());
        assert!(account.direct_vote().is_none());

        let delegation = Delegation::new(Dec::one()).with_vote(WeightedVote::default());
        assert!(delegation.effective_vote().is_none());
    }

    #[test]
    fn test_account_validation() {
        let ok = Account::new("a", dec("10"), dec("20")).with_delegations(vec![
            Delegation::new(dec("5")),
            Delegation::new(dec("15")),
        ]);
        assert!(ok.validate().is_ok());

        let mismatch = Account::new("b", dec("10"), dec("20"))
            .with_delegations(vec![Delegation::new(dec("5"))]);
        let err = mismatch.validate().unwrap_err();
        assert_eq!(err.address(), Some("b"));

        assert!(Account::new("c", dec("-1"), Dec::zero()).validate().is_err());
        assert!(Account::new("", Dec::zero(), Dec::zero()).validate().is_err());
    }

    #[test]
    fn test_duplicate_addresses_rejected() {
        let accounts = vec![
            Account::new("a", Dec::one(), Dec::zero()),
            Account::new("a", Dec::one(), Dec::zero()),
        ];
        let err = validate_accounts(&accounts).unwrap_err();
        assert!(matches!(err, GovdropError::InvalidInput { .. }));
    }

    #[test]
    fn test_account_json_layout() {
        let json = r#"{
            "address": "cosmos1abc",
            "liquid_amount": "10",
            "staked_amount": "20",
            "vote": [{"option": "VOTE_OPTION_YES", "weight": "1"}]
        }"#;
        let account: Account = serde_json::from_str(json).unwrap();
        assert_eq!(account.direct_vote(), Some(&WeightedVote::single(VoteOption::Yes)));
        assert!(account.delegations.is_empty());
        assert_eq!(account.total_amount(), dec("30"));
    }
}
