//! # Snapshot Maps and Account Assembly
//!
//! Raw governance snapshot records, keyed the way the tally consumes them,
//! and the assembly step that folds them into [`Account`] records for the
//! distribution engine.
//!
//! ## Assembly rules
//!
//! | Field              | Source                                              |
//! |--------------------|-----------------------------------------------------|
//! | `liquid_amount`    | balance, zero when absent                           |
//! | delegation amount  | `shares × tokens / delegator_shares` (1:1 fallback) |
//! |                    | rounded to [`AMOUNT_PRECISION`] places              |
//! | `vote`             | direct vote of the address                          |
//! | delegation vote    | direct vote, else the validator's vote              |
//! | `staked_amount`    | Σ delegation amounts                                |

use crate::decimal::Dec;
use crate::error::{GovdropError, Result};
use crate::types::{Account, Delegation, WeightedVote};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Fractional places kept on assembled token amounts
pub const AMOUNT_PRECISION: usize = 18;

/// Direct votes keyed by voter address
pub type VotesByAddr = HashMap<String, WeightedVote>;

/// Validators keyed by operator address
pub type ValidatorsByAddr = HashMap<String, ValidatorGovInfo>;

/// Delegations keyed by delegator address
pub type DelegationsByAddr = HashMap<String, Vec<StakeDelegation>>;

/// Liquid balances keyed by holder address
pub type BalancesByAddr = HashMap<String, Dec>;

/// Bonded validator as seen by governance
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorGovInfo {
    pub operator_address: String,

    /// Tokens bonded to the validator
    pub bonded_tokens: Dec,

    /// Shares issued to delegators
    pub delegator_shares: Dec,

    /// Vote of the validator's own account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote: Option<WeightedVote>,
}

impl ValidatorGovInfo {
    pub fn new(operator_address: impl Into<String>, bonded_tokens: Dec, delegator_shares: Dec) -> Self {
        Self {
            operator_address: operator_address.into(),
            bonded_tokens,
            delegator_shares,
            vote: None,
        }
    }

    pub fn with_vote(mut self, vote: WeightedVote) -> Self {
        self.vote = Some(vote);
        self
    }

    /// Vote to apply, `None` for an absent or empty vote
    pub fn effective_vote(&self) -> Option<&WeightedVote> {
        self.vote.as_ref().filter(|v| !v.is_empty())
    }

    /// Token value of `shares`, `None` for a validator with no shares
    pub fn tokens_for_shares(&self, shares: &Dec) -> Option<Dec> {
        (shares * &self.bonded_tokens).checked_div(&self.delegator_shares)
    }

    pub fn validate(&self) -> Result<()> {
        let address = self.operator_address.as_str();
        if address.trim().is_empty() {
            return Err(GovdropError::invalid_input(address, "empty validator address"));
        }
        if self.bonded_tokens.is_negative() || self.delegator_shares.is_negative() {
            return Err(GovdropError::invalid_input(
                address,
                "negative validator tokens or shares",
            ));
        }
        if self.delegator_shares.is_zero() && self.bonded_tokens.is_positive() {
            return Err(GovdropError::invalid_input(
                address,
                "validator holds tokens but no delegator shares",
            ));
        }
        if let Some(vote) = &self.vote {
            vote.validate(address)?;
        }
        Ok(())
    }
}

/// One delegation as recorded by the staking module
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeDelegation {
    pub delegator_address: String,
    pub validator_address: String,
    pub shares: Dec,
}

impl StakeDelegation {
    pub fn new(delegator_address: impl Into<String>, validator_address: impl Into<String>, shares: Dec) -> Self {
        Self {
            delegator_address: delegator_address.into(),
            validator_address: validator_address.into(),
            shares,
        }
    }
}

/// Group a flat delegation list by delegator, preserving input order
pub fn group_delegations(delegations: Vec<StakeDelegation>) -> DelegationsByAddr {
    let mut grouped: DelegationsByAddr = HashMap::new();
    for delegation in delegations {
        grouped
            .entry(delegation.delegator_address.clone())
            .or_default()
            .push(delegation);
    }
    grouped
}

/// Index validators by operator address, rejecting malformed or repeated ones
pub fn index_validators(validators: Vec<ValidatorGovInfo>) -> Result<ValidatorsByAddr> {
    let mut indexed = HashMap::with_capacity(validators.len());
    for validator in validators {
        validator.validate()?;
        let address = validator.operator_address.clone();
        if indexed.insert(address.clone(), validator).is_some() {
            return Err(GovdropError::invalid_input(address, "duplicate validator"));
        }
    }
    Ok(indexed)
}

/// Build one account per address holding a balance or a delegation,
/// sorted by address
pub fn assemble_accounts(
    votes: &VotesByAddr,
    validators: &ValidatorsByAddr,
    delegations: &DelegationsByAddr,
    balances: &BalancesByAddr,
) -> Result<Vec<Account>> {
    let addresses: BTreeSet<&String> = balances.keys().chain(delegations.keys()).collect();
    let mut accounts = Vec::with_capacity(addresses.len());
    let mut fallbacks = 0usize;

    for address in addresses {
        let direct_vote = votes.get(address).filter(|v| !v.is_empty());
        let stake = delegations.get(address).map(Vec::as_slice).unwrap_or(&[]);

        let mut items = Vec::with_capacity(stake.len());
        for record in stake {
            if record.shares.is_negative() {
                return Err(GovdropError::invalid_input(
                    address.as_str(),
                    "negative delegation shares",
                ));
            }

            let validator = validators.get(&record.validator_address);
            let amount = match validator.and_then(|v| v.tokens_for_shares(&record.shares)) {
                Some(amount) => amount,
                None => {
                    fallbacks += 1;
                    warn!(
                        delegator = %address,
                        validator = %record.validator_address,
                        "Validator unknown or without shares, taking shares 1:1"
                    );
                    record.shares.clone()
                }
            }
            .quantize(AMOUNT_PRECISION);

            let vote = match direct_vote {
                Some(vote) => Some(vote.clone()),
                None => validator.and_then(|v| v.effective_vote()).cloned(),
            };

            items.push(Delegation {
                validator_address: Some(record.validator_address.clone()),
                amount,
                vote,
            });
        }

        let staked_amount: Dec = items.iter().map(|d| &d.amount).sum();
        let liquid_amount = balances.get(address).cloned().unwrap_or_default();

        let mut account = Account::new(address.as_str(), liquid_amount, staked_amount)
            .with_delegations(items);
        account.vote = direct_vote.cloned();
        accounts.push(account);
    }

    debug!(
        accounts = accounts.len(),
        share_fallbacks = fallbacks,
        "Assembled accounts"
    );
    Ok(accounts)
}
