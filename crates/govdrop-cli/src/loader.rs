//! Snapshot directory reader and output writers
//!
//! | File               | Content                                              |
//! |--------------------|------------------------------------------------------|
//! | `votes.json`       | `[{voter, options: [{option, weight}]}]`             |
//! | `validators.json`  | bonded validators with `tokens`, `delegator_shares`  |
//! | `delegations.json` | `[{delegator_address, validator_address, shares}]`   |
//! | `balances.json`    | `[{address, coins: [{denom, amount}]}]`              |
//! | `prop.json`        | optional, `{final_tally_result: {...}}`              |
//! | `accounts.json`    | assembled accounts                                   |
//! | `airdrop.json`     | address → destination amount                         |

use anyhow::Context;
use govdrop_core::prelude::*;
use govdrop_tally::TallyResult;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::{info, warn};

pub const VOTES_FILE: &str = "votes.json";
pub const VALIDATORS_FILE: &str = "validators.json";
pub const DELEGATIONS_FILE: &str = "delegations.json";
pub const BALANCES_FILE: &str = "balances.json";
pub const PROPOSAL_FILE: &str = "prop.json";
pub const ACCOUNTS_FILE: &str = "accounts.json";
pub const AIRDROP_FILE: &str = "airdrop.json";
pub const AIRDROP_DETAIL_FILE: &str = "airdrop_detail.csv";

#[derive(Debug, Deserialize)]
struct VoteRecord {
    voter: String,
    options: WeightedVote,
}

#[derive(Debug, Deserialize)]
struct ValidatorRecord {
    operator_address: String,
    #[serde(default)]
    account_address: Option<String>,
    tokens: Dec,
    delegator_shares: Dec,
}

#[derive(Debug, Deserialize)]
struct Coin {
    denom: String,
    amount: Dec,
}

#[derive(Debug, Deserialize)]
struct BalanceRecord {
    address: String,
    coins: Vec<Coin>,
}

#[derive(Debug, Deserialize)]
struct ProposalRecord {
    final_tally_result: TallyResult,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("decoding {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("writing {}", path.display()))
}

/// Direct votes keyed by voter; a later vote replaces an earlier one
pub fn load_votes(dir: &Path) -> anyhow::Result<VotesByAddr> {
    let records: Vec<VoteRecord> = read_json(&dir.join(VOTES_FILE))?;
    let mut votes = VotesByAddr::with_capacity(records.len());
    for record in records {
        record.options.validate(&record.voter)?;
        votes.insert(record.voter, record.options);
    }
    info!(votes = votes.len(), "Loaded votes");
    Ok(votes)
}

/// Bonded validators, each carrying the vote of its own account
///
/// Validators without `account_address` cannot be matched to a vote.
pub fn load_validators(dir: &Path, votes: &VotesByAddr) -> anyhow::Result<ValidatorsByAddr> {
    let records: Vec<ValidatorRecord> = read_json(&dir.join(VALIDATORS_FILE))?;
    let mut unmatched = 0usize;

    let validators: Vec<ValidatorGovInfo> = records
        .into_iter()
        .map(|record| {
            let vote = match &record.account_address {
                Some(account) => votes.get(account).cloned(),
                None => {
                    unmatched += 1;
                    None
                }
            };
            ValidatorGovInfo {
                operator_address: record.operator_address,
                bonded_tokens: record.tokens,
                delegator_shares: record.delegator_shares,
                vote,
            }
        })
        .collect();

    if unmatched > 0 {
        warn!(validators = unmatched, "Validators without account address, vote unknown");
    }
    let validators = index_validators(validators)?;
    info!(validators = validators.len(), "Loaded validators");
    Ok(validators)
}

pub fn load_delegations(dir: &Path) -> anyhow::Result<DelegationsByAddr> {
    let records: Vec<StakeDelegation> = read_json(&dir.join(DELEGATIONS_FILE))?;
    let count = records.len();
    let delegations = group_delegations(records);
    info!(
        delegations = count,
        delegators = delegations.len(),
        "Loaded delegations"
    );
    Ok(delegations)
}

/// Liquid balances in `denom`; holders of other denoms only are skipped
pub fn load_balances(dir: &Path, denom: &str) -> anyhow::Result<BalancesByAddr> {
    let records: Vec<BalanceRecord> = read_json(&dir.join(BALANCES_FILE))?;
    let mut balances = BalancesByAddr::with_capacity(records.len());
    for record in records {
        if let Some(coin) = record.coins.into_iter().find(|c| c.denom == denom) {
            balances.insert(record.address, coin.amount);
        }
    }
    info!(balances = balances.len(), denom, "Loaded balances");
    Ok(balances)
}

/// Tally reported by the proposal, `None` without `prop.json`
pub fn load_reported_tally(dir: &Path) -> anyhow::Result<Option<TallyResult>> {
    let path = dir.join(PROPOSAL_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let proposal: ProposalRecord = read_json(&path)?;
    Ok(Some(proposal.final_tally_result))
}

pub fn load_accounts(dir: &Path) -> anyhow::Result<Vec<Account>> {
    let accounts: Vec<Account> = read_json(&dir.join(ACCOUNTS_FILE))?;
    info!(accounts = accounts.len(), "Loaded accounts");
    Ok(accounts)
}

pub fn write_accounts(dir: &Path, accounts: &[Account]) -> anyhow::Result<()> {
    write_json(&dir.join(ACCOUNTS_FILE), &accounts)
}

pub fn load_airdrop(dir: &Path) -> anyhow::Result<BTreeMap<String, Dec>> {
    read_json(&dir.join(AIRDROP_FILE))
}

pub fn write_airdrop(dir: &Path, addresses: &BTreeMap<String, Dec>) -> anyhow::Result<()> {
    write_json(&dir.join(AIRDROP_FILE), addresses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn dec(s: &str) -> Dec {
        s.parse().unwrap()
    }

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    fn snapshot_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            VOTES_FILE,
            r#"[
                {"voter": "cosmos1val", "options": [{"option": "VOTE_OPTION_NO", "weight": "1.000000000000000000"}]},
                {"voter": "cosmos1alice", "options": [{"option": "VOTE_OPTION_YES", "weight": "1"}]}
            ]"#,
        );
        write(
            dir.path(),
            VALIDATORS_FILE,
            r#"[
                {"operator_address": "cosmosvaloper1val", "account_address": "cosmos1val", "tokens": "200", "delegator_shares": "100"},
                {"operator_address": "cosmosvaloper1other", "tokens": "10", "delegator_shares": "10"}
            ]"#,
        );
        write(
            dir.path(),
            DELEGATIONS_FILE,
            r#"[
                {"delegator_address": "cosmos1alice", "validator_address": "cosmosvaloper1val", "shares": "10"},
                {"delegator_address": "cosmos1bob", "validator_address": "cosmosvaloper1val", "shares": "5"}
            ]"#,
        );
        write(
            dir.path(),
            BALANCES_FILE,
            r#"[
                {"address": "cosmos1bob", "coins": [{"denom": "ibc/27", "amount": "3"}, {"denom": "uatom", "amount": "7"}]},
                {"address": "cosmos1carol", "coins": [{"denom": "uosmo", "amount": "1"}]}
            ]"#,
        );
        dir
    }

    #[test]
    fn test_load_snapshot() {
        let dir = snapshot_dir();
        let votes = load_votes(dir.path()).unwrap();
        let validators = load_validators(dir.path(), &votes).unwrap();
        let delegations = load_delegations(dir.path()).unwrap();
        let balances = load_balances(dir.path(), "uatom").unwrap();

        assert_eq!(votes.len(), 2);
        assert_eq!(
            validators["cosmosvaloper1val"].vote,
            Some(WeightedVote::single(VoteOption::No))
        );
        assert!(validators["cosmosvaloper1other"].vote.is_none());
        assert_eq!(delegations["cosmos1bob"].len(), 1);
        assert_eq!(balances.len(), 1);
        assert_eq!(balances["cosmos1bob"], dec("7"));
    }

    #[test]
    fn test_accounts_round_trip_through_directory() {
        let dir = snapshot_dir();
        let votes = load_votes(dir.path()).unwrap();
        let validators = load_validators(dir.path(), &votes).unwrap();
        let delegations = load_delegations(dir.path()).unwrap();
        let balances = load_balances(dir.path(), "uatom").unwrap();

        let accounts = assemble_accounts(&votes, &validators, &delegations, &balances).unwrap();
        write_accounts(dir.path(), &accounts).unwrap();

        assert_eq!(load_accounts(dir.path()).unwrap(), accounts);
    }

    #[test]
    fn test_accounts_with_long_exchange_rate_survive_reload() {
        let dir = snapshot_dir();
        write(
            dir.path(),
            VALIDATORS_FILE,
            r#"[{"operator_address": "cosmosvaloper1val", "account_address": "cosmos1val", "tokens": "200", "delegator_shares": "300"}]"#,
        );
        write(
            dir.path(),
            DELEGATIONS_FILE,
            r#"[
                {"delegator_address": "a", "validator_address": "cosmosvaloper1val", "shares": "1"},
                {"delegator_address": "a", "validator_address": "cosmosvaloper1val", "shares": "1"}
            ]"#,
        );
        let votes = load_votes(dir.path()).unwrap();
        let validators = load_validators(dir.path(), &votes).unwrap();
        let delegations = load_delegations(dir.path()).unwrap();
        let balances = load_balances(dir.path(), "uatom").unwrap();

        let accounts = assemble_accounts(&votes, &validators, &delegations, &balances).unwrap();
        write_accounts(dir.path(), &accounts).unwrap();
        let reloaded = load_accounts(dir.path()).unwrap();

        assert_eq!(reloaded, accounts);
        assert!(validate_accounts(&reloaded).is_ok());

        let params = govdrop_distribution::DistributionParameters::default()
            .with_multipliers(Dec::one(), Dec::one());
        let result = govdrop_distribution::distribute(&reloaded, &params).unwrap();
        write_airdrop(dir.path(), &result.addresses).unwrap();
        let airdrop = load_airdrop(dir.path()).unwrap();

        assert_eq!(airdrop, result.addresses);
        let total: Dec = airdrop.values().sum();
        assert_eq!(total + &result.dust.amount, &params.conversion_factor * &result.source.supply);
    }

    #[test]
    fn test_missing_proposal_is_none() {
        let dir = snapshot_dir();
        assert!(load_reported_tally(dir.path()).unwrap().is_none());

        write(
            dir.path(),
            PROPOSAL_FILE,
            r#"{"final_tally_result": {"yes": "20", "abstain": "0", "no": "180", "no_with_veto": "0"}}"#,
        );
        let reported = load_reported_tally(dir.path()).unwrap().unwrap();
        assert_eq!(reported.no, dec("180"));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_votes(dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains(VOTES_FILE));
    }
}
