//! Tally results as reported on-chain, and the comparison against a
//! recomputed tally

use crate::tally::Tally;
use govdrop_core::Dec;
use serde::{Deserialize, Serialize};

/// Four-option tally in the layout of a proposal's final tally result
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyResult {
    #[serde(alias = "yes_count")]
    pub yes: Dec,
    #[serde(alias = "abstain_count")]
    pub abstain: Dec,
    #[serde(alias = "no_count")]
    pub no: Dec,
    #[serde(alias = "no_with_veto_count")]
    pub no_with_veto: Dec,
}

impl TallyResult {
    pub fn total(&self) -> Dec {
        &self.yes + &self.abstain + &self.no + &self.no_with_veto
    }

    /// Per-option difference `self − other`
    pub fn diff(&self, other: &TallyResult) -> TallyResult {
        TallyResult {
            yes: &self.yes - &other.yes,
            abstain: &self.abstain - &other.abstain,
            no: &self.no - &other.no,
            no_with_veto: &self.no_with_veto - &other.no_with_veto,
        }
    }
}

/// Recomputed tally next to the reported one
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TallyComparison {
    pub computed: TallyResult,
    pub reported: Option<TallyResult>,
    pub total_voting_power: Dec,
    pub yes_percent: Option<Dec>,
}

impl TallyComparison {
    pub fn new(tally: &Tally, reported: Option<TallyResult>) -> Self {
        Self {
            computed: tally.to_result(),
            reported,
            total_voting_power: tally.total_voting_power.clone(),
            yes_percent: tally.yes_percent(),
        }
    }

    /// `computed − reported`, when a reported tally is known
    pub fn diff(&self) -> Option<TallyResult> {
        self.reported.as_ref().map(|r| self.computed.diff(r))
    }

    /// Rows in display order: computed, reported, diff
    pub fn rows(&self) -> Vec<(&'static str, TallyResult)> {
        let mut rows = vec![("computed", self.computed.clone())];
        if let Some(reported) = &self.reported {
            rows.push(("from prop", reported.clone()));
            rows.push(("diff", self.computed.diff(reported)));
        }
        rows
    }
}
