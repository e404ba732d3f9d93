//! Serializable balance results.

use std::collections::BTreeMap;

use mb_core::units::in_mg;
use mb_mixture::TransferRecord;
use serde::{Deserialize, Serialize};

use crate::error::BalanceResult;
use crate::solver::{BalancedTarget, TargetOutcome};

/// Wire shape of one feasible target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetReport {
    pub target: String,
    /// Component mass in the balanced mixture, mg
    pub balanced: BTreeMap<String, f64>,
    pub protocol: Vec<TransferRecord>,
    /// Relative error per target component
    pub errors: BTreeMap<String, f64>,
}

impl From<&BalancedTarget> for TargetReport {
    fn from(result: &BalancedTarget) -> Self {
        let balanced = result
            .balanced
            .iter()
            .filter_map(|c| c.mass().ok().map(|m| (c.name().to_string(), in_mg(m))))
            .collect();

        Self {
            target: result.target.clone(),
            balanced,
            protocol: result.protocol().iter().map(|a| a.to_record()).collect(),
            errors: result.errors.clone(),
        }
    }
}

/// One entry per target, in input order; `null` for infeasible targets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalanceReport {
    pub targets: Vec<Option<TargetReport>>,
}

impl BalanceReport {
    pub fn from_results(results: &[Option<BalancedTarget>]) -> Self {
        Self {
            targets: results
                .iter()
                .map(|r| r.as_ref().map(TargetReport::from))
                .collect(),
        }
    }

    /// Like [`Self::from_results`]; targets that failed to evaluate are `null`.
    pub fn from_outcomes(outcomes: &[TargetOutcome]) -> Self {
        Self {
            targets: outcomes
                .iter()
                .map(|o| match o {
                    Ok(Some(result)) => Some(TargetReport::from(result)),
                    Ok(None) | Err(_) => None,
                })
                .collect(),
        }
    }

    pub fn feasible_count(&self) -> usize {
        self.targets.iter().filter(|t| t.is_some()).count()
    }

    pub fn to_json_string(&self) -> BalanceResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
