//! Serializable balance requests.
//!
//! A request bundles the component database, the stock and target specs and
//! the solver knobs. It can be loaded from YAML or JSON text.

use mb_core::quantity::Amount;
use mb_mixture::{ComponentRecord, ComponentRegistry, Mixture, MixtureSpec};
use serde::{Deserialize, Serialize};

use crate::error::{BalanceError, BalanceResult};
use crate::solver::{DEFAULT_MINIMUM_TRANSFER_UL, DEFAULT_TOLERANCE, check_knobs};

/// Solver knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    /// Smallest pipettable amount, as text (`"20 ul"`, `"5 mg"`)
    #[serde(alias = "minimum_volume")]
    pub minimum_transfer: String,
    /// Per-component relative error tolerance
    #[serde(alias = "tol")]
    pub tolerance: f64,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            minimum_transfer: format!("{DEFAULT_MINIMUM_TRANSFER_UL} ul"),
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl BalanceConfig {
    pub fn minimum_transfer_amount(&self) -> BalanceResult<Amount> {
        Ok(Amount::parse(&self.minimum_transfer)?)
    }

    /// Same rule the solver applies before solving.
    pub fn validate(&self) -> BalanceResult<()> {
        check_knobs(self.minimum_transfer_amount()?, self.tolerance)
    }
}

/// Everything needed to run a balance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceRequest {
    pub components: Vec<ComponentRecord>,
    pub stocks: Vec<MixtureSpec>,
    pub targets: Vec<MixtureSpec>,
    pub config: BalanceConfig,
}

impl BalanceRequest {
    pub fn from_yaml_str(text: &str) -> BalanceResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> BalanceResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_yaml_string(&self) -> BalanceResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn registry(&self) -> BalanceResult<ComponentRegistry> {
        Ok(ComponentRegistry::from_records(self.components.iter().cloned())?)
    }

    pub fn build_stocks(&self, registry: &ComponentRegistry) -> BalanceResult<Vec<Mixture>> {
        build_all(&self.stocks, registry)
    }

    pub fn build_targets(&self, registry: &ComponentRegistry) -> BalanceResult<Vec<Mixture>> {
        build_all(&self.targets, registry)
    }
}

fn build_all(specs: &[MixtureSpec], registry: &ComponentRegistry) -> BalanceResult<Vec<Mixture>> {
    specs
        .iter()
        .map(|spec| Ok(spec.build(registry)?))
        .collect()
}
