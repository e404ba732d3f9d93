//! Stock selection for a single target.
//!
//! The base candidate is the bounded least-squares optimum. Every stock that
//! ended at its minimum-transfer bound spawns one alternate in which that
//! stock alone is dropped. All candidates are materialized and scored; the
//! feasible one with the smallest summed relative error wins.

use std::collections::BTreeMap;

use mb_core::numeric::relative_error;
use mb_core::quantity::Amount;
use mb_core::units::{Mass, g, in_g, ul};
use mb_mixture::{Mixture, TransferAction};

use crate::error::{BalanceError, BalanceResult};
use crate::nnls::{LsqConfig, bounded_lsq};
use crate::problem::BalanceProblem;

/// Default minimum transfer: 20 µl.
pub const DEFAULT_MINIMUM_TRANSFER_UL: f64 = 20.0;

/// Default per-component relative error tolerance.
pub const DEFAULT_TOLERANCE: f64 = 1e-3;

/// One evaluated stock combination.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Stock dropped from the base solution, if any
    pub zeroed: Option<usize>,
    /// Mass drawn from each stock, grams, stock order
    pub masses: Vec<f64>,
    /// Mixture produced by the transfers
    pub balanced: Mixture,
    /// Relative error of every target component
    pub errors: BTreeMap<String, f64>,
    /// Every error is below the tolerance
    pub feasible: bool,
}

impl Candidate {
    pub fn error_sum(&self) -> f64 {
        self.errors.values().sum()
    }
}

/// Feasible result for one target.
#[derive(Debug, Clone, PartialEq)]
pub struct BalancedTarget {
    /// Name of the requested target
    pub target: String,
    /// Mixture produced by the protocol, named `<target>-balanced`
    pub balanced: Mixture,
    /// Relative error of every target component
    pub errors: BTreeMap<String, f64>,
    /// Stock name and mass for each contributing stock
    pub transfers: Vec<(String, Mass)>,
}

impl BalancedTarget {
    pub fn protocol(&self) -> &[TransferAction] {
        self.balanced.protocol()
    }
}

/// Balances targets against a fixed, ordered stock set.
#[derive(Debug, Clone)]
pub struct BalanceSolver {
    stocks: Vec<Mixture>,
    minimum_transfer: Amount,
    tolerance: f64,
    lsq: LsqConfig,
}

impl Default for BalanceSolver {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl BalanceSolver {
    pub fn new(stocks: Vec<Mixture>) -> Self {
        Self {
            stocks,
            minimum_transfer: Amount::Volume(ul(DEFAULT_MINIMUM_TRANSFER_UL)),
            tolerance: DEFAULT_TOLERANCE,
            lsq: LsqConfig::default(),
        }
    }

    pub fn with_minimum_transfer(mut self, amount: Amount) -> Self {
        self.minimum_transfer = amount;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_lsq_config(mut self, config: LsqConfig) -> Self {
        self.lsq = config;
        self
    }

    pub fn stocks(&self) -> &[Mixture] {
        &self.stocks
    }

    pub fn stocks_mut(&mut self) -> &mut Vec<Mixture> {
        &mut self.stocks
    }

    pub fn minimum_transfer(&self) -> Amount {
        self.minimum_transfer
    }

    pub fn set_minimum_transfer(&mut self, amount: Amount) {
        self.minimum_transfer = amount;
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.tolerance = tolerance;
    }

    /// Best feasible combination for `target`, or `None` when nothing is within tolerance.
    pub fn solve(&self, target: &Mixture) -> BalanceResult<Option<BalancedTarget>> {
        let candidates = self.candidates(target)?;

        // Earlier candidates win ties.
        let best = candidates
            .into_iter()
            .filter(|c| c.feasible)
            .fold(None::<Candidate>, |best, c| match best {
                Some(b) if b.error_sum() <= c.error_sum() => Some(b),
                _ => Some(c),
            });

        let Some(best) = best else {
            tracing::warn!(target = %target.name(), "no suitable mass balance found");
            return Ok(None);
        };

        let transfers = self
            .stocks
            .iter()
            .zip(&best.masses)
            .filter(|(_, m)| **m > 0.0)
            .map(|(stock, m)| (stock.name().to_string(), g(*m)))
            .collect();

        Ok(Some(BalancedTarget {
            target: target.name().to_string(),
            balanced: best.balanced,
            errors: best.errors,
            transfers,
        }))
    }

    /// Every candidate evaluated for `target`, base solution first.
    pub fn candidates(&self, target: &Mixture) -> BalanceResult<Vec<Candidate>> {
        self.validate()?;
        let problem = BalanceProblem::new(&self.stocks, target, self.minimum_transfer)?;
        let solution = bounded_lsq(
            &problem.mass_fractions,
            &problem.target_masses,
            &problem.lower_bounds,
            &self.lsq,
        )?;
        tracing::debug!(
            target = %target.name(),
            iterations = solution.iterations,
            residual_g = solution.residual_norm,
            "bounded least squares solved"
        );

        let base: Vec<f64> = solution.x.iter().copied().collect();
        let mut mass_sets = vec![(None, base.clone())];
        for (j, _) in solution.at_lower.iter().enumerate().filter(|(_, at)| **at) {
            let mut masses = base.clone();
            masses[j] = 0.0;
            mass_sets.push((Some(j), masses));
        }

        mass_sets
            .into_iter()
            .map(|(zeroed, masses)| {
                let candidate = self.evaluate(target, zeroed, masses)?;
                tracing::debug!(
                    target = %target.name(),
                    zeroed = ?zeroed.map(|j| problem.stocks[j].name()),
                    error_sum = candidate.error_sum(),
                    feasible = candidate.feasible,
                    "candidate evaluated"
                );
                Ok(candidate)
            })
            .collect()
    }

    fn validate(&self) -> BalanceResult<()> {
        check_knobs(self.minimum_transfer, self.tolerance)
    }

    fn evaluate(
        &self,
        target: &Mixture,
        zeroed: Option<usize>,
        masses: Vec<f64>,
    ) -> BalanceResult<Candidate> {
        let balanced = materialize(&self.stocks, target, &masses)?;

        let mut errors = BTreeMap::new();
        for component in target.iter() {
            let wanted = in_g(component.mass()?);
            let got = in_g(balanced.mass_of(component.name())?);
            errors.insert(component.name().to_string(), relative_error(got, wanted));
        }
        let feasible = errors.values().all(|e| *e < self.tolerance);

        Ok(Candidate {
            zeroed,
            masses,
            balanced,
            errors,
            feasible,
        })
    }
}

/// Combine the measured stock portions into the balanced target.
fn materialize(stocks: &[Mixture], target: &Mixture, masses: &[f64]) -> BalanceResult<Mixture> {
    let mut balanced = Mixture::new("");
    for (stock, &mass) in stocks.iter().zip(masses) {
        if mass <= 0.0 {
            continue;
        }
        let measured = stock.measure_out(Amount::Mass(g(mass)))?;
        balanced = balanced.combine(&measured)?;

        let source = stock.location().ok_or_else(|| BalanceError::MissingLocation {
            stock: stock.name().to_string(),
        })?;
        balanced.push_transfer(TransferAction::new(
            source,
            target.location().map(str::to_string),
            measured.volume(),
        ));
    }

    balanced.set_name(format!("{}-balanced", target.name()));
    balanced.set_location(target.location().map(str::to_string));
    for component in target.iter() {
        if !balanced.contains(component.name()) {
            balanced.insert(component.with_mass(g(0.0)));
        }
    }
    Ok(balanced)
}

/// Result of balancing one target: `Ok(None)` when no candidate is feasible.
pub type TargetOutcome = BalanceResult<Option<BalancedTarget>>;

/// Shared rule for solver knobs: a finite positive tolerance and a minimum
/// transfer that is zero (no lower bound) or positive.
pub(crate) fn check_knobs(minimum_transfer: Amount, tolerance: f64) -> BalanceResult<()> {
    if !tolerance.is_finite() || tolerance <= 0.0 {
        return Err(BalanceError::InvalidConfig {
            what: format!("tolerance must be positive, got {tolerance}"),
        });
    }
    if !minimum_transfer.is_positive() && !is_zero(minimum_transfer) {
        return Err(BalanceError::InvalidConfig {
            what: format!("minimum transfer must not be negative, got {minimum_transfer}"),
        });
    }
    Ok(())
}

fn is_zero(amount: Amount) -> bool {
    match amount {
        Amount::Mass(m) => m.value == 0.0,
        Amount::Volume(v) => v.value == 0.0,
    }
}
