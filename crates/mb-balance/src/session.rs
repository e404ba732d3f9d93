//! Batch balancing of many targets against one stock set.

use std::collections::BTreeMap;

use mb_core::quantity::Amount;
use mb_core::units::in_mg_per_ml;
use mb_mixture::Mixture;
use rayon::prelude::*;

use crate::config::BalanceRequest;
use crate::error::BalanceResult;
use crate::problem::{component_universe, validate_stocks};
use crate::report::BalanceReport;
use crate::solver::{BalanceSolver, TargetOutcome};

/// Ordered stocks and targets plus the solver knobs.
///
/// Targets are independent: [`BalanceSession::solve_all`] solves them one by
/// one on the calling thread against a shared, read-only stock set;
/// [`BalanceSession::solve_all_parallel`] is the opt-in rayon variant.
#[derive(Debug, Clone, Default)]
pub struct BalanceSession {
    solver: BalanceSolver,
    targets: Vec<Mixture>,
}

impl BalanceSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build registry, stocks and targets from a request.
    pub fn from_request(request: &BalanceRequest) -> BalanceResult<Self> {
        request.config.validate()?;
        let registry = request.registry()?;

        let solver = BalanceSolver::new(request.build_stocks(&registry)?)
            .with_minimum_transfer(request.config.minimum_transfer_amount()?)
            .with_tolerance(request.config.tolerance);

        Ok(Self {
            solver,
            targets: request.build_targets(&registry)?,
        })
    }

    pub fn solver(&self) -> &BalanceSolver {
        &self.solver
    }

    pub fn stocks(&self) -> &[Mixture] {
        self.solver.stocks()
    }

    pub fn targets(&self) -> &[Mixture] {
        &self.targets
    }

    pub fn add_stock(&mut self, stock: Mixture) {
        self.solver.stocks_mut().push(stock);
    }

    pub fn add_target(&mut self, target: Mixture) {
        self.targets.push(target);
    }

    pub fn reset_stocks(&mut self) {
        self.solver.stocks_mut().clear();
    }

    pub fn reset_targets(&mut self) {
        self.targets.clear();
    }

    pub fn minimum_transfer(&self) -> Amount {
        self.solver.minimum_transfer()
    }

    pub fn set_minimum_transfer(&mut self, amount: Amount) {
        self.solver.set_minimum_transfer(amount);
    }

    pub fn tolerance(&self) -> f64 {
        self.solver.tolerance()
    }

    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.solver.set_tolerance(tolerance);
    }

    /// Every component of every stock and target, first-seen order.
    pub fn component_names(&self) -> Vec<String> {
        component_universe(self.stocks().iter().chain(&self.targets))
    }

    /// Rename every target after its composition, e.g. `H20.00Na25.00-mgml`.
    ///
    /// Each session component contributes its abbreviation (from `name_map`,
    /// else its first `n_letters` characters) followed by its concentration in
    /// mg/ml with two decimals. Components absent from a target read as 0.
    pub fn make_target_names(
        &mut self,
        n_letters: usize,
        name_map: &BTreeMap<String, String>,
    ) -> BalanceResult<()> {
        let components = self.component_names();
        for target in &mut self.targets {
            let mut name = String::new();
            for component in &components {
                let abbrev = name_map
                    .get(component)
                    .cloned()
                    .unwrap_or_else(|| component.chars().take(n_letters).collect());
                let concentration = if target.contains(component) {
                    in_mg_per_ml(target.concentration(component)?)
                } else {
                    0.0
                };
                name.push_str(&format!("{abbrev}{concentration:.2}"));
            }
            target.set_name(format!("{name}-mgml"));
        }
        Ok(())
    }

    /// Balance every target on the calling thread, in target order.
    ///
    /// Each target gets its own entry: `Ok(None)` when infeasible, `Err` when
    /// that target cannot be evaluated (for example a component with no
    /// mass). One bad target never discards the others. Stock problems (for
    /// example a missing location) fail the whole batch before any target is
    /// solved.
    pub fn solve_all(&self) -> BalanceResult<Vec<TargetOutcome>> {
        validate_stocks(self.stocks())?;
        tracing::debug!(
            stocks = self.stocks().len(),
            targets = self.targets.len(),
            "balancing targets"
        );

        let outcomes = self
            .targets
            .iter()
            .map(|target| self.solve_one(target))
            .collect::<Vec<_>>();
        log_summary(&outcomes);
        Ok(outcomes)
    }

    /// [`Self::solve_all`] with targets spread over the rayon thread pool.
    ///
    /// Results come back in target order and match the sequential run, but
    /// solver log events are emitted from pool threads.
    pub fn solve_all_parallel(&self) -> BalanceResult<Vec<TargetOutcome>> {
        validate_stocks(self.stocks())?;
        tracing::debug!(
            stocks = self.stocks().len(),
            targets = self.targets.len(),
            "balancing targets in parallel"
        );

        let outcomes = self
            .targets
            .par_iter()
            .map(|target| self.solve_one(target))
            .collect::<Vec<_>>();
        log_summary(&outcomes);
        Ok(outcomes)
    }

    fn solve_one(&self, target: &Mixture) -> TargetOutcome {
        let outcome = self.solver.solve(target);
        if let Err(err) = &outcome {
            tracing::warn!(target = %target.name(), error = %err, "target could not be balanced");
        }
        outcome
    }

    pub fn report(&self, outcomes: &[TargetOutcome]) -> BalanceReport {
        BalanceReport::from_outcomes(outcomes)
    }
}

fn log_summary(outcomes: &[TargetOutcome]) {
    let feasible = outcomes.iter().filter(|o| matches!(o, Ok(Some(_)))).count();
    let failed = outcomes.iter().filter(|o| o.is_err()).count();
    tracing::debug!(feasible, failed, total = outcomes.len(), "balance finished");
}
