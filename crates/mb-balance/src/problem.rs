//! Problem assembly: component universe, mass-fraction matrix and bounds.
//!
//! All masses in the linear system are in grams.

use crate::error::{BalanceError, BalanceResult};
use mb_core::quantity::Amount;
use mb_core::units::in_g;
use mb_mixture::Mixture;
use nalgebra::{DMatrix, DVector};

/// Linear system for balancing one target against a stock set.
///
/// Rows are components, columns are stocks.
#[derive(Debug, Clone)]
pub struct BalanceProblem<'a> {
    /// Stocks in input order (one column each)
    pub stocks: &'a [Mixture],

    /// Component universe in first-seen order (one row each)
    pub components: Vec<String>,

    /// `A[i][j]` = mass fraction of component `i` in stock `j`
    pub mass_fractions: DMatrix<f64>,

    /// Target mass of every component, grams
    pub target_masses: DVector<f64>,

    /// Mass of the minimum transfer measured out of each stock, grams
    pub lower_bounds: DVector<f64>,
}

impl<'a> BalanceProblem<'a> {
    /// Assemble the system for `target`.
    pub fn new(
        stocks: &'a [Mixture],
        target: &Mixture,
        minimum_transfer: Amount,
    ) -> BalanceResult<Self> {
        validate_stocks(stocks)?;

        let components = component_universe(stocks.iter().chain(std::iter::once(target)));
        let mass_fractions = fraction_matrix(stocks, &components)?;
        let target_masses = mass_vector(target, &components)?;
        let lower_bounds = DVector::from_vec(
            stocks
                .iter()
                .map(|stock| Ok(in_g(stock.measure_out(minimum_transfer)?.mass())))
                .collect::<BalanceResult<Vec<_>>>()?,
        );

        Ok(Self {
            stocks,
            components,
            mass_fractions,
            target_masses,
            lower_bounds,
        })
    }

    pub fn n_components(&self) -> usize {
        self.components.len()
    }

    pub fn n_stocks(&self) -> usize {
        self.stocks.len()
    }

    /// Row index of a component.
    pub fn component_index(&self, name: &str) -> Option<usize> {
        self.components.iter().position(|c| c == name)
    }
}

/// Ordered, de-duplicated union of component names.
pub fn component_universe<'m>(mixtures: impl IntoIterator<Item = &'m Mixture>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for mixture in mixtures {
        for name in mixture.component_names() {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

/// Mass of each named component in grams, zero when absent.
pub fn mass_vector(mixture: &Mixture, components: &[String]) -> BalanceResult<DVector<f64>> {
    let masses = components
        .iter()
        .map(|name| match mixture.get(name) {
            Some(component) => Ok(in_g(component.mass()?)),
            None => Ok(0.0),
        })
        .collect::<BalanceResult<Vec<_>>>()?;
    Ok(DVector::from_vec(masses))
}

/// Every stock needs a location for the protocol, and there must be at least one.
pub fn validate_stocks(stocks: &[Mixture]) -> BalanceResult<()> {
    if stocks.is_empty() {
        return Err(BalanceError::InvalidConfig {
            what: "no stocks to balance against".to_string(),
        });
    }
    for stock in stocks {
        if stock.location().is_none_or(|l| l.trim().is_empty()) {
            return Err(BalanceError::MissingLocation {
                stock: stock.name().to_string(),
            });
        }
    }
    Ok(())
}

fn fraction_matrix(stocks: &[Mixture], components: &[String]) -> BalanceResult<DMatrix<f64>> {
    let mut matrix = DMatrix::zeros(components.len(), stocks.len());
    for (j, stock) in stocks.iter().enumerate() {
        for (i, name) in components.iter().enumerate() {
            if stock.contains(name) {
                matrix[(i, j)] = stock.mass_fraction(name)?;
            }
        }
    }
    Ok(matrix)
}
