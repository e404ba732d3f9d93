//! Targets whose least-squares optimum falls below the minimum transfer.

use mb_balance::BalanceSolver;
use mb_core::Amount;
use mb_core::units::{g, g_per_ml, in_g, mg, ul};
use mb_mixture::{Component, Mixture};

fn stocks() -> Vec<Mixture> {
    let mut water = Mixture::at("Water", "1A1");
    water.insert(Component::solvent("H2O", g_per_ml(1.0)).with_mass(g(50.0)));

    let mut brine = Mixture::at("Brine", "1A2");
    brine.insert(Component::solvent("H2O", g_per_ml(1.0)).with_mass(g(10.0)));
    brine.insert(Component::solute("NaCl").with_mass(g(1.0)));

    vec![water, brine]
}

fn water_target(grams: f64) -> Mixture {
    let mut target = Mixture::at("Water target", "2A1");
    target.insert(Component::solvent("H2O", g_per_ml(1.0)).with_mass(g(grams)));
    target
}

#[test]
fn boundary_amount_wins_when_it_is_more_accurate() {
    // Pure water wanted: the optimum would take nothing from the brine, but
    // 20 ul of it must be drawn. The extra water it carries is exactly made
    // up by drawing less from the water stock.
    let solver = BalanceSolver::new(stocks())
        .with_minimum_transfer(Amount::Volume(ul(20.0)))
        .with_tolerance(0.05);
    let target = water_target(1.0);

    let candidates = solver.candidates(&target).unwrap();
    assert_eq!(candidates.len(), 2, "base plus one alternate for the pinned brine");
    assert_eq!(candidates[0].zeroed, None);
    assert_eq!(candidates[1].zeroed, Some(1));
    assert!(candidates.iter().all(|c| c.feasible));
    assert!(candidates[0].error_sum() < candidates[1].error_sum());

    let result = solver.solve(&target).unwrap().unwrap();
    assert_eq!(result.protocol().len(), 2);
    assert!((in_g(result.transfers[0].1) - 0.98).abs() < 1e-9);
    assert!((in_g(result.transfers[1].1) - 0.022).abs() < 1e-9);
    // Salt from the boundary draw is carried along but not scored.
    assert!(result.balanced.contains("NaCl"));
    assert!(!result.errors.contains_key("NaCl"));
}

#[test]
fn zero_that_stock_alternate_wins_when_boundary_overshoots() {
    // 19 mg of water wanted with a 20 mg minimum: drawing the minimum from
    // both stocks doubles the water, so only a single-stock alternate fits.
    let solver = BalanceSolver::new(stocks())
        .with_minimum_transfer(Amount::Mass(mg(20.0)))
        .with_tolerance(0.05);
    let target = water_target(0.019);

    let candidates = solver.candidates(&target).unwrap();
    assert_eq!(candidates.len(), 3);
    assert!(!candidates[0].feasible);

    // Dropping the water stock leaves 18.18 mg of water from the brine.
    assert_eq!(candidates[1].zeroed, Some(0));
    assert!((candidates[1].errors["H2O"] - 0.043_062).abs() < 1e-5);
    assert!(candidates[1].feasible);

    // Dropping the brine leaves exactly 20 mg of water: 5.3 % off.
    assert_eq!(candidates[2].zeroed, Some(1));
    assert!((candidates[2].errors["H2O"] - 0.052_632).abs() < 1e-5);
    assert!(!candidates[2].feasible);

    let result = solver.solve(&target).unwrap().unwrap();
    assert_eq!(result.protocol().len(), 1);
    assert_eq!(result.protocol()[0].source(), "1A2");
    assert_eq!(result.transfers.len(), 1);
    assert_eq!(result.transfers[0].0, "Brine");
}

#[test]
fn looser_tolerance_admits_both_alternates_and_keeps_the_better() {
    let solver = BalanceSolver::new(stocks())
        .with_minimum_transfer(Amount::Mass(mg(20.0)))
        .with_tolerance(0.06);
    let result = solver.solve(&water_target(0.019)).unwrap().unwrap();
    assert_eq!(result.transfers[0].0, "Brine");
}

#[test]
fn no_candidate_within_tolerance_is_none() {
    let solver = BalanceSolver::new(stocks())
        .with_minimum_transfer(Amount::Mass(mg(20.0)))
        .with_tolerance(0.01);
    assert!(solver.solve(&water_target(0.019)).unwrap().is_none());
}
