use mb_core::Amount;
use mb_core::units::{g, in_g, in_mg_per_ml, in_ml, in_ul, ml, ul};
use mb_mixture::{ComponentRecord, ComponentRegistry, MixError, Mixture, MixtureSpec};

fn registry() -> ComponentRegistry {
    ComponentRegistry::from_records([
        ComponentRecord::new("H2O").density("1.0 g/ml").formula("H2O"),
        ComponentRecord::new("Hexanes")
            .density("0.661 g/ml")
            .formula("C6H14"),
        ComponentRecord::new("NaCl")
            .formula("NaCl")
            .molar_mass("58.44 g/mol"),
    ])
    .unwrap()
}

fn brine(reg: &ComponentRegistry) -> Mixture {
    MixtureSpec::new("Brine")
        .location("1A1")
        .volume("H2O", "10 ml")
        .concentration("NaCl", "100 mg/ml")
        .solute("NaCl")
        .build(reg)
        .unwrap()
}

#[test]
fn dilution_by_combining_measured_portions() {
    let reg = registry();
    let stock = brine(&reg);
    let water = MixtureSpec::new("Water")
        .location("1A2")
        .volume("H2O", "50 ml")
        .build(&reg)
        .unwrap();

    let concentrate = stock.measure_out(Amount::Volume(ml(2.5))).unwrap();
    let diluent = water.measure_out(Amount::Volume(ml(7.5))).unwrap();
    let diluted = (&concentrate + &diluent).unwrap();

    assert!((in_ml(diluted.volume()) - 10.0).abs() < 1e-9);
    assert!((in_mg_per_ml(diluted.concentration("NaCl").unwrap()) - 25.0).abs() < 1e-9);
}

#[test]
fn depleting_stock_tracks_remaining_volume() {
    let reg = registry();
    let mut stock = brine(&reg);

    let first = stock.measure_out_depleting(Amount::Volume(ul(400.0))).unwrap();
    assert!((in_ul(first.volume()) - 400.0).abs() < 1e-6);
    assert!((in_ml(stock.volume()) - 9.6).abs() < 1e-9);

    // Concentration of what is left is unchanged.
    assert!((in_mg_per_ml(stock.concentration("NaCl").unwrap()) - 100.0).abs() < 1e-9);

    let too_much = stock.measure_out_depleting(Amount::Mass(g(50.0)));
    assert!(matches!(too_much, Err(MixError::InsufficientQuantity { .. })));
}

#[test]
fn molar_views_use_registry_molar_mass() {
    let reg = registry();
    let mut stock = brine(&reg);
    let molarity = stock.molarity("NaCl").unwrap();
    // 1 g NaCl in 10 ml
    assert!((mb_core::units::in_molar(molarity) - 1.0 / 58.44 / 0.010).abs() < 1e-9);

    stock.set_molarities(&[("NaCl", mb_core::units::molar(1.0))]).unwrap();
    assert!((in_g(stock.mass_of("NaCl").unwrap()) - 0.5844).abs() < 1e-9);
}

#[test]
fn solvent_blend_fractions() {
    let reg = registry();
    let blend = MixtureSpec::new("Blend")
        .mass_fraction("Hexanes", 0.25)
        .remainder("H2O")
        .total_mass("2 g")
        .build(&reg)
        .unwrap();

    let fractions = blend.mass_fractions().unwrap();
    let names: Vec<_> = fractions.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["H2O", "Hexanes"]);
    assert!((blend.mass_fraction("Hexanes").unwrap() - 0.25).abs() < 1e-12);

    let volume_fractions = blend.volume_fractions().unwrap();
    let total: f64 = volume_fractions.iter().map(|(_, f)| f).sum();
    assert!((total - 1.0).abs() < 1e-12);
    assert!((blend.solvent_density().unwrap().value - blend.mass().value / blend.volume().value).abs() < 1e-9);
}
