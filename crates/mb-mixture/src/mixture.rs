//! Mixtures: named collections of components with derived aggregate views.
//!
//! Every view comes as a getter/setter pair. Setting a fraction-like view
//! redistributes mass among the listed components only; setting the total
//! mass or volume rescales every massed component so all fractions hold.

use std::fmt;
use std::ops::Add;

use mb_core::numeric::{Tolerances, ensure_non_negative, nearly_equal};
use mb_core::quantity::Amount;
use mb_core::units::{
    Concentration, Density, Mass, Molarity, Volume, in_g, in_ml, kg, kg_per_m3, m3, mol_per_m3,
};

use crate::component::Component;
use crate::error::{MixError, MixResult};
use crate::registry::ComponentRegistry;
use crate::transfer::TransferAction;

/// Allowed deviation of explicit fractions from 1.0 when no remainder is given.
pub const FRACTION_SUM_TOLERANCE: f64 = 1e-6;

/// A requested fraction: an explicit value or "whatever is left".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fraction {
    Value(f64),
    Remainder,
}

impl From<f64> for Fraction {
    fn from(value: f64) -> Self {
        Fraction::Value(value)
    }
}

/// A named collection of components.
///
/// Component names are unique and keep insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mixture {
    name: String,
    location: Option<String>,
    components: Vec<Component>,
    protocol: Vec<TransferAction>,
}

impl Mixture {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A mixture sitting at a deck location.
    pub fn at(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: Some(location.into()),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn set_location(&mut self, location: Option<String>) {
        self.location = location;
    }

    // ---- membership -----------------------------------------------------

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Component> {
        self.components.iter_mut().find(|c| c.name() == name)
    }

    pub fn component(&self, name: &str) -> MixResult<&Component> {
        self.get(name).ok_or_else(|| unknown(name))
    }

    pub fn component_mut(&mut self, name: &str) -> MixResult<&mut Component> {
        self.get_mut(name).ok_or_else(|| unknown(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.components.iter()
    }

    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(Component::name)
    }

    pub fn solutes(&self) -> impl Iterator<Item = &Component> {
        self.components.iter().filter(|c| c.is_solute())
    }

    pub fn solvents(&self) -> impl Iterator<Item = &Component> {
        self.components.iter().filter(|c| c.is_solvent())
    }

    /// Insert a component, replacing any existing one with the same name in place.
    pub fn insert(&mut self, component: Component) {
        match self.get_mut(component.name()) {
            Some(existing) => *existing = component,
            None => self.components.push(component),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Component> {
        let idx = self.components.iter().position(|c| c.name() == name)?;
        Some(self.components.remove(idx))
    }

    /// Add a zero-state component looked up in `registry`. No-op if already present.
    pub fn add_component(
        &mut self,
        name: &str,
        registry: &ComponentRegistry,
        solute: bool,
    ) -> MixResult<()> {
        if self.contains(name) {
            return Ok(());
        }
        let component = registry.instantiate(name, solute)?;
        self.components.push(component);
        Ok(())
    }

    pub fn rename_component(&mut self, old: &str, new: &str) -> MixResult<()> {
        if old != new && self.contains(new) {
            return Err(MixError::DuplicateComponent {
                name: new.to_string(),
            });
        }
        let component = self.component_mut(old)?;
        *component = component.renamed(new);
        Ok(())
    }

    // ---- protocol -------------------------------------------------------

    pub fn protocol(&self) -> &[TransferAction] {
        &self.protocol
    }

    pub fn push_transfer(&mut self, action: TransferAction) {
        self.protocol.push(action);
    }

    pub fn clear_protocol(&mut self) {
        self.protocol.clear();
    }

    // ---- totals ---------------------------------------------------------

    /// Sum of the masses of every component that has one.
    pub fn mass(&self) -> Mass {
        kg(self
            .components
            .iter()
            .filter_map(|c| c.mass().ok())
            .map(|m| m.value)
            .sum())
    }

    pub fn mass_of(&self, name: &str) -> MixResult<Mass> {
        self.component(name)?.mass()
    }

    /// Rescale every massed component so the total is `mass`.
    pub fn set_mass(&mut self, mass: Mass) -> MixResult<()> {
        ensure_non_negative(mass.value, "mixture mass")?;
        let current = self.mass().value;
        if current <= 0.0 {
            return Err(self.empty("mass"));
        }
        self.scale(mass.value / current);
        Ok(())
    }

    pub fn with_mass(&self, mass: Mass) -> MixResult<Self> {
        let mut mixture = self.clone();
        mixture.set_mass(mass)?;
        Ok(mixture)
    }

    /// Sum of the solvent volumes. Solutes never contribute.
    pub fn volume(&self) -> Volume {
        self.solvent_volume()
    }

    /// Rescale every component so the solvent volume is `volume`.
    pub fn set_volume(&mut self, volume: Volume) -> MixResult<()> {
        ensure_non_negative(volume.value, "mixture volume")?;
        let current = self.nonzero_volume()?;
        self.scale(volume.value / current.value);
        Ok(())
    }

    pub fn with_volume(&self, volume: Volume) -> MixResult<Self> {
        let mut mixture = self.clone();
        mixture.set_volume(volume)?;
        Ok(mixture)
    }

    pub fn solvent_mass(&self) -> Mass {
        kg(self
            .solvents()
            .filter_map(|c| c.mass().ok())
            .map(|m| m.value)
            .sum())
    }

    pub fn solvent_volume(&self) -> Volume {
        m3(self
            .solvents()
            .filter_map(|c| c.volume().ok())
            .map(|v| v.value)
            .sum())
    }

    /// Solvent mass over solvent volume.
    pub fn solvent_density(&self) -> MixResult<Density> {
        let volume = self.nonzero_volume()?;
        Ok(kg_per_m3(self.solvent_mass().value / volume.value))
    }

    fn scale(&mut self, factor: f64) {
        for component in &mut self.components {
            component.scale(factor);
        }
    }

    fn nonzero_volume(&self) -> MixResult<Volume> {
        if self.solvents().next().is_none() {
            return Err(MixError::NoSolvent {
                mixture: self.name.clone(),
            });
        }
        let volume = self.solvent_volume();
        if volume.value <= 0.0 {
            return Err(self.empty("volume"));
        }
        Ok(volume)
    }

    // ---- mass fractions -------------------------------------------------

    pub fn mass_fractions(&self) -> MixResult<Vec<(String, f64)>> {
        let total = self.mass().value;
        if total <= 0.0 {
            return Err(self.empty("mass"));
        }
        self.components
            .iter()
            .map(|c| Ok((c.name().to_string(), c.mass()?.value / total)))
            .collect()
    }

    pub fn mass_fraction(&self, name: &str) -> MixResult<f64> {
        let component = self.component(name)?;
        let total = self.mass().value;
        if total <= 0.0 {
            return Err(self.empty("mass"));
        }
        Ok(component.mass()?.value / total)
    }

    /// Redistribute the listed components' combined mass by fraction.
    pub fn set_mass_fractions<S: AsRef<str>>(
        &mut self,
        fractions: &[(S, Fraction)],
    ) -> MixResult<()> {
        let resolved = resolve_fractions(fractions)?;

        let mut listed = 0.0;
        for (name, _) in &resolved {
            listed += self.mass_of(name)?.value;
        }
        if listed <= 0.0 {
            return Err(self.empty("mass"));
        }

        for (name, fraction) in resolved {
            self.component_mut(&name)?.set_mass(kg(fraction * listed));
        }
        Ok(())
    }

    // ---- volume fractions -----------------------------------------------

    pub fn volume_fractions(&self) -> MixResult<Vec<(String, f64)>> {
        let total = self.nonzero_volume()?.value;
        self.solvents()
            .map(|c| Ok((c.name().to_string(), c.volume()?.value / total)))
            .collect()
    }

    pub fn volume_fraction(&self, name: &str) -> MixResult<f64> {
        let component = self.solvent(name)?;
        let total = self.nonzero_volume()?.value;
        Ok(component.volume()?.value / total)
    }

    /// Redistribute the listed solvents' combined volume by fraction.
    pub fn set_volume_fractions<S: AsRef<str>>(
        &mut self,
        fractions: &[(S, Fraction)],
    ) -> MixResult<()> {
        let resolved = resolve_fractions(fractions)?;

        let mut listed = 0.0;
        for (name, _) in &resolved {
            listed += self.solvent(name)?.volume()?.value;
        }
        if listed <= 0.0 {
            return Err(self.empty("volume"));
        }

        for (name, fraction) in resolved {
            self.component_mut(&name)?.set_volume(m3(fraction * listed))?;
        }
        Ok(())
    }

    fn solvent(&self, name: &str) -> MixResult<&Component> {
        let component = self.component(name)?;
        if !component.is_solvent() {
            return Err(MixError::NotSolvent {
                component: name.to_string(),
            });
        }
        Ok(component)
    }

    // ---- concentrations -------------------------------------------------

    /// Mass per solvent volume for every component.
    pub fn concentrations(&self) -> MixResult<Vec<(String, Concentration)>> {
        let volume = self.nonzero_volume()?.value;
        self.components
            .iter()
            .map(|c| Ok((c.name().to_string(), kg_per_m3(c.mass()?.value / volume))))
            .collect()
    }

    pub fn concentration(&self, name: &str) -> MixResult<Concentration> {
        let component = self.component(name)?;
        let volume = self.nonzero_volume()?.value;
        Ok(kg_per_m3(component.mass()?.value / volume))
    }

    /// Set each listed component's mass to concentration × current volume.
    pub fn set_concentrations<S: AsRef<str>>(
        &mut self,
        concentrations: &[(S, Concentration)],
    ) -> MixResult<()> {
        let volume = self.nonzero_volume()?.value;
        for (name, concentration) in concentrations {
            let name = name.as_ref();
            ensure_non_negative(concentration.value, "concentration")?;
            self.component_mut(name)?
                .set_mass(kg(concentration.value * volume));
        }
        Ok(())
    }

    // ---- molarities -----------------------------------------------------

    /// Molarity of every component with a known molar mass.
    pub fn molarities(&self) -> MixResult<Vec<(String, Molarity)>> {
        let volume = self.nonzero_volume()?.value;
        self.components
            .iter()
            .filter(|c| c.has_molar_mass())
            .map(|c| Ok((c.name().to_string(), mol_per_m3(c.moles()? / volume))))
            .collect()
    }

    pub fn molarity(&self, name: &str) -> MixResult<Molarity> {
        let moles = self.component(name)?.moles()?;
        let volume = self.nonzero_volume()?.value;
        Ok(mol_per_m3(moles / volume))
    }

    pub fn set_molarities<S: AsRef<str>>(&mut self, molarities: &[(S, Molarity)]) -> MixResult<()> {
        let volume = self.nonzero_volume()?.value;
        for (name, molarity) in molarities {
            let name = name.as_ref();
            ensure_non_negative(molarity.value, "molarity")?;
            let component = self.component_mut(name)?;
            let molar_mass = component
                .molar_mass()
                .ok_or_else(|| MixError::MissingMolarMass {
                    component: name.to_string(),
                })?;
            component.set_mass(kg(molarity.value * molar_mass.value * volume));
        }
        Ok(())
    }

    // ---- molalities -----------------------------------------------------

    /// Mass of each solute per kilogram of solvent (kg/kg).
    pub fn molalities(&self) -> MixResult<Vec<(String, f64)>> {
        let solvent = self.nonzero_solvent_mass()?;
        self.solutes()
            .map(|c| Ok((c.name().to_string(), c.mass()?.value / solvent)))
            .collect()
    }

    pub fn molality(&self, name: &str) -> MixResult<f64> {
        let component = self.component(name)?;
        let solvent = self.nonzero_solvent_mass()?;
        Ok(component.mass()?.value / solvent)
    }

    /// Set each listed component's mass relative to the current solvent mass.
    pub fn set_molalities<S: AsRef<str>>(&mut self, molalities: &[(S, f64)]) -> MixResult<()> {
        let solvent = self.nonzero_solvent_mass()?;
        for (name, molality) in molalities {
            ensure_non_negative(*molality, "molality")?;
            self.component_mut(name.as_ref())?
                .set_mass(kg(molality * solvent));
        }
        Ok(())
    }

    fn nonzero_solvent_mass(&self) -> MixResult<f64> {
        if self.solvents().next().is_none() {
            return Err(MixError::NoSolvent {
                mixture: self.name.clone(),
            });
        }
        let solvent = self.solvent_mass().value;
        if solvent <= 0.0 {
            return Err(self.empty("solvent mass"));
        }
        Ok(solvent)
    }

    // ---- sampling and combination ---------------------------------------

    /// A copy with identical fractions scaled to `amount`.
    pub fn measure_out(&self, amount: Amount) -> MixResult<Mixture> {
        let mut portion = self.clone();
        match amount {
            Amount::Mass(mass) => portion.set_mass(mass)?,
            Amount::Volume(volume) => portion.set_volume(volume)?,
        }
        Ok(portion)
    }

    /// Measure out `amount` and remove the same mass from `self`.
    pub fn measure_out_depleting(&mut self, amount: Amount) -> MixResult<Mixture> {
        let portion = self.measure_out(amount)?;
        let taken = portion.mass().value;
        let available = self.mass().value;
        if taken > available && !nearly_equal(taken, available, Tolerances::default()) {
            return Err(MixError::InsufficientQuantity {
                requested_g: in_g(portion.mass()),
                available_g: in_g(self.mass()),
            });
        }
        self.scale((available - taken).max(0.0) / available);
        Ok(portion)
    }

    /// Union of both mixtures; shared components have their masses summed.
    ///
    /// The right operand's protocol is discarded.
    pub fn combine(&self, other: &Mixture) -> MixResult<Mixture> {
        let mut mixture = self.clone();
        mixture.name = format!("{} + {}", self.name, other.name);
        for component in &other.components {
            match mixture.get_mut(component.name()) {
                Some(existing) => *existing = existing.add(component)?,
                None => mixture.components.push(component.clone()),
            }
        }
        Ok(mixture)
    }

    /// Same total mass and volume and the same component masses within `tol`.
    pub fn approx_eq(&self, other: &Mixture, tol: Tolerances) -> bool {
        if self.len() != other.len() {
            return false;
        }
        if !nearly_equal(self.mass().value, other.mass().value, tol)
            || !nearly_equal(self.volume().value, other.volume().value, tol)
        {
            return false;
        }
        self.components.iter().all(|c| match other.get(c.name()) {
            Some(o) => match (c.mass(), o.mass()) {
                (Ok(a), Ok(b)) => nearly_equal(a.value, b.value, tol),
                (Err(_), Err(_)) => true,
                _ => false,
            },
            None => false,
        })
    }

    fn empty(&self, what: &'static str) -> MixError {
        MixError::EmptyMixture {
            mixture: self.name.clone(),
            what,
        }
    }
}

impl Add for &Mixture {
    type Output = MixResult<Mixture>;

    fn add(self, rhs: &Mixture) -> Self::Output {
        self.combine(rhs)
    }
}

impl fmt::Display for Mixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Mixture name:\"{}\" size:{} M={:4.3} g V={:4.3} ml>",
            self.name,
            self.len(),
            in_g(self.mass()),
            in_ml(self.volume())
        )
    }
}

fn unknown(name: &str) -> MixError {
    MixError::UnknownComponent {
        name: name.to_string(),
    }
}

/// Replace a remainder entry with `1 - sum(explicit)` and check the total.
fn resolve_fractions<S: AsRef<str>>(fractions: &[(S, Fraction)]) -> MixResult<Vec<(String, f64)>> {
    let remainders = fractions
        .iter()
        .filter(|(_, f)| matches!(f, Fraction::Remainder))
        .count();
    if remainders > 1 {
        return Err(MixError::TooManyRemainders);
    }

    let mut sum = 0.0;
    for (_, fraction) in fractions {
        if let Fraction::Value(value) = fraction {
            sum += ensure_non_negative(*value, "fraction")?;
        }
    }

    let remainder = if remainders == 1 {
        if sum >= 1.0 {
            return Err(MixError::FractionOverflow { sum });
        }
        1.0 - sum
    } else {
        if sum > 1.0 + FRACTION_SUM_TOLERANCE {
            return Err(MixError::FractionOverflow { sum });
        }
        if sum < 1.0 - FRACTION_SUM_TOLERANCE {
            return Err(MixError::FractionSum { sum });
        }
        0.0
    };

    Ok(fractions
        .iter()
        .map(|(name, fraction)| {
            let value = match fraction {
                Fraction::Value(value) => *value,
                Fraction::Remainder => remainder,
            };
            (name.as_ref().to_string(), value)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mb_core::units::{
        g, g_per_ml, g_per_mol, in_g, in_mg_per_ml, in_ml, in_molar, mg_per_ml, ml, molar,
    };

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    fn brine() -> Mixture {
        let mut m = Mixture::at("Brine", "1A1");
        m.insert(Component::solvent("H2O", g_per_ml(1.0)).with_mass(g(10.0)));
        m.insert(Component::solute("NaCl").with_mass(g(1.0)));
        m
    }

    fn solvents() -> Mixture {
        let mut m = Mixture::new("Solvents");
        m.insert(Component::solvent("H2O", g_per_ml(1.0)).with_mass(g(5.0)));
        m.insert(Component::solvent("Hexanes", g_per_ml(0.661)).with_mass(g(3.305)));
        m
    }

    #[test]
    fn totals_ignore_solutes_for_volume() {
        let m = brine();
        assert!(close(in_g(m.mass()), 11.0));
        assert!(close(in_ml(m.volume()), 10.0));
        assert_eq!(m.solutes().count(), 1);
        assert_eq!(m.solvents().count(), 1);
    }

    #[test]
    fn declared_volume_counts_as_solvent_volume() {
        let mut m = brine();
        m.insert(Component::new("Oil", None, false).with_declared_volume(ml(2.0)));
        assert_eq!(m.solvents().count(), 2);
        assert!(close(in_ml(m.volume()), 12.0));
        assert!(close(in_g(m.mass()), 11.0));
    }

    #[test]
    fn set_mass_preserves_fractions() {
        let mut m = brine();
        let before = m.mass_fraction("NaCl").unwrap();
        m.set_mass(g(2.2)).unwrap();
        assert!(close(in_g(m.mass()), 2.2));
        assert!(close(m.mass_fraction("NaCl").unwrap(), before));
    }

    #[test]
    fn set_volume_scales_whole_mixture() {
        let mut m = brine();
        m.set_volume(ml(5.0)).unwrap();
        assert!(close(in_ml(m.volume()), 5.0));
        assert!(close(in_g(m.mass_of("NaCl").unwrap()), 0.5));
    }

    #[test]
    fn set_volume_without_solvent_fails() {
        let mut m = Mixture::new("Salt");
        m.insert(Component::solute("NaCl").with_mass(g(1.0)));
        assert!(matches!(
            m.set_volume(ml(1.0)),
            Err(MixError::NoSolvent { .. })
        ));
    }

    #[test]
    fn mass_fraction_of_empty_mixture_fails() {
        let mut m = Mixture::new("Empty");
        m.insert(Component::solvent("H2O", g_per_ml(1.0)).with_mass(g(0.0)));
        assert!(matches!(
            m.mass_fraction("H2O"),
            Err(MixError::EmptyMixture { what: "mass", .. })
        ));
    }

    #[test]
    fn mass_fractions_with_remainder() {
        let mut m = solvents();
        m.set_mass_fractions(&[("H2O", Fraction::Value(0.25)), ("Hexanes", Fraction::Remainder)])
            .unwrap();
        assert!(close(m.mass_fraction("H2O").unwrap(), 0.25));
        assert!(close(m.mass_fraction("Hexanes").unwrap(), 0.75));
        assert!(close(in_g(m.mass()), 8.305));
    }

    #[test]
    fn subset_fractions_leave_other_components_alone() {
        let mut m = solvents();
        m.insert(Component::solute("NaCl").with_mass(g(1.0)));
        m.set_mass_fractions(&[("H2O", 0.5.into()), ("Hexanes", 0.5.into())])
            .unwrap();
        assert!(close(in_g(m.mass_of("NaCl").unwrap()), 1.0));
        assert!(close(
            in_g(m.mass_of("H2O").unwrap()),
            in_g(m.mass_of("Hexanes").unwrap())
        ));
    }

    #[test]
    fn fraction_setter_errors() {
        let mut m = solvents();
        assert_eq!(
            m.set_mass_fractions(&[("H2O", Fraction::Remainder), ("Hexanes", Fraction::Remainder)]),
            Err(MixError::TooManyRemainders)
        );
        assert!(matches!(
            m.set_mass_fractions(&[("H2O", Fraction::Value(1.0)), ("Hexanes", Fraction::Remainder)]),
            Err(MixError::FractionOverflow { .. })
        ));
        assert!(matches!(
            m.set_mass_fractions(&[("H2O", 0.3.into()), ("Hexanes", 0.3.into())]),
            Err(MixError::FractionSum { .. })
        ));
        assert!(matches!(
            m.set_mass_fractions(&[("H2O", 0.7.into()), ("Hexanes", 0.4.into())]),
            Err(MixError::FractionOverflow { .. })
        ));
        assert!(matches!(
            m.set_mass_fractions(&[("H2O", 0.5.into()), ("D2O", 0.5.into())]),
            Err(MixError::UnknownComponent { .. })
        ));
    }

    #[test]
    fn volume_fractions_round_trip() {
        let mut m = solvents();
        m.set_volume_fractions(&[("H2O", Fraction::Value(0.2)), ("Hexanes", Fraction::Remainder)])
            .unwrap();
        assert!(close(m.volume_fraction("H2O").unwrap(), 0.2));
        assert!(close(in_ml(m.volume()), 10.0));
    }

    #[test]
    fn volume_fraction_of_solute_fails() {
        let m = brine();
        assert!(matches!(
            m.volume_fraction("NaCl"),
            Err(MixError::NotSolvent { .. })
        ));
    }

    #[test]
    fn concentrations_round_trip() {
        let mut m = brine();
        assert!(close(in_mg_per_ml(m.concentration("NaCl").unwrap()), 100.0));
        m.set_concentrations(&[("NaCl", mg_per_ml(25.0))]).unwrap();
        assert!(close(in_mg_per_ml(m.concentration("NaCl").unwrap()), 25.0));
        assert!(close(in_g(m.mass_of("NaCl").unwrap()), 0.25));
    }

    #[test]
    fn concentrations_need_a_solvent() {
        let mut m = Mixture::new("Salt");
        m.insert(Component::solute("NaCl").with_mass(g(1.0)));
        assert!(matches!(
            m.set_concentrations(&[("NaCl", mg_per_ml(1.0))]),
            Err(MixError::NoSolvent { .. })
        ));
    }

    #[test]
    fn molarity_round_trip() {
        let mut m = brine();
        m.insert(
            m.component("NaCl")
                .unwrap()
                .with_molar_mass(g_per_mol(58.44)),
        );
        m.set_molarities(&[("NaCl", molar(0.5))]).unwrap();
        assert!(close(in_molar(m.molarity("NaCl").unwrap()), 0.5));
        assert!(close(in_g(m.mass_of("NaCl").unwrap()), 0.5 * 58.44 * 0.010));
        assert_eq!(m.molarities().unwrap().len(), 1);
    }

    #[test]
    fn molarity_without_molar_mass_fails() {
        let mut m = brine();
        assert!(matches!(
            m.set_molarities(&[("NaCl", molar(0.5))]),
            Err(MixError::MissingMolarMass { .. })
        ));
    }

    #[test]
    fn molality_is_mass_per_solvent_mass() {
        let mut m = brine();
        assert!(close(m.molality("NaCl").unwrap(), 0.1));
        m.set_molalities(&[("NaCl", 0.05)]).unwrap();
        assert!(close(in_g(m.mass_of("NaCl").unwrap()), 0.5));
        assert_eq!(m.molalities().unwrap().len(), 1);
    }

    #[test]
    fn measure_out_by_volume() {
        let m = brine();
        let portion = m.measure_out(Amount::Volume(ml(2.0))).unwrap();
        assert!(close(in_ml(portion.volume()), 2.0));
        assert!(close(in_g(portion.mass_of("NaCl").unwrap()), 0.2));
        assert!(close(in_g(m.mass()), 11.0));
    }

    #[test]
    fn measure_out_depleting_removes_mass() {
        let mut m = brine();
        let portion = m.measure_out_depleting(Amount::Mass(g(5.5))).unwrap();
        assert!(close(in_g(portion.mass()), 5.5));
        assert!(close(in_g(m.mass()), 5.5));
        assert!(matches!(
            m.measure_out_depleting(Amount::Mass(g(6.0))),
            Err(MixError::InsufficientQuantity { .. })
        ));
    }

    #[test]
    fn combine_sums_shared_components() {
        let a = brine();
        let b = solvents();
        let sum = (&a + &b).unwrap();
        assert_eq!(sum.name(), "Brine + Solvents");
        assert_eq!(
            sum.component_names().collect::<Vec<_>>(),
            vec!["H2O", "NaCl", "Hexanes"]
        );
        assert!(close(in_g(sum.mass_of("H2O").unwrap()), 15.0));
        assert!(close(in_g(sum.mass()), in_g(a.mass()) + in_g(b.mass())));
    }

    #[test]
    fn combine_keeps_left_protocol_only() {
        let mut a = brine();
        let mut b = solvents();
        a.push_transfer(TransferAction::new("1A1", None, ml(1.0)));
        b.push_transfer(TransferAction::new("1A2", None, ml(1.0)));
        let sum = a.combine(&b).unwrap();
        assert_eq!(sum.protocol().len(), 1);
        assert_eq!(sum.protocol()[0].source(), "1A1");
    }

    #[test]
    fn rename_and_remove() {
        let mut m = brine();
        m.rename_component("NaCl", "KCl").unwrap();
        assert!(m.contains("KCl"));
        assert!(matches!(
            m.rename_component("KCl", "H2O"),
            Err(MixError::DuplicateComponent { .. })
        ));
        assert!(m.remove("KCl").is_some());
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn approx_eq_compares_composition() {
        let a = brine();
        let b = brine().with_mass(g(11.0 + 1e-12)).unwrap();
        let c = brine().with_mass(g(12.0)).unwrap();
        assert!(a.approx_eq(&b, Tolerances::default()));
        assert!(!a.approx_eq(&c, Tolerances::default()));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use mb_core::units::{g, g_per_ml, ml};
    use proptest::prelude::*;

    fn mixture(water: f64, hexanes: f64, salt: f64) -> Mixture {
        let mut m = Mixture::new("P");
        m.insert(Component::solvent("H2O", g_per_ml(1.0)).with_mass(g(water)));
        m.insert(Component::solvent("Hexanes", g_per_ml(0.661)).with_mass(g(hexanes)));
        m.insert(Component::solute("NaCl").with_mass(g(salt)));
        m
    }

    proptest! {
        #[test]
        fn set_mass_preserves_every_fraction(
            water in 0.01f64..100.0,
            hexanes in 0.01f64..100.0,
            salt in 0.0f64..10.0,
            target in 0.001f64..1000.0,
        ) {
            let m = mixture(water, hexanes, salt);
            let scaled = m.with_mass(g(target)).unwrap();
            for (name, before) in m.mass_fractions().unwrap() {
                let after = scaled.mass_fraction(&name).unwrap();
                prop_assert!((before - after).abs() < 1e-9);
            }
        }

        #[test]
        fn set_volume_preserves_every_fraction(
            water in 0.01f64..100.0,
            hexanes in 0.01f64..100.0,
            salt in 0.0f64..10.0,
            target in 0.001f64..1000.0,
        ) {
            let m = mixture(water, hexanes, salt);
            let scaled = m.with_volume(ml(target)).unwrap();
            for (name, before) in m.mass_fractions().unwrap() {
                let after = scaled.mass_fraction(&name).unwrap();
                prop_assert!((before - after).abs() < 1e-9);
            }
        }

        #[test]
        fn measure_out_preserves_every_fraction(
            water in 0.01f64..100.0,
            hexanes in 0.01f64..100.0,
            salt in 0.0f64..10.0,
            share in 1e-6f64..=1.0,
        ) {
            let m = mixture(water, hexanes, salt);
            let amount = g(share * in_g(m.mass()));
            let portion = m.measure_out(Amount::Mass(amount)).unwrap();
            prop_assert!((portion.mass().value - amount.value).abs() <= 1e-12 * amount.value.max(1e-9));
            for (name, before) in m.mass_fractions().unwrap() {
                let after = portion.mass_fraction(&name).unwrap();
                prop_assert!((before - after).abs() < 1e-9);
            }
        }

        #[test]
        fn combination_is_additive(
            a in (0.01f64..50.0, 0.01f64..50.0, 0.0f64..5.0),
            b in (0.01f64..50.0, 0.01f64..50.0, 0.0f64..5.0),
        ) {
            let left = mixture(a.0, a.1, a.2);
            let right = mixture(b.0, b.1, b.2);
            let sum = (&left + &right).unwrap();
            let expected = left.mass().value + right.mass().value;
            prop_assert!((sum.mass().value - expected).abs() <= 1e-12 * expected.max(1.0));
            for name in ["H2O", "Hexanes", "NaCl"] {
                let want = left.mass_of(name).unwrap().value + right.mass_of(name).unwrap().value;
                prop_assert!((sum.mass_of(name).unwrap().value - want).abs() <= 1e-12 * want.max(1.0));
            }
        }

        #[test]
        fn fraction_setter_is_idempotent(
            water in 0.01f64..100.0,
            hexanes in 0.01f64..100.0,
            fraction in 0.0f64..0.99,
        ) {
            let mut m = mixture(water, hexanes, 1.0);
            let request = [("H2O", Fraction::Value(fraction)), ("Hexanes", Fraction::Remainder)];
            m.set_mass_fractions(&request).unwrap();
            let once = m.clone();
            let current = m
                .mass_fractions()
                .unwrap()
                .into_iter()
                .map(|(name, f)| (name, Fraction::Value(f)))
                .collect::<Vec<_>>();
            m.set_mass_fractions(&current).unwrap();
            let tol = Tolerances { abs: 1e-15, rel: 1e-9 };
            prop_assert!(m.approx_eq(&once, tol));
        }
    }
}
