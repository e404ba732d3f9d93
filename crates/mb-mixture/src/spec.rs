//! Declarative stock/target descriptions.
//!
//! A [`MixtureSpec`] names components and the quantities that pin them down,
//! with every value written as text (`"10 ml"`, `"25 mg/ml"`). [`MixtureSpec::build`]
//! resolves it against a [`ComponentRegistry`] into a concrete [`Mixture`].

use std::collections::BTreeMap;

use mb_core::numeric::{Tolerances, nearly_equal};
use mb_core::quantity::parse_quantity;
use mb_core::units::{Mass, Volume, in_g, in_mg_per_ml, in_ml, mg};
use serde::{Deserialize, Serialize};

use crate::error::{MixError, MixResult};
use crate::mixture::{Fraction, Mixture};
use crate::registry::ComponentRegistry;

const SANITY_TOL: Tolerances = Tolerances::new(1e-8, 1e-5);

/// A mass fraction as written in a spec: a number, a quantity string or `"remainder"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FractionDef {
    Number(f64),
    Text(String),
}

impl FractionDef {
    pub fn resolve(&self) -> MixResult<Fraction> {
        match self {
            FractionDef::Number(value) => Ok(Fraction::Value(*value)),
            FractionDef::Text(text) if text.trim().eq_ignore_ascii_case("remainder") => {
                Ok(Fraction::Remainder)
            }
            FractionDef::Text(text) => Ok(Fraction::Value(parse_quantity(text)?.as_fraction()?)),
        }
    }
}

/// Stock or target specification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixtureSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_mass: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_volume: Option<String>,
    pub masses: BTreeMap<String, String>,
    pub volumes: BTreeMap<String, String>,
    pub concentrations: BTreeMap<String, String>,
    pub mass_fractions: BTreeMap<String, FractionDef>,
    pub solutes: Vec<String>,
}

impl MixtureSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn mass(mut self, component: impl Into<String>, text: impl Into<String>) -> Self {
        self.masses.insert(component.into(), text.into());
        self
    }

    pub fn volume(mut self, component: impl Into<String>, text: impl Into<String>) -> Self {
        self.volumes.insert(component.into(), text.into());
        self
    }

    pub fn concentration(mut self, component: impl Into<String>, text: impl Into<String>) -> Self {
        self.concentrations.insert(component.into(), text.into());
        self
    }

    pub fn mass_fraction(mut self, component: impl Into<String>, value: f64) -> Self {
        self.mass_fractions
            .insert(component.into(), FractionDef::Number(value));
        self
    }

    pub fn remainder(mut self, component: impl Into<String>) -> Self {
        self.mass_fractions
            .insert(component.into(), FractionDef::Text("remainder".into()));
        self
    }

    pub fn solute(mut self, component: impl Into<String>) -> Self {
        let component = component.into();
        if !self.solutes.contains(&component) {
            self.solutes.push(component);
        }
        self
    }

    pub fn total_mass(mut self, text: impl Into<String>) -> Self {
        self.total_mass = Some(text.into());
        self
    }

    pub fn total_volume(mut self, text: impl Into<String>) -> Self {
        self.total_volume = Some(text.into());
        self
    }

    /// Resolve the spec into a mixture.
    ///
    /// Quantities are applied in a fixed order: masses, volumes, mass
    /// fractions, concentrations, then the totals. Later steps may disturb
    /// earlier ones; any such drift is reported by [`Self::sanity_check`] as
    /// a warning, never as an error.
    pub fn build(&self, registry: &ComponentRegistry) -> MixResult<Mixture> {
        let mut mixture = Mixture::new(self.name.clone());
        mixture.set_location(self.location.clone());

        let names = self
            .masses
            .keys()
            .chain(self.volumes.keys())
            .chain(self.concentrations.keys())
            .chain(self.mass_fractions.keys())
            .chain(self.solutes.iter());
        for name in names {
            mixture.add_component(name, registry, self.solutes.contains(name))?;
        }

        let total_mass = self.parsed_total_mass()?;
        let total_volume = self.parsed_total_volume()?;

        for (name, text) in &self.masses {
            let mass = parse_quantity(text)?.as_mass()?;
            mixture.component_mut(name)?.set_mass(mass);
        }

        for (name, text) in &self.volumes {
            let volume = parse_quantity(text)?.as_volume()?;
            mixture.component_mut(name)?.set_volume(volume)?;
        }

        if !self.mass_fractions.is_empty() {
            if total_mass.is_none() && mixture.mass().value <= 0.0 {
                return Err(MixError::EmptyMixture {
                    mixture: self.name.clone(),
                    what: "mass",
                });
            }
            for name in self.mass_fractions.keys() {
                mixture.component_mut(name)?.set_mass(mg(1.0));
            }
            if let Some(mass) = total_mass {
                mixture.set_mass(mass)?;
            }
            let fractions = self
                .mass_fractions
                .iter()
                .map(|(name, def)| Ok((name.as_str(), def.resolve()?)))
                .collect::<MixResult<Vec<_>>>()?;
            mixture.set_mass_fractions(&fractions)?;
        }

        if !self.concentrations.is_empty() {
            let concentrations = self
                .concentrations
                .iter()
                .map(|(name, text)| Ok((name.as_str(), parse_quantity(text)?.as_concentration()?)))
                .collect::<MixResult<Vec<_>>>()?;
            mixture.set_concentrations(&concentrations)?;
        }

        if let Some(mass) = total_mass {
            mixture.set_mass(mass)?;
        }
        if let Some(volume) = total_volume {
            mixture.set_volume(volume)?;
        }

        let mismatches = self.sanity_check(&mixture);
        if !mismatches.is_empty() {
            tracing::warn!(
                mixture = %self.name,
                "mixture does not match its specification:\n{}{}",
                mismatches.join("\n"),
                self.likely_reasons()
            );
        }

        Ok(mixture)
    }

    /// Compare every requested quantity with what `mixture` realizes.
    ///
    /// Returns one line per mismatch; an empty list means the spec is met.
    pub fn sanity_check(&self, mixture: &Mixture) -> Vec<String> {
        let mut mismatches = Vec::new();

        for (name, text) in &self.masses {
            let wanted = parse_quantity(text).and_then(|q| q.as_mass());
            if let (Ok(wanted), Ok(actual)) = (wanted, mixture.mass_of(name)) {
                if !nearly_equal(actual.value, wanted.value, SANITY_TOL) {
                    mismatches.push(format!(
                        "  mass of {name}: requested {text}, got {:.6} g",
                        in_g(actual)
                    ));
                }
            }
        }

        for (name, text) in &self.volumes {
            let wanted = parse_quantity(text).and_then(|q| q.as_volume());
            let actual = mixture.component(name).and_then(|c| c.volume());
            if let (Ok(wanted), Ok(actual)) = (wanted, actual) {
                if !nearly_equal(actual.value, wanted.value, SANITY_TOL) {
                    mismatches.push(format!(
                        "  volume of {name}: requested {text}, got {:.6} ml",
                        in_ml(actual)
                    ));
                }
            }
        }

        for (name, text) in &self.concentrations {
            let wanted = parse_quantity(text).and_then(|q| q.as_concentration());
            if let (Ok(wanted), Ok(actual)) = (wanted, mixture.concentration(name)) {
                if !nearly_equal(actual.value, wanted.value, SANITY_TOL) {
                    mismatches.push(format!(
                        "  concentration of {name}: requested {text}, got {:.6} mg/ml",
                        in_mg_per_ml(actual)
                    ));
                }
            }
        }

        for (name, def) in &self.mass_fractions {
            if let (Ok(Fraction::Value(wanted)), Ok(actual)) =
                (def.resolve(), mixture.mass_fraction(name))
            {
                if !nearly_equal(actual, wanted, SANITY_TOL) {
                    mismatches.push(format!(
                        "  mass fraction of {name}: requested {wanted}, got {actual:.6}"
                    ));
                }
            }
        }

        if let Ok(Some(wanted)) = self.parsed_total_mass() {
            if !nearly_equal(mixture.mass().value, wanted.value, SANITY_TOL) {
                mismatches.push(format!(
                    "  total mass: requested {}, got {:.6} g",
                    in_g(wanted),
                    in_g(mixture.mass())
                ));
            }
        }

        if let Ok(Some(wanted)) = self.parsed_total_volume() {
            if !nearly_equal(mixture.volume().value, wanted.value, SANITY_TOL) {
                mismatches.push(format!(
                    "  total volume: requested {}, got {:.6} ml",
                    in_ml(wanted),
                    in_ml(mixture.volume())
                ));
            }
        }

        mismatches
    }

    fn likely_reasons(&self) -> String {
        let mut reasons = Vec::new();
        let groups = [
            self.masses.len(),
            self.volumes.len(),
            self.concentrations.len(),
            self.mass_fractions.len(),
        ];
        if groups.iter().filter(|n| **n > 0).count() > 1 {
            reasons.push("  - several quantity groups were combined; later groups rescale earlier ones");
        }
        if self.total_mass.is_some() && self.total_volume.is_some() {
            reasons.push("  - both total_mass and total_volume were given; total_volume is applied last");
        }
        if (self.total_mass.is_some() || self.total_volume.is_some())
            && (!self.masses.is_empty() || !self.volumes.is_empty())
        {
            reasons.push("  - totals rescale explicitly set masses and volumes");
        }
        if reasons.is_empty() {
            String::new()
        } else {
            format!("\nlikely reasons:\n{}", reasons.join("\n"))
        }
    }

    fn parsed_total_mass(&self) -> MixResult<Option<Mass>> {
        Ok(self
            .total_mass
            .as_deref()
            .map(|text| parse_quantity(text)?.as_mass())
            .transpose()?)
    }

    fn parsed_total_volume(&self) -> MixResult<Option<Volume>> {
        Ok(self
            .total_volume
            .as_deref()
            .map(|text| parse_quantity(text)?.as_volume())
            .transpose()?)
    }
}
