//! A single named chemical species inside a mixture.

use std::fmt;

use mb_core::numeric::{Tolerances, nearly_equal};
use mb_core::units::{
    Density, Mass, MolarMass, Volume, in_g, in_g_per_ml, in_ml, kg, m3,
};

use crate::error::{MixError, MixResult};

/// One component of a mixture.
///
/// Mass, density and molar mass are optional and filled in as the mixture is
/// specified. Volume is derived as mass/density; a volume may also be declared
/// directly for components without a density.
///
/// Solvents contribute to the aggregate volume of a mixture, solutes never do.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    name: String,
    mass: Option<Mass>,
    volume: Option<Volume>,
    density: Option<Density>,
    formula: Option<String>,
    molar_mass: Option<MolarMass>,
    uid: Option<String>,
    solute: bool,
}

impl Component {
    /// Create a component with an optional density.
    ///
    /// A component that is neither flagged as a solute nor given a density
    /// cannot derive a volume, so it classifies as a solute (with a warning)
    /// until a volume is declared through [`Self::with_declared_volume`].
    pub fn new(name: impl Into<String>, density: Option<Density>, solute: bool) -> Self {
        let name = name.into();
        if !solute && density.is_none() {
            tracing::warn!(
                component = %name,
                "component has no density and was not declared a solute; treating it as a solute"
            );
        }

        Self {
            name,
            mass: None,
            volume: None,
            density,
            formula: None,
            molar_mass: None,
            uid: None,
            solute,
        }
    }

    /// A solvent with the given density.
    pub fn solvent(name: impl Into<String>, density: Density) -> Self {
        Self::new(name, Some(density), false)
    }

    /// A solute; it never occupies volume in a mixture.
    pub fn solute(name: impl Into<String>) -> Self {
        Self::new(name, None, true)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Copy of this component under another name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        let mut component = self.clone();
        component.name = name.into();
        component
    }

    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    pub fn with_uid(&self, uid: impl Into<String>) -> Self {
        let mut component = self.clone();
        component.uid = Some(uid.into());
        component
    }

    /// Opaque chemical formula, resolved by external SLD/molar-mass lookups.
    pub fn formula(&self) -> Option<&str> {
        self.formula.as_deref()
    }

    pub fn set_formula(&mut self, formula: Option<String>) {
        self.formula = formula;
    }

    pub fn with_formula(&self, formula: impl Into<String>) -> Self {
        let mut component = self.clone();
        component.set_formula(Some(formula.into()));
        component
    }

    pub fn molar_mass(&self) -> Option<MolarMass> {
        self.molar_mass
    }

    pub fn set_molar_mass(&mut self, molar_mass: Option<MolarMass>) {
        self.molar_mass = molar_mass;
    }

    pub fn with_molar_mass(&self, molar_mass: MolarMass) -> Self {
        let mut component = self.clone();
        component.set_molar_mass(Some(molar_mass));
        component
    }

    pub fn has_mass(&self) -> bool {
        self.mass.is_some()
    }

    pub fn has_density(&self) -> bool {
        self.density.is_some()
    }

    pub fn has_volume(&self) -> bool {
        self.volume.is_some() || (self.has_mass() && self.has_density())
    }

    pub fn has_molar_mass(&self) -> bool {
        self.molar_mass.is_some()
    }

    /// Declared solute flag or no way to derive a volume.
    pub fn is_solute(&self) -> bool {
        self.solute || !self.has_volume()
    }

    pub fn is_solvent(&self) -> bool {
        !self.solute && self.has_volume()
    }

    pub fn set_solute(&mut self, solute: bool) {
        self.solute = solute;
    }

    pub fn mass(&self) -> MixResult<Mass> {
        self.mass.ok_or_else(|| self.unset("mass"))
    }

    pub fn set_mass(&mut self, mass: Mass) {
        self.mass = Some(mass);
    }

    pub fn with_mass(&self, mass: Mass) -> Self {
        let mut component = self.clone();
        component.set_mass(mass);
        component
    }

    /// Mass/density when both are known, otherwise the declared volume.
    pub fn volume(&self) -> MixResult<Volume> {
        match (self.mass, self.density) {
            (Some(mass), Some(density)) => Ok(m3(mass.value / density.value)),
            _ => self.volume.ok_or_else(|| self.unset("volume")),
        }
    }

    /// Store `volume` as the equivalent mass.
    pub fn set_volume(&mut self, volume: Volume) -> MixResult<()> {
        let density = self.density.ok_or_else(|| MixError::MissingDensity {
            component: self.name.clone(),
        })?;
        if self.solute {
            return Err(MixError::SoluteVolume {
                component: self.name.clone(),
            });
        }
        self.mass = Some(kg(volume.value * density.value));
        self.volume = None;
        Ok(())
    }

    pub fn with_volume(&self, volume: Volume) -> MixResult<Self> {
        let mut component = self.clone();
        component.set_volume(volume)?;
        Ok(component)
    }

    /// Declare a volume directly, for a component whose density is unknown.
    pub fn with_declared_volume(&self, volume: Volume) -> Self {
        let mut component = self.clone();
        component.volume = Some(volume);
        component
    }

    pub fn density(&self) -> Option<Density> {
        self.density
    }

    pub fn set_density(&mut self, density: Option<Density>) {
        self.density = density;
    }

    pub fn with_density(&self, density: Density) -> Self {
        let mut component = self.clone();
        component.set_density(Some(density));
        component
    }

    /// Amount of substance in mol.
    pub fn moles(&self) -> MixResult<f64> {
        let molar_mass = self.molar_mass.ok_or_else(|| MixError::MissingMolarMass {
            component: self.name.clone(),
        })?;
        Ok(self.mass()?.value / molar_mass.value)
    }

    /// Sum two portions of the same component.
    pub fn add(&self, other: &Component) -> MixResult<Component> {
        if self.name != other.name {
            return Err(MixError::NameMismatch {
                left: self.name.clone(),
                right: other.name.clone(),
            });
        }
        if !same_density(self.density, other.density) {
            return Err(MixError::DensityMismatch {
                component: self.name.clone(),
            });
        }

        Ok(self.with_mass(kg(self.mass()?.value + other.mass()?.value)))
    }

    /// Scale mass, or the declared volume when there is no mass.
    pub(crate) fn scale(&mut self, factor: f64) {
        if let Some(mass) = self.mass {
            self.mass = Some(kg(mass.value * factor));
        } else if let Some(volume) = self.volume {
            self.volume = Some(m3(volume.value * factor));
        }
    }

    fn unset(&self, property: &'static str) -> MixError {
        MixError::Unset {
            component: self.name.clone(),
            property,
        }
    }
}

fn same_density(a: Option<Density>, b: Option<Density>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => nearly_equal(a.value, b.value, Tolerances::default()),
        _ => false,
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_solute() {
            write!(f, "<Solute {}", self.name)?;
        } else {
            write!(f, "<Solvent {}", self.name)?;
        }
        match self.mass {
            Some(m) => write!(f, " M={:4.3} g", in_g(m))?,
            None => write!(f, " M=None")?,
        }
        match self.volume() {
            Ok(v) => write!(f, " V={:4.3} ml", in_ml(v))?,
            Err(_) => write!(f, " V=None")?,
        }
        match self.density {
            Some(d) => write!(f, " D={:4.3} g/ml", in_g_per_ml(d))?,
            None => write!(f, " D=None")?,
        }
        write!(f, ">")
    }
}
