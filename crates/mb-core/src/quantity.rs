//! Unit-aware text quantities.
//!
//! Stock and target specifications arrive as text (`"20 ul"`, `"100 mg/ml"`,
//! `"0.5"`). [`parse_quantity`] turns such text into a [`Quantity`]: the SI
//! magnitude plus the physical [`Dimension`] it was classified as. Typed `uom`
//! values are then pulled out with the `as_*` accessors, which fail with
//! [`CoreError::DimensionMismatch`] at assignment time instead of at solve time.

use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};
use crate::units::{
    Concentration, Density, Mass, MolarMass, Molarity, Volume, g, g_per_ml, g_per_mol, in_g,
    in_g_per_ml, in_ml, kg, kg_per_m3, m3, mol_per_m3, ul,
};

/// Physical dimension of a parsed quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// Mass (canonical: kg)
    Mass,
    /// Volume (canonical: m^3)
    Volume,
    /// Mass per volume: density or mass concentration (canonical: kg/m^3)
    MassPerVolume,
    /// Amount of substance per volume (canonical: mol/m^3)
    Molarity,
    /// Mass per amount of substance (canonical: kg/mol)
    MolarMass,
    /// Pure number, percent accepted on input
    Dimensionless,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mass => write!(f, "mass"),
            Self::Volume => write!(f, "volume"),
            Self::MassPerVolume => write!(f, "mass/volume"),
            Self::Molarity => write!(f, "molarity"),
            Self::MolarMass => write!(f, "molar mass"),
            Self::Dimensionless => write!(f, "dimensionless"),
        }
    }
}

/// A magnitude in canonical SI units tagged with its dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantity {
    value: f64,
    dimension: Dimension,
}

impl Quantity {
    pub fn new(value_si: f64, dimension: Dimension) -> Self {
        Self {
            value: value_si,
            dimension,
        }
    }

    /// Canonical SI magnitude.
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    fn in_dimension(&self, dimension: Dimension, expected: &'static str) -> CoreResult<f64> {
        if self.dimension == dimension {
            Ok(self.value)
        } else {
            Err(CoreError::DimensionMismatch {
                expected,
                found: self.dimension,
            })
        }
    }

    pub fn as_mass(&self) -> CoreResult<Mass> {
        self.in_dimension(Dimension::Mass, "mass").map(kg)
    }

    pub fn as_volume(&self) -> CoreResult<Volume> {
        self.in_dimension(Dimension::Volume, "volume").map(m3)
    }

    pub fn as_density(&self) -> CoreResult<Density> {
        self.in_dimension(Dimension::MassPerVolume, "density")
            .map(kg_per_m3)
    }

    pub fn as_concentration(&self) -> CoreResult<Concentration> {
        self.in_dimension(Dimension::MassPerVolume, "concentration")
            .map(kg_per_m3)
    }

    pub fn as_molarity(&self) -> CoreResult<Molarity> {
        self.in_dimension(Dimension::Molarity, "molarity")
            .map(mol_per_m3)
    }

    pub fn as_molar_mass(&self) -> CoreResult<MolarMass> {
        use uom::si::molar_mass::kilogram_per_mole;
        self.in_dimension(Dimension::MolarMass, "molar mass")
            .map(|v| MolarMass::new::<kilogram_per_mole>(v))
    }

    pub fn as_fraction(&self) -> CoreResult<f64> {
        self.in_dimension(Dimension::Dimensionless, "dimensionless")
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dimension {
            Dimension::Mass => write!(f, "{} g", in_g(kg(self.value))),
            Dimension::Volume => write!(f, "{} ml", in_ml(m3(self.value))),
            Dimension::MassPerVolume => write!(f, "{} g/ml", in_g_per_ml(kg_per_m3(self.value))),
            Dimension::Molarity => write!(f, "{} mM", self.value),
            Dimension::MolarMass => write!(f, "{} g/mol", self.value * 1e3),
            Dimension::Dimensionless => write!(f, "{}", self.value),
        }
    }
}

impl FromStr for Quantity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_quantity(s)
    }
}

impl From<Mass> for Quantity {
    fn from(m: Mass) -> Self {
        Self::new(m.value, Dimension::Mass)
    }
}

impl From<Volume> for Quantity {
    fn from(v: Volume) -> Self {
        Self::new(v.value, Dimension::Volume)
    }
}

impl From<Density> for Quantity {
    fn from(d: Density) -> Self {
        Self::new(d.value, Dimension::MassPerVolume)
    }
}

impl From<Molarity> for Quantity {
    fn from(c: Molarity) -> Self {
        Self::new(c.value, Dimension::Molarity)
    }
}

/// An amount that can be measured out of a mixture: a mass or a volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Amount {
    Mass(Mass),
    Volume(Volume),
}

impl Amount {
    /// Parse text such as `"20 ul"` or `"5 mg"`.
    pub fn parse(text: &str) -> CoreResult<Self> {
        Self::try_from(parse_quantity(text)?)
    }

    pub fn is_positive(&self) -> bool {
        match self {
            Amount::Mass(m) => m.value > 0.0,
            Amount::Volume(v) => v.value > 0.0,
        }
    }
}

impl TryFrom<Quantity> for Amount {
    type Error = CoreError;

    fn try_from(q: Quantity) -> Result<Self, Self::Error> {
        match q.dimension() {
            Dimension::Mass => q.as_mass().map(Amount::Mass),
            Dimension::Volume => q.as_volume().map(Amount::Volume),
            found => Err(CoreError::DimensionMismatch {
                expected: "mass or volume",
                found,
            }),
        }
    }
}

impl From<Mass> for Amount {
    fn from(m: Mass) -> Self {
        Amount::Mass(m)
    }
}

impl From<Volume> for Amount {
    fn from(v: Volume) -> Self {
        Amount::Volume(v)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Mass(m) => write!(f, "{}", Quantity::from(*m)),
            Amount::Volume(v) => write!(f, "{}", Quantity::from(*v)),
        }
    }
}

/// Parse a quantity from text and classify its dimension.
///
/// Plain numbers and percentages are dimensionless. Unit matching is
/// case-insensitive except for the molar units (`M`, `mM`, `uM`), which are
/// matched exactly.
pub fn parse_quantity(raw_text: &str) -> CoreResult<Quantity> {
    let trimmed = raw_text.trim();

    if let Some(percent) = trimmed.strip_suffix('%') {
        let value: f64 = percent.trim().parse().map_err(|_| CoreError::Parse {
            input: raw_text.to_string(),
        })?;
        return finite(Quantity::new(value / 100.0, Dimension::Dimensionless));
    }

    let (value, unit) = split_value_and_unit(trimmed)?;
    let unit = unit.replace(['µ', 'μ'], "u").replace('³', "^3");

    let quantity = match unit.as_str() {
        "M" => molarity(value, 1e3),
        "mM" => molarity(value, 1.0),
        "uM" => molarity(value, 1e-3),
        _ => match unit.to_lowercase().as_str() {
            "" => Quantity::new(value, Dimension::Dimensionless),
            // Mass
            "kg" => Quantity::from(kg(value)),
            "g" => Quantity::from(g(value)),
            "mg" => Quantity::from(g(value * 1e-3)),
            "ug" => Quantity::from(g(value * 1e-6)),
            // Volume
            "m^3" | "m3" => Quantity::from(m3(value)),
            "l" => Quantity::from(ul(value * 1e6)),
            "ml" | "cm^3" | "cm3" | "cc" => Quantity::from(ul(value * 1e3)),
            "ul" => Quantity::from(ul(value)),
            // Mass per volume
            "kg/m^3" | "kg/m3" | "g/l" | "mg/ml" => Quantity::from(kg_per_m3(value)),
            "g/ml" | "g/cm^3" | "g/cm3" | "kg/l" => Quantity::from(g_per_ml(value)),
            "mg/l" | "ug/ml" => Quantity::from(kg_per_m3(value * 1e-3)),
            // Molarity
            "mol/l" => molarity(value, 1e3),
            "mmol/l" | "mol/m^3" | "mol/m3" => molarity(value, 1.0),
            // Molar mass
            "g/mol" => Quantity::from_molar_mass(g_per_mol(value)),
            "kg/mol" => Quantity::from_molar_mass(g_per_mol(value * 1e3)),
            _ => {
                return Err(CoreError::UnknownUnit {
                    unit: unit.to_string(),
                });
            }
        },
    };

    finite(quantity)
}

impl Quantity {
    fn from_molar_mass(mm: MolarMass) -> Self {
        Self::new(mm.value, Dimension::MolarMass)
    }
}

fn molarity(value: f64, mol_m3_per_unit: f64) -> Quantity {
    Quantity::new(value * mol_m3_per_unit, Dimension::Molarity)
}

fn finite(q: Quantity) -> CoreResult<Quantity> {
    crate::numeric::ensure_finite(q.value, "quantity")?;
    Ok(q)
}

/// Split a value+unit string into (numeric_value, unit_string).
///
/// Examples:
/// - "20ul" -> (20.0, "ul")
/// - "1.0 g/ml" -> (1.0, "g/ml")
/// - "0.5" -> (0.5, "")
fn split_value_and_unit(input: &str) -> CoreResult<(f64, String)> {
    let trimmed = input.trim();

    // Find where the numeric part ends
    let split_idx = trimmed
        .find(|c: char| !c.is_ascii_digit() && c != '.' && c != '-' && c != '+' && c != 'e' && c != 'E')
        .unwrap_or(trimmed.len());

    let (num_part, unit_part) = trimmed.split_at(split_idx);
    let num_part = num_part.trim();
    let unit_part = unit_part.trim();

    let value: f64 = num_part.parse().map_err(|_| CoreError::Parse {
        input: input.to_string(),
    })?;

    Ok((value, unit_part.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{in_mg, in_mg_per_ml, in_millimolar, in_ul};

    #[test]
    fn parse_masses() {
        let q = parse_quantity("250 mg").unwrap();
        assert_eq!(q.dimension(), Dimension::Mass);
        assert!((in_mg(q.as_mass().unwrap()) - 250.0).abs() < 1e-9);
        assert!((in_mg(parse_quantity("1.5g").unwrap().as_mass().unwrap()) - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn parse_volumes() {
        for text in ["20 ul", "20 µl", "0.02 ml", "20uL"] {
            let v = parse_quantity(text).unwrap().as_volume().unwrap();
            assert!((in_ul(v) - 20.0).abs() < 1e-9, "{text}");
        }
    }

    #[test]
    fn density_and_concentration_share_dimension() {
        let q = parse_quantity("1.0 g/ml").unwrap();
        assert_eq!(q.dimension(), Dimension::MassPerVolume);
        assert!((q.as_density().unwrap().value - 1000.0).abs() < 1e-9);
        let c = parse_quantity("100 mg/ml").unwrap().as_concentration().unwrap();
        assert!((in_mg_per_ml(c) - 100.0).abs() < 1e-12);
    }

    #[test]
    fn molar_units_are_case_sensitive() {
        let m = parse_quantity("0.5 M").unwrap().as_molarity().unwrap();
        assert!((in_millimolar(m) - 500.0).abs() < 1e-9);
        let mm = parse_quantity("34 mM").unwrap().as_molarity().unwrap();
        assert!((in_millimolar(mm) - 34.0).abs() < 1e-9);
    }

    #[test]
    fn parse_fractions() {
        assert_eq!(parse_quantity("0.75").unwrap().as_fraction().unwrap(), 0.75);
        assert_eq!(parse_quantity("75%").unwrap().as_fraction().unwrap(), 0.75);
    }

    #[test]
    fn wrong_dimension_is_rejected_early() {
        let err = parse_quantity("10 ml").unwrap().as_mass().unwrap_err();
        assert!(matches!(
            err,
            CoreError::DimensionMismatch {
                expected: "mass",
                found: Dimension::Volume
            }
        ));
    }

    #[test]
    fn unknown_unit_and_garbage() {
        assert!(matches!(
            parse_quantity("3 furlongs"),
            Err(CoreError::UnknownUnit { .. })
        ));
        assert!(matches!(
            parse_quantity("ten grams"),
            Err(CoreError::Parse { .. })
        ));
    }

    #[test]
    fn amount_accepts_mass_or_volume_only() {
        assert!(matches!(Amount::parse("20 ul"), Ok(Amount::Volume(_))));
        assert!(matches!(Amount::parse("5 mg"), Ok(Amount::Mass(_))));
        assert!(matches!(
            Amount::parse("1 g/ml"),
            Err(CoreError::DimensionMismatch { .. })
        ));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn mass_text_round_trips(v in 1e-3_f64..1e4_f64) {
            let q = parse_quantity(&format!("{v} mg")).unwrap();
            let back = crate::units::in_mg(q.as_mass().unwrap());
            prop_assert!((back - v).abs() <= 1e-9 * v.max(1.0));
        }
    }
}
