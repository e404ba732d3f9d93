// mb-core/src/units.rs

use uom::si::f64::{
    Mass as UomMass, MassDensity as UomMassDensity, MolarConcentration as UomMolarConcentration,
    MolarMass as UomMolarMass, Ratio as UomRatio, Volume as UomVolume,
};

// Public canonical unit types (SI, f64)
pub type Mass = UomMass;
pub type Volume = UomVolume;
pub type Density = UomMassDensity;
/// Mass concentration shares the mass-per-volume dimension with density.
pub type Concentration = UomMassDensity;
pub type Molarity = UomMolarConcentration;
pub type MolarMass = UomMolarMass;
pub type Ratio = UomRatio;

const KG_PER_G: f64 = 1e-3;
const KG_PER_MG: f64 = 1e-6;
const M3_PER_ML: f64 = 1e-6;
const M3_PER_UL: f64 = 1e-9;
const KG_M3_PER_G_ML: f64 = 1e3;
const MOL_M3_PER_MOLAR: f64 = 1e3;

#[inline]
pub fn kg(v: f64) -> Mass {
    use uom::si::mass::kilogram;
    Mass::new::<kilogram>(v)
}

#[inline]
pub fn g(v: f64) -> Mass {
    kg(v * KG_PER_G)
}

#[inline]
pub fn mg(v: f64) -> Mass {
    kg(v * KG_PER_MG)
}

#[inline]
pub fn m3(v: f64) -> Volume {
    use uom::si::volume::cubic_meter;
    Volume::new::<cubic_meter>(v)
}

#[inline]
pub fn ml(v: f64) -> Volume {
    m3(v * M3_PER_ML)
}

#[inline]
pub fn ul(v: f64) -> Volume {
    m3(v * M3_PER_UL)
}

#[inline]
pub fn kg_per_m3(v: f64) -> Density {
    use uom::si::mass_density::kilogram_per_cubic_meter;
    Density::new::<kilogram_per_cubic_meter>(v)
}

#[inline]
pub fn g_per_ml(v: f64) -> Density {
    kg_per_m3(v * KG_M3_PER_G_ML)
}

/// mg/ml is numerically identical to kg/m^3.
#[inline]
pub fn mg_per_ml(v: f64) -> Concentration {
    kg_per_m3(v)
}

#[inline]
pub fn mol_per_m3(v: f64) -> Molarity {
    use uom::si::molar_concentration::mole_per_cubic_meter;
    Molarity::new::<mole_per_cubic_meter>(v)
}

/// Moles per litre.
#[inline]
pub fn molar(v: f64) -> Molarity {
    mol_per_m3(v * MOL_M3_PER_MOLAR)
}

#[inline]
pub fn millimolar(v: f64) -> Molarity {
    mol_per_m3(v)
}

#[inline]
pub fn g_per_mol(v: f64) -> MolarMass {
    use uom::si::molar_mass::kilogram_per_mole;
    MolarMass::new::<kilogram_per_mole>(v * KG_PER_G)
}

#[inline]
pub fn unitless(v: f64) -> Ratio {
    use uom::si::ratio::ratio;
    Ratio::new::<ratio>(v)
}

// Readers in laboratory units. `.value` is always the SI magnitude.

#[inline]
pub fn in_g(m: Mass) -> f64 {
    m.value / KG_PER_G
}

#[inline]
pub fn in_mg(m: Mass) -> f64 {
    m.value / KG_PER_MG
}

#[inline]
pub fn in_ml(v: Volume) -> f64 {
    v.value / M3_PER_ML
}

#[inline]
pub fn in_ul(v: Volume) -> f64 {
    v.value / M3_PER_UL
}

#[inline]
pub fn in_g_per_ml(d: Density) -> f64 {
    d.value / KG_M3_PER_G_ML
}

#[inline]
pub fn in_mg_per_ml(c: Concentration) -> f64 {
    c.value
}

#[inline]
pub fn in_molar(c: Molarity) -> f64 {
    c.value / MOL_M3_PER_MOLAR
}

#[inline]
pub fn in_millimolar(c: Molarity) -> f64 {
    c.value
}

#[inline]
pub fn in_g_per_mol(mm: MolarMass) -> f64 {
    mm.value / KG_PER_G
}
