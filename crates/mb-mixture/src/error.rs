//! Mixture algebra errors.

use mb_core::CoreError;
use thiserror::Error;

/// Result type for component and mixture operations.
pub type MixResult<T> = Result<T, MixError>;

/// Errors raised by components, mixtures, the component registry and mixture specs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MixError {
    /// Unit parsing or dimension classification failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A property was read before it was ever assigned.
    #[error("{property} of component '{component}' is not set")]
    Unset {
        component: String,
        property: &'static str,
    },

    /// Volume conversion needs a density.
    #[error("Component '{component}' has no density; cannot convert between mass and volume")]
    MissingDensity { component: String },

    /// Solutes do not occupy volume.
    #[error("Cannot set the volume of solute '{component}'")]
    SoluteVolume { component: String },

    /// Molar views need a molar mass supplied by the registry.
    #[error("Component '{component}' has no molar mass")]
    MissingMolarMass { component: String },

    #[error("Cannot add components with different names: '{left}' and '{right}'")]
    NameMismatch { left: String, right: String },

    #[error("Density mismatch while adding component '{component}'")]
    DensityMismatch { component: String },

    #[error("At most one component may take the remainder fraction")]
    TooManyRemainders,

    /// Explicit fractions leave nothing (or less than nothing) for the remainder.
    #[error("Explicit fractions sum to {sum}, leaving no room for the remainder")]
    FractionOverflow { sum: f64 },

    #[error("Fractions must sum to 1.0 but sum to {sum}")]
    FractionSum { sum: f64 },

    #[error("Cannot measure out {requested_g} g from a mixture holding {available_g} g")]
    InsufficientQuantity { requested_g: f64, available_g: f64 },

    /// A ratio was requested against a zero total.
    #[error("Mixture '{mixture}' has zero {what}")]
    EmptyMixture { mixture: String, what: &'static str },

    #[error("Mixture '{mixture}' contains no solvent")]
    NoSolvent { mixture: String },

    #[error("Component '{component}' is not a solvent")]
    NotSolvent { component: String },

    #[error("Component '{name}' not found")]
    UnknownComponent { name: String },

    #[error("Component '{name}' already exists")]
    DuplicateComponent { name: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}
