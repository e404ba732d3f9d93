//! mb-mixture: unit-safe mixture algebra.
//!
//! Provides:
//! - `Component`: one chemical species with optional mass, density and molar mass
//! - `Mixture`: named component collections with mass/volume totals and
//!   fraction, concentration, molarity and molality views
//! - `TransferAction`: one pipetting step of a protocol
//! - `ComponentRegistry`: in-memory component database
//! - `MixtureSpec`: text-based stock/target descriptions resolved against a registry
//!
//! # Example
//!
//! ```
//! use mb_core::units::{g, g_per_ml, in_mg_per_ml, ml};
//! use mb_mixture::{Component, Mixture};
//!
//! let mut brine = Mixture::at("Brine", "1A1");
//! brine.insert(Component::solvent("H2O", g_per_ml(1.0)).with_mass(g(10.0)));
//! brine.insert(Component::solute("NaCl").with_mass(g(1.0)));
//!
//! let portion = brine.measure_out(ml(2.5).into()).unwrap();
//! let c = portion.concentration("NaCl").unwrap();
//! assert!((in_mg_per_ml(c) - 100.0).abs() < 1e-9);
//! ```

pub mod component;
pub mod error;
pub mod mixture;
pub mod registry;
pub mod spec;
pub mod transfer;

pub use component::Component;
pub use error::{MixError, MixResult};
pub use mixture::{Fraction, Mixture};
pub use registry::{ComponentRecord, ComponentRegistry};
pub use spec::{FractionDef, MixtureSpec};
pub use transfer::{TransferAction, TransferRecord};
