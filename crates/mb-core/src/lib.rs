//! mb-core: quantity layer shared by the mass-balance crates.
//!
//! Contains:
//! - units (uom SI types + laboratory-scale constructors and readers)
//! - quantity (text parsing and dimension classification of unit values)
//! - numeric (Real + tolerances + float helpers)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod quantity;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use quantity::{Amount, Dimension, Quantity, parse_quantity};
pub use units::*;
