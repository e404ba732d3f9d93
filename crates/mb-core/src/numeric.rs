use crate::CoreError;

/// Floating point type for all magnitudes
pub type Real = f64;

/// Absolute and relative closeness thresholds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self::new(1e-12, 1e-9)
    }
}

impl Tolerances {
    pub const fn new(abs: Real, rel: Real) -> Self {
        Self { abs, rel }
    }

    /// `a` and `b` agree within the absolute or the relative threshold.
    pub fn close(&self, a: Real, b: Real) -> bool {
        let diff = (a - b).abs();
        diff <= self.abs || diff <= self.rel * a.abs().max(b.abs())
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    tol.close(a, b)
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Finite and `>= 0`; amounts, fractions and concentrations are never negative.
pub fn ensure_non_negative(v: Real, what: &'static str) -> Result<Real, CoreError> {
    let v = ensure_finite(v, what)?;
    if v < 0.0 {
        return Err(CoreError::InvalidArg { what });
    }
    Ok(v)
}

/// `|actual - expected| / expected`.
///
/// A zero `expected` gives 0.0 when `actual` is also zero and infinity otherwise,
/// so a reference of zero can only be matched exactly.
pub fn relative_error(actual: Real, expected: Real) -> Real {
    let diff = (actual - expected).abs();
    if expected == 0.0 {
        if diff == 0.0 { 0.0 } else { Real::INFINITY }
    } else {
        diff / expected.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closeness_uses_either_threshold() {
        let tol = Tolerances::new(1e-12, 1e-9);
        assert!(tol.close(1.0, 1.0 + 1e-12));
        assert!(tol.close(0.0, 1e-13));
        assert!(tol.close(1e6, 1e6 + 1e-4));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn non_negative_rejects_nan_and_negatives() {
        let msg = ensure_finite(Real::NAN, "mass").unwrap_err().to_string();
        assert!(msg.contains("Non-finite"));
        assert_eq!(
            ensure_non_negative(-1e-3, "mass"),
            Err(CoreError::InvalidArg { what: "mass" })
        );
        assert_eq!(ensure_non_negative(0.0, "mass"), Ok(0.0));
    }

    #[test]
    fn relative_error_against_zero_reference() {
        assert_eq!(relative_error(0.0, 0.0), 0.0);
        assert!(relative_error(1e-9, 0.0).is_infinite());
        assert!((relative_error(0.9, 1.0) - 0.1).abs() < 1e-12);
        assert!((relative_error(1.1, 1.0) - 0.1).abs() < 1e-12);
    }
}
