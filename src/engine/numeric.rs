//! Domain guards for the closed-form lab formulas.
//!
//! Every formula result that reaches a readout or a draw call passes through
//! one of these, so NaN never leaks into the rendered output.

use crate::error::{LabError, Result};

const EPSILON: f64 = 1e-12;

/// Clamps NaN and negative values to zero.
pub fn non_negative(x: f64) -> f64 {
    if x.is_nan() || x < 0.0 {
        0.0
    } else {
        x
    }
}

/// Replaces a non-finite value with zero.
pub fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() { x } else { 0.0 }
}

/// Division that yields zero for a vanishing denominator.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator.abs() < EPSILON {
        return 0.0;
    }
    finite_or_zero(numerator / denominator)
}

/// `log10(x + 1)` with the argument floored at zero.
pub fn log10_1p(x: f64) -> f64 {
    (non_negative(x) + 1.0).log10()
}

/// Square root that treats a negative radicand as zero.
pub fn sqrt_floor(x: f64) -> f64 {
    non_negative(x).sqrt()
}

/// Triangle area from three side lengths (Heron's formula).
pub fn heron_area(a: f64, b: f64, c: f64) -> Result<f64> {
    if [a, b, c].iter().any(|v| !v.is_finite() || *v <= 0.0) {
        return Err(LabError::Domain(format!(
            "side lengths must be positive, got {a}, {b}, {c}"
        )));
    }
    let s = (a + b + c) / 2.0;
    let radicand = s * (s - a) * (s - b) * (s - c);
    if radicand <= 0.0 {
        return Err(LabError::Domain(format!(
            "sides {a}, {b}, {c} violate the triangle inequality"
        )));
    }
    Ok(radicand.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn non_negative_floors_nan_and_negatives() {
        assert_eq!(non_negative(f64::NAN), 0.0);
        assert_eq!(non_negative(-3.0), 0.0);
        assert_eq!(non_negative(2.5), 2.5);
    }

    #[test]
    fn safe_div_guards_zero_denominator() {
        assert_eq!(safe_div(5.0, 0.0), 0.0);
        assert_eq!(safe_div(0.0, 0.0), 0.0);
        assert_relative_eq!(safe_div(12.0, 100.0), 0.12, epsilon = 1e-12);
    }

    #[test]
    fn log10_1p_guards_negative_input() {
        assert_eq!(log10_1p(-50.0), 0.0);
        assert_relative_eq!(log10_1p(9.0), 1.0, epsilon = 1e-12);
        assert!(log10_1p(f64::NAN).is_finite());
    }

    #[test]
    fn heron_area_of_right_triangle() {
        let area = heron_area(3.0, 4.0, 5.0).unwrap();
        assert_relative_eq!(area, 6.0, epsilon = 1e-12);
    }

    #[test]
    fn heron_area_rejects_impossible_triangle() {
        assert!(matches!(heron_area(1.0, 2.0, 10.0), Err(LabError::Domain(_))));
        assert!(matches!(heron_area(1.0, 1.0, 2.0), Err(LabError::Domain(_))));
        assert!(matches!(heron_area(-1.0, 2.0, 2.0), Err(LabError::Domain(_))));
    }
}
