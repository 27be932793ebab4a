//! Extensions to [`glam::DVec3`] needed by the hull builder that aren't
//! already inherent methods on the type.

use glam::DVec3;

/// Twice the machine epsilon for `f64`, the guard band used by
/// [`StableNormalize::stable_normalize`].
const TWO_EPS: f64 = 2.0 * f64::EPSILON;

/// Normalization that leaves already-unit vectors alone.
///
/// Repeatedly renormalizing a vector that drifted only slightly off unit
/// length (e.g. a face normal recomputed after a merge) introduces more
/// floating-point error than it removes. This mirrors the guard the
/// reference implementation uses: skip the divide when the squared length
/// is already within `2 * f64::EPSILON` of 1.
pub trait StableNormalize {
    /// Returns `self` unchanged if its squared length is within
    /// `2 * f64::EPSILON` of 1, otherwise `self / self.length()`.
    fn stable_normalize(self) -> DVec3;
}

impl StableNormalize for DVec3 {
    fn stable_normalize(self) -> DVec3 {
        let norm_sq = self.length_squared();
        if (norm_sq - 1.0).abs() <= TWO_EPS {
            self
        } else {
            self / norm_sq.sqrt()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_unit_is_untouched() {
        let v = DVec3::new(1.0, 0.0, 0.0);
        assert_eq!(v.stable_normalize(), v);
    }

    #[test]
    fn scales_down_to_unit_length() {
        let v = DVec3::new(3.0, 4.0, 0.0);
        let n = v.stable_normalize();
        assert!((n.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn slightly_off_unit_is_left_alone() {
        // Within the 2*EPS guard band: should be returned unchanged, not
        // rescaled to exactly 1.0.
        let nudge = f64::EPSILON * 0.5;
        let v = DVec3::new((1.0f64 + nudge).sqrt(), 0.0, 0.0);
        assert_eq!(v.stable_normalize(), v);
    }
}
