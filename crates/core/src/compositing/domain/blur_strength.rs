use super::composite_error::CompositeError;

/// A normalized blur kernel size: always odd and at least the configured
/// minimum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlurStrength(u32);

impl BlurStrength {
    /// Normalizes a raw control value into a usable kernel size.
    ///
    /// Even values are bumped to the next odd value, then the result is
    /// clamped upward to `minimum`. Nothing is ever clamped downward, so
    /// large values pass through (saturating at `u32::MAX`, which is odd).
    pub fn normalize(raw: i64, minimum: u32) -> Result<Self, CompositeError> {
        let odd = if raw % 2 == 0 { raw + 1 } else { raw };
        let value = odd.clamp(i64::from(minimum), i64::from(u32::MAX)) as u32;
        if value == 0 || value % 2 == 0 {
            return Err(CompositeError::InvalidParameter(format!(
                "blur strength {raw} normalizes to {value}, which is not an odd kernel size \
                 (minimum {minimum})"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    pub fn kernel_size(self) -> usize {
        self.0 as usize
    }

    /// Pixels on each side of the kernel center.
    pub fn radius(self) -> usize {
        self.kernel_size() / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(36, 37)]
    #[case(3, 5)]
    #[case(7, 7)]
    #[case(-4, 5)]
    #[case(0, 5)]
    #[case(4, 5)]
    #[case(5, 5)]
    #[case(6, 7)]
    #[case(99, 99)]
    #[case(100, 101)]
    #[case(i64::MIN, 5)]
    fn test_normalize_default_minimum(#[case] raw: i64, #[case] expected: u32) {
        assert_eq!(BlurStrength::normalize(raw, 5).unwrap().value(), expected);
    }

    #[test]
    fn test_normalize_always_odd_and_at_least_minimum() {
        for raw in -50..300 {
            let s = BlurStrength::normalize(raw, 5).unwrap().value();
            assert_eq!(s % 2, 1, "normalize({raw}) = {s} is even");
            assert!(s >= 5, "normalize({raw}) = {s} is below minimum");
        }
    }

    #[test]
    fn test_normalize_saturates_large_values() {
        let s = BlurStrength::normalize(i64::MAX, 5).unwrap();
        assert_eq!(s.value(), u32::MAX);
    }

    #[test]
    fn test_even_minimum_is_rejected() {
        let err = BlurStrength::normalize(2, 6).unwrap_err();
        assert!(matches!(err, CompositeError::InvalidParameter(_)));
    }

    #[test]
    fn test_zero_minimum_still_yields_odd() {
        assert_eq!(BlurStrength::normalize(0, 0).unwrap().value(), 1);
        assert!(BlurStrength::normalize(-3, 0).is_err());
    }

    #[test]
    fn test_radius() {
        assert_eq!(BlurStrength::normalize(11, 5).unwrap().radius(), 5);
    }
}
