//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Clamp an i64 into the u32 range, treating negatives as zero.
#[must_use]
pub fn clamp_i64_to_u32(value: i64) -> u32 {
    let clamped = value.clamp(0, i64::from(u32::MAX));
    cast::<i64, u32>(clamped).unwrap_or(0)
}

/// Narrow a usize counter to u32, saturating on 64-bit excess.
#[must_use]
pub fn usize_to_u32(value: usize) -> u32 {
    cast::<usize, u32>(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_covers_sign_and_range() {
        assert_eq!(clamp_i64_to_u32(-5), 0);
        assert_eq!(clamp_i64_to_u32(525), 525);
        assert_eq!(clamp_i64_to_u32(i64::MAX), u32::MAX);
    }

    #[test]
    fn counter_narrowing_saturates() {
        assert_eq!(usize_to_u32(3), 3);
        assert_eq!(usize_to_u32(usize::MAX), u32::MAX);
    }
}
