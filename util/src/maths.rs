//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where 
    T: Float 
{
    target_range.0 
        + ((value - source_range.0) 
        * (target_range.1 - target_range.0) 
        / (source_range.1 - source_range.0))
}

/// Map a value from one range into another, saturating the result at the bounds of the target
/// range.
pub fn lin_map_sat<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float
{
    let lo = target_range.0.min(target_range.1);
    let hi = target_range.0.max(target_range.1);

    lin_map(source_range, target_range, value).max(lo).min(hi)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lin_map() {
        assert_eq!(lin_map((0f64, 180f64), (500f64, 2500f64), 0f64), 500f64);
        assert_eq!(lin_map((0f64, 180f64), (500f64, 2500f64), 90f64), 1500f64);
        assert_eq!(lin_map((0f64, 180f64), (500f64, 2500f64), 180f64), 2500f64);
        assert_eq!(lin_map((0f64, 1f64), (1f64, -1f64), 0.25f64), 0.5f64);
    }

    #[test]
    fn test_lin_map_sat() {
        assert_eq!(lin_map_sat((0f64, 180f64), (500f64, 2500f64), -10f64), 500f64);
        assert_eq!(lin_map_sat((0f64, 180f64), (500f64, 2500f64), 270f64), 2500f64);
        assert_eq!(lin_map_sat((0f64, 1f64), (1f64, -1f64), 2f64), -1f64);
    }
}
