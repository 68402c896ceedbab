//! Sweep generation
//!
//! A sweep is the ordered list of angles written to a joint to move it from its current angle to
//! a new target, one degree at a time with both ends included.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::cmp::Ordering;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Iterator over the angles of a single sweep.
///
/// If the joint has no known angle, or is already at the target, the sweep is a single settle
/// write at the target.
#[derive(Debug, Clone)]
pub struct Sweep {
    next_deg: Option<i32>,

    target_deg: i32,

    step_deg: i32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Sweep {
    /// Create the sweep moving from `current_deg` to `target_deg`.
    pub fn new(current_deg: Option<i32>, target_deg: i32) -> Self {
        let start_deg = current_deg.unwrap_or(target_deg);

        let step_deg = match target_deg.cmp(&start_deg) {
            Ordering::Greater => 1,
            Ordering::Less => -1,
            Ordering::Equal => 0,
        };

        Self {
            next_deg: Some(start_deg),
            target_deg,
            step_deg,
        }
    }

    /// Returns `true` if this sweep is a single write at the target.
    pub fn is_settle(&self) -> bool {
        self.step_deg == 0
    }
}

impl Iterator for Sweep {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        let current = self.next_deg?;

        self.next_deg = if current == self.target_deg {
            None
        } else {
            Some(current + self.step_deg)
        };

        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = match self.next_deg {
            Some(n) => (self.target_deg.abs_diff(n) as usize).saturating_add(1),
            None => 0,
        };
        (len, Some(len))
    }
}

impl ExactSizeIterator for Sweep {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_down() {
        let sweep = Sweep::new(Some(90), 5);
        assert_eq!(sweep.len(), 86);
        assert!(!sweep.is_settle());

        let angles: Vec<i32> = sweep.collect();
        assert_eq!(angles.len(), 86);
        assert_eq!(angles.first(), Some(&90));
        assert_eq!(angles.last(), Some(&5));
        assert!(angles.windows(2).all(|w| w[1] == w[0] - 1));
    }

    #[test]
    fn test_sweep_up() {
        let angles: Vec<i32> = Sweep::new(Some(10), 14).collect();
        assert_eq!(angles, vec![10, 11, 12, 13, 14]);
    }

    #[test]
    fn test_settle_when_equal() {
        let sweep = Sweep::new(Some(45), 45);
        assert!(sweep.is_settle());
        assert_eq!(sweep.collect::<Vec<_>>(), vec![45]);
    }

    #[test]
    fn test_settle_when_uninitialised() {
        let sweep = Sweep::new(None, 120);
        assert!(sweep.is_settle());
        assert_eq!(sweep.collect::<Vec<_>>(), vec![120]);
    }

    #[test]
    fn test_sweep_across_full_i32_range() {
        let mut sweep = Sweep::new(Some(i32::MIN), i32::MAX);
        assert!(sweep.size_hint().0 >= u32::MAX as usize);
        assert_eq!(sweep.next(), Some(i32::MIN));
        assert_eq!(sweep.next(), Some(i32::MIN + 1));

        let mut sweep = Sweep::new(Some(i32::MAX), i32::MIN);
        assert_eq!(sweep.next(), Some(i32::MAX));
        assert_eq!(sweep.next(), Some(i32::MAX - 1));
    }

    #[test]
    fn test_sweep_covers_closed_interval() {
        for &(from, to) in &[(0, 180), (180, 0), (-3, 3), (7, 8), (8, 7)] {
            let angles: Vec<i32> = Sweep::new(Some(from), to).collect();
            let expected: Vec<i32> = if from <= to {
                (from..=to).collect()
            } else {
                (to..=from).rev().collect()
            };
            assert_eq!(angles, expected);
        }
    }
}
