//! Horizontal distance between two raster shapes set side by side

use serde::{Deserialize, Serialize};

use super::raster::Coverage;
use crate::core::errors::PreconditionError;

/// What to report once the minimum gap has been found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistancePolicy {
    /// The minimum gap as measured
    #[default]
    Raw,
    /// One less than the measured gap, so the shapes end up just touching
    SubtractOne,
}

impl DistancePolicy {
    pub fn from_subtract_one(subtract_one: bool) -> Self {
        if subtract_one {
            DistancePolicy::SubtractOne
        } else {
            DistancePolicy::Raw
        }
    }
}

/// How far `right` can slide left over `left` before any row collides.
///
/// For every row where both grids have ink, the gap is the blank space to
/// the right of the left shape plus the blank space to the left of the
/// right shape. The result is the smallest such gap, never more than the
/// narrower grid's width. Rows where either side is blank do not constrain
/// the result.
pub fn min_horizontal_distance(
    left: &Coverage,
    right: &Coverage,
    policy: DistancePolicy,
) -> Result<i64, PreconditionError> {
    if left.height() != right.height() {
        return Err(PreconditionError::HeightMismatch {
            expected: left.height(),
            found: right.height(),
        });
    }

    let left_width = left.width() as i64;
    let mut distance = left.width().min(right.width()) as i64;
    for row in 0..left.height() {
        let (Some(left_edge), Some(right_edge)) =
            (left.rightmost_nonzero(row), right.leftmost_nonzero(row))
        else {
            continue;
        };
        let gap = left_width - left_edge as i64 + right_edge as i64;
        distance = distance.min(gap);
    }

    Ok(match policy {
        DistancePolicy::Raw => distance,
        DistancePolicy::SubtractOne => distance - 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::ops::Range;

    fn band(width: usize, height: usize, rows: Range<usize>, cols: Range<usize>) -> Coverage {
        Coverage::from_fn(width, height, |r, c| {
            if rows.contains(&r) && cols.contains(&c) {
                1.0
            } else {
                0.0
            }
        })
    }

    #[test]
    fn disjoint_rows_use_the_width_cap() {
        let left = band(10, 10, 0..5, 0..10);
        let right = band(10, 10, 5..10, 0..10);
        assert_eq!(min_horizontal_distance(&left, &right, DistancePolicy::Raw), Ok(10));
        assert_eq!(
            min_horizontal_distance(&left, &right, DistancePolicy::SubtractOne),
            Ok(9)
        );
    }

    #[test]
    fn gap_counts_blank_columns_on_both_sides() {
        // Left ink ends at column 5 of 8, right ink starts at column 3
        let left = band(8, 4, 0..4, 0..6);
        let right = band(6, 4, 1..3, 3..6);
        assert_eq!(
            min_horizontal_distance(&left, &right, DistancePolicy::Raw),
            Ok(8 - 5 + 3)
        );
    }

    #[test]
    fn minimum_is_taken_over_rows() {
        let mut left = band(5, 3, 0..3, 0..2);
        left.set(1, 4, 1.0);
        let right = band(5, 3, 0..3, 1..5);
        // Row 1: 5 - 4 + 1 = 2; other rows: 5 - 1 + 1 = 5
        assert_eq!(min_horizontal_distance(&left, &right, DistancePolicy::Raw), Ok(2));
    }

    #[test]
    fn blank_shapes_give_the_narrower_width() {
        let left = Coverage::new(7, 3);
        let right = band(4, 3, 0..3, 0..4);
        assert_eq!(min_horizontal_distance(&left, &right, DistancePolicy::Raw), Ok(4));
    }

    #[test]
    fn heights_must_match() {
        let (short, tall) = (Coverage::new(3, 3), Coverage::new(3, 4));
        let err = min_horizontal_distance(&short, &tall, DistancePolicy::Raw).unwrap_err();
        assert_eq!(
            err,
            PreconditionError::HeightMismatch {
                expected: 3,
                found: 4
            }
        );
    }
}
