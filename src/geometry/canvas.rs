//! Composite canvas for a run of shapes placed with kerning gaps

use super::raster::Coverage;
use crate::core::errors::PreconditionError;

/// Lay shapes out left to right, pulling each one left by the gap between
/// it and its predecessor. Where shapes overlap their values add up.
pub fn assemble_canvas(shapes: &[Coverage], gaps: &[i64]) -> Result<Coverage, PreconditionError> {
    let Some(first) = shapes.first() else {
        return Err(PreconditionError::NoShapes);
    };
    if gaps.len() != shapes.len() - 1 {
        return Err(PreconditionError::GapCountMismatch {
            expected: shapes.len() - 1,
            found: gaps.len(),
        });
    }
    let height = first.height();
    if let Some(other) = shapes.iter().find(|s| s.height() != height) {
        return Err(PreconditionError::HeightMismatch {
            expected: height,
            found: other.height(),
        });
    }

    let total_width: i64 =
        shapes.iter().map(|s| s.width() as i64).sum::<i64>() - gaps.iter().sum::<i64>();
    let mut offsets = Vec::with_capacity(shapes.len());
    let mut offset = 0i64;
    for (index, shape) in shapes.iter().enumerate() {
        if index > 0 {
            offset += shapes[index - 1].width() as i64 - gaps[index - 1];
        }
        if offset < 0 || offset + shape.width() as i64 > total_width {
            return Err(PreconditionError::OutOfCanvas { index });
        }
        offsets.push(offset as usize);
    }

    let mut canvas = Coverage::new(total_width.max(0) as usize, height);
    for (shape, offset) in shapes.iter().zip(offsets) {
        canvas.add_at(shape, offset);
    }
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: usize, height: usize, value: f32) -> Coverage {
        Coverage::from_fn(width, height, |_, _| value)
    }

    #[test]
    fn shapes_overlap_by_the_gap() {
        let canvas = assemble_canvas(&[solid(4, 2, 1.0), solid(3, 2, 1.0)], &[2]).unwrap();
        assert_eq!((canvas.width(), canvas.height()), (5, 2));
        assert_eq!(canvas.row(0), &[1.0, 1.0, 2.0, 2.0, 1.0]);
    }

    #[test]
    fn zero_gaps_concatenate() {
        let canvas = assemble_canvas(
            &[solid(2, 1, 1.0), solid(1, 1, 0.5), solid(2, 1, 0.25)],
            &[0, 0],
        )
        .unwrap();
        assert_eq!(canvas.row(0), &[1.0, 1.0, 0.5, 0.25, 0.25]);
    }

    #[test]
    fn single_shape_is_copied() {
        let shape = solid(3, 2, 0.5);
        assert_eq!(assemble_canvas(&[shape.clone()], &[]).unwrap(), shape);
    }

    #[test]
    fn bad_inputs_are_rejected() {
        assert_eq!(assemble_canvas(&[], &[]), Err(PreconditionError::NoShapes));
        assert_eq!(
            assemble_canvas(&[solid(2, 2, 1.0), solid(2, 2, 1.0)], &[]),
            Err(PreconditionError::GapCountMismatch {
                expected: 1,
                found: 0
            })
        );
        assert_eq!(
            assemble_canvas(&[solid(2, 2, 1.0), solid(2, 3, 1.0)], &[0]),
            Err(PreconditionError::HeightMismatch {
                expected: 2,
                found: 3
            })
        );
        // Pulling the second shape past the left edge
        assert_eq!(
            assemble_canvas(&[solid(2, 1, 1.0), solid(4, 1, 1.0)], &[3]),
            Err(PreconditionError::OutOfCanvas { index: 1 })
        );
    }
}
