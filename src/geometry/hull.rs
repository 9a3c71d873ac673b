//! Convex hulls of raster and vector shapes

use kurbo::Point;

use super::raster::{fill_pixel_polygon, Coverage};

/// Convex hull of a point set, by dimension
#[derive(Debug, Clone, PartialEq)]
pub enum Hull {
    Empty,
    Point(Point),
    Segment(Point, Point),
    /// Counter-clockwise in a y-up frame, no repeated or collinear vertices
    Polygon(Vec<Point>),
}

impl Hull {
    pub fn from_points(points: &[Point]) -> Self {
        let hull = convex_hull(points);
        match hull.len() {
            0 => Hull::Empty,
            1 => Hull::Point(hull[0]),
            2 => Hull::Segment(hull[0], hull[1]),
            _ => Hull::Polygon(hull),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Hull::Empty)
    }

    pub fn vertices(&self) -> Vec<Point> {
        match self {
            Hull::Empty => Vec::new(),
            Hull::Point(p) => vec![*p],
            Hull::Segment(a, b) => vec![*a, *b],
            Hull::Polygon(points) => points.clone(),
        }
    }
}

fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a - o).cross(b - o)
}

/// Andrew's monotone chain. Collinear points are dropped, so a degenerate
/// input yields one or two points.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut sorted: Vec<Point> = points
        .iter()
        .copied()
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .collect();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup();
    if sorted.len() < 3 {
        return sorted;
    }

    let mut lower: Vec<Point> = Vec::new();
    for &p in &sorted {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }
    let mut upper: Vec<Point> = Vec::new();
    for &p in sorted.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Fill the convex hull of a raster shape.
///
/// The hull is taken over the corners of every pixel with coverage above
/// zero; the result marks those pixels plus every pixel whose centre falls
/// inside the hull.
pub fn raster_hull(coverage: &Coverage) -> Coverage {
    let (width, height) = (coverage.width(), coverage.height());
    let mut corners = Vec::new();
    for row in 0..height {
        let (Some(left), Some(right)) = (
            coverage.leftmost_nonzero(row),
            coverage.rightmost_nonzero(row),
        ) else {
            continue;
        };
        let (top, bottom) = (row as f64, row as f64 + 1.0);
        let (left, right) = (left as f64, right as f64 + 1.0);
        corners.extend([
            Point::new(left, top),
            Point::new(left, bottom),
            Point::new(right, top),
            Point::new(right, bottom),
        ]);
    }

    // Corners of at least one pixel always span a proper polygon
    let hull = convex_hull(&corners);
    let mut filled = fill_pixel_polygon(&hull, width, height);
    filled.overlay(coverage, 1.0);
    filled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hull_of_square_with_interior_points() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 2.0),
            Point::new(1.0, 0.0),
        ];
        let hull = convex_hull(&points);
        assert_eq!(
            hull,
            vec![
                Point::new(0.0, 0.0),
                Point::new(2.0, 0.0),
                Point::new(2.0, 2.0),
                Point::new(0.0, 2.0),
            ]
        );
    }

    #[test]
    fn degenerate_inputs() {
        assert_eq!(Hull::from_points(&[]), Hull::Empty);
        let p = Point::new(3.0, 4.0);
        assert_eq!(Hull::from_points(&[p, p]), Hull::Point(p));
        let line = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 2.0),
        ];
        assert_eq!(
            Hull::from_points(&line),
            Hull::Segment(Point::new(0.0, 0.0), Point::new(2.0, 2.0))
        );
    }

    #[test]
    fn raster_hull_fills_the_gap_of_an_l_shape() {
        let rows: Vec<Vec<f32>> = vec![
            vec![1.0, 0.0, 0.0, 0.0],
            vec![1.0, 0.0, 0.0, 0.0],
            vec![1.0, 0.0, 0.0, 0.0],
            vec![1.0, 1.0, 1.0, 1.0],
        ];
        let shape = Coverage::from_rows(&rows).unwrap();
        let hull = raster_hull(&shape);
        // Diagonal from (1,0) to (4,3) passes through pixel centres on it
        assert_eq!(hull.row(0), &[1.0, 1.0, 0.0, 0.0]);
        assert_eq!(hull.row(1), &[1.0, 1.0, 1.0, 0.0]);
        assert_eq!(hull.row(3), &[1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn raster_hull_keeps_shape_and_is_binary() {
        let rows: Vec<Vec<f32>> = vec![
            vec![0.0, 0.3, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.7, 0.0],
        ];
        let shape = Coverage::from_rows(&rows).unwrap();
        let hull = raster_hull(&shape);
        assert_eq!((hull.width(), hull.height()), (5, 3));
        assert!(hull.values().iter().all(|&v| v == 0.0 || v == 1.0));
        for row in 0..3 {
            for col in 0..5 {
                if shape.get(row, col) > 0.0 {
                    assert_eq!(hull.get(row, col), 1.0);
                }
            }
        }
        assert!(hull.count_nonzero() >= shape.count_nonzero());
    }

    #[test]
    fn raster_hull_of_blank_grid_is_blank() {
        let hull = raster_hull(&Coverage::new(6, 4));
        assert_eq!(hull.count_nonzero(), 0);
    }

    #[test]
    fn raster_hull_of_a_rectangle_is_the_rectangle() {
        let shape = Coverage::from_fn(6, 5, |row, col| {
            if (1..4).contains(&row) && (2..5).contains(&col) {
                1.0
            } else {
                0.0
            }
        });
        assert_eq!(raster_hull(&shape), shape);
    }
}
