//! Basic geometry primitives for planar survey coordinates.

mod point;
pub use point::Point;

/// Axis aligned rectangle in planar coordinates.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl BoundingBox {
    /// Creates a new bounding box. Returns `None` if a bound is not finite or
    /// the minimum exceeds the maximum on either axis.
    pub fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Option<Self> {
        let finite = [xmin, xmax, ymin, ymax].iter().all(|v| v.is_finite());
        if !finite || xmin > xmax || ymin > ymax {
            return None;
        }
        Some(Self {
            xmin,
            xmax,
            ymin,
            ymax,
        })
    }

    /// Smallest box enclosing every point. Returns `None` for an empty slice.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = Self {
            xmin: first.x,
            xmax: first.x,
            ymin: first.y,
            ymax: first.y,
        };
        for p in &points[1..] {
            bbox.xmin = bbox.xmin.min(p.x);
            bbox.xmax = bbox.xmax.max(p.x);
            bbox.ymin = bbox.ymin.min(p.y);
            bbox.ymax = bbox.ymax.max(p.y);
        }
        Some(bbox)
    }

    /// Returns a copy widened by `buffer` on every side.
    pub fn buffered(&self, buffer: f64) -> Self {
        Self {
            xmin: self.xmin - buffer,
            xmax: self.xmax + buffer,
            ymin: self.ymin - buffer,
            ymax: self.ymax + buffer,
        }
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Point) -> bool {
        self.xmin <= p.x && p.x <= self.xmax && self.ymin <= p.y && p.y <= self.ymax
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_rejects_inverted_bounds() {
        assert!(BoundingBox::new(10.0, 0.0, 0.0, 1.0).is_none());
        assert!(BoundingBox::new(0.0, 1.0, 0.0, f64::NAN).is_none());
        assert!(BoundingBox::new(0.0, 0.0, 0.0, 0.0).is_some());
    }

    #[test]
    fn bbox_contains_edges() {
        let b = BoundingBox::new(0.0, 10.0, 0.0, 5.0).unwrap();
        assert!(b.contains(Point::new(0.0, 0.0)));
        assert!(b.contains(Point::new(10.0, 5.0)));
        assert!(!b.contains(Point::new(10.0001, 5.0)));
        assert!(b.buffered(1.0).contains(Point::new(11.0, -1.0)));
    }

    #[test]
    fn bbox_from_points() {
        let pts = vec![Point::new(3.0, 1.0), Point::new(-1.0, 4.0), Point::new(2.0, 2.0)];
        let b = BoundingBox::from_points(&pts).unwrap();
        assert_eq!(b, BoundingBox::new(-1.0, 3.0, 1.0, 4.0).unwrap());
        assert!((b.width() - 4.0).abs() < 1e-9);
        assert!((b.height() - 3.0).abs() < 1e-9);
        assert!(BoundingBox::from_points(&[]).is_none());
    }
}
