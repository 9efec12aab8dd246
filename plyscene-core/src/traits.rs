//! Core traits for plyscene

use crate::geometry::{Point3f, RawGeometry};

/// Trait for drawable/renderable objects
pub trait Drawable {
    /// Get the bounding box of the object
    fn bounding_box(&self) -> (Point3f, Point3f);

    /// Get the center point of the object
    fn center(&self) -> Point3f {
        let (min, max) = self.bounding_box();
        nalgebra::center(&min, &max)
    }

    /// Get the extent of the bounding box along each axis
    fn size(&self) -> (f32, f32, f32) {
        let (min, max) = self.bounding_box();
        (max.x - min.x, max.y - min.y, max.z - min.z)
    }
}

impl Drawable for RawGeometry {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        let Some(first) = self.positions.first() else {
            return (Point3f::origin(), Point3f::origin());
        };

        let mut min = *first;
        let mut max = *first;

        for p in &self.positions {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);

            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        (min, max)
    }
}

/// A resource that holds backend-side allocations until released
pub trait Disposable {
    /// Release held resources. Calling it twice must be harmless.
    fn dispose(&mut self);

    fn is_disposed(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_and_center() {
        let geometry = RawGeometry::from_positions(vec![
            Point3f::new(-1.0, 0.0, 2.0),
            Point3f::new(3.0, -2.0, 4.0),
            Point3f::new(0.0, 6.0, 3.0),
        ]);

        let (min, max) = geometry.bounding_box();
        assert_eq!(min, Point3f::new(-1.0, -2.0, 2.0));
        assert_eq!(max, Point3f::new(3.0, 6.0, 4.0));
        assert_eq!(geometry.center(), Point3f::new(1.0, 2.0, 3.0));
        assert_eq!(geometry.size(), (4.0, 8.0, 2.0));
    }

    #[test]
    fn test_empty_bounding_box_is_origin() {
        let geometry = RawGeometry::default();
        assert_eq!(geometry.bounding_box(), (Point3f::origin(), Point3f::origin()));
    }
}
