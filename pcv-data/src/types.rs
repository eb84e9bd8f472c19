//! Core point type and its offset algebra.
//!
//! A [`Point`] always carries coordinates; color channels and the class id are
//! optional and stay unset unless a template captured them.

use glam::DVec3;
use std::cmp::Ordering;
use std::fmt;

/// A parsed point in 3D space.
///
/// Equality and ordering only look at the coordinates, so two points at the
/// same location compare equal whatever their color or class.
#[derive(Debug, Clone, Copy, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Red channel (0-255), if captured.
    pub r: Option<u8>,
    /// Green channel (0-255), if captured.
    pub g: Option<u8>,
    /// Blue channel (0-255), if captured.
    pub b: Option<u8>,
    /// Class label used for grouping and color-by-id.
    pub class_id: Option<i64>,
}

impl Point {
    /// Create an uncolored, unlabelled point.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            ..Self::default()
        }
    }

    /// Create an offset point from a source translation.
    ///
    /// Color and class channels are left unset so that [`Point::offset_by`]
    /// never overrides what the parsed point carries.
    pub fn offset(xyz: [f64; 3]) -> Self {
        Self::new(xyz[0], xyz[1], xyz[2])
    }

    /// Set all three color channels.
    pub fn with_rgb(mut self, r: u8, g: u8, b: u8) -> Self {
        self.r = Some(r);
        self.g = Some(g);
        self.b = Some(b);
        self
    }

    /// Set the class id.
    pub fn with_class_id(mut self, class_id: i64) -> Self {
        self.class_id = Some(class_id);
        self
    }

    /// Coordinates as a vector.
    pub fn xyz(&self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }

    /// Whether at least one color channel was captured.
    pub fn has_color(&self) -> bool {
        self.r.is_some() || self.g.is_some() || self.b.is_some()
    }

    /// Translate this point by `offset`.
    ///
    /// Coordinates are summed. Each color channel and the class id keep this
    /// point's value when set and fall back to the offset's otherwise.
    pub fn offset_by(&self, offset: &Point) -> Point {
        Point {
            x: self.x + offset.x,
            y: self.y + offset.y,
            z: self.z + offset.z,
            r: self.r.or(offset.r),
            g: self.g.or(offset.g),
            b: self.b.or(offset.b),
            class_id: self.class_id.or(offset.class_id),
        }
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y && self.z == other.z
    }
}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        (self.x, self.y, self.z).partial_cmp(&(other.x, other.y, other.z))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn channel<T: fmt::Display>(value: Option<T>) -> String {
            value.map_or_else(|| "-".to_string(), |v| v.to_string())
        }

        write!(
            f,
            "Point({}, {}, {}) @ {} | {}, {}, {}",
            self.x,
            self.y,
            self.z,
            channel(self.class_id),
            channel(self.r),
            channel(self.g),
            channel(self.b)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_creation() {
        let p = Point::new(1.0, 2.0, 3.0);
        assert_eq!(p.xyz(), DVec3::new(1.0, 2.0, 3.0));
        assert!(!p.has_color());
        assert_eq!(p.class_id, None);

        let origin = Point::default();
        assert_eq!(origin, Point::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_zero_channel_is_not_unset() {
        let p = Point::new(0.0, 0.0, 0.0).with_rgb(0, 0, 0).with_class_id(0);
        assert!(p.has_color());
        assert_eq!(p.r, Some(0));
        assert_eq!(p.class_id, Some(0));
    }

    #[test]
    fn test_offset_sums_coordinates() {
        let p = Point::new(1.0, 2.0, 3.0);
        let o = Point::new(2.0, 2.0, 2.0);
        assert_eq!(p.offset_by(&o), Point::new(3.0, 4.0, 5.0));
        assert_eq!(o.offset_by(&p), Point::new(3.0, 4.0, 5.0));
    }

    #[test]
    fn test_offset_prefers_left_channels() {
        let p = Point::new(1.0, 1.0, 1.0).with_rgb(10, 20, 30);
        let o = Point::new(0.0, 0.0, 0.0).with_rgb(1, 2, 3).with_class_id(7);

        let left = p.offset_by(&o);
        assert_eq!((left.r, left.g, left.b), (Some(10), Some(20), Some(30)));
        assert_eq!(left.class_id, Some(7));

        let right = o.offset_by(&p);
        assert_eq!((right.r, right.g, right.b), (Some(1), Some(2), Some(3)));
        assert_eq!(right.class_id, Some(7));
    }

    #[test]
    fn test_offset_keeps_unset_channels_unset() {
        let p = Point::new(1.0, 2.0, 3.0);
        let moved = p.offset_by(&Point::offset([10.0, 0.0, -1.0]));
        assert_eq!(moved, Point::new(11.0, 2.0, 2.0));
        assert!(!moved.has_color());
        assert_eq!(moved.class_id, None);
    }

    #[test]
    fn test_equality_ignores_color_and_id() {
        let a = Point::new(1.0, 2.0, 3.0).with_rgb(255, 0, 0).with_class_id(1);
        let b = Point::new(1.0, 2.0, 3.0).with_class_id(2);
        assert_eq!(a, b);
        assert_ne!(a, Point::new(1.0, 2.0, 3.5));
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let a = Point::new(0.0, 5.0, 5.0);
        let b = Point::new(1.0, 0.0, 0.0);
        let c = Point::new(1.0, 0.0, 1.0);
        assert!(a < b);
        assert!(b < c);
        assert_eq!(b.partial_cmp(&b.with_rgb(1, 1, 1)), Some(Ordering::Equal));
    }

    #[test]
    fn test_display() {
        let p = Point::new(1.0, 2.0, 3.0).with_class_id(4);
        assert_eq!(p.to_string(), "Point(1, 2, 3) @ 4 | -, -, -");
    }
}
