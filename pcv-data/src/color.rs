//! Display colors for points.
//!
//! Points with explicit channels keep their color. Everything else, and every
//! point when coloring by id is forced, gets a pseudo-random color keyed by
//! its class id. The generator is seeded with a fixed constant so a class id
//! maps to the same color on every run.

use crate::types::Point;
use glam::DVec3;
use hashbrown::HashMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seed of the class color generator.
pub const CLASS_COLOR_SEED: u64 = 42;

/// Key shared by every point without a class id.
pub const UNLABELLED_CLASS: i64 = -1;

const PALETTE_CAPACITY: usize = 256;

/// Resolves the display color of points.
///
/// Each instance owns its generator and memo, so two resolvers built the same
/// way hand out the same colors in the same first-seen order.
#[derive(Debug, Clone)]
pub struct ColorResolver {
    rng: StdRng,
    palette: HashMap<i64, DVec3>,
}

impl ColorResolver {
    /// Create a resolver seeded with [`CLASS_COLOR_SEED`].
    pub fn new() -> Self {
        Self::with_seed(CLASS_COLOR_SEED)
    }

    /// Create a resolver with a custom seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            palette: HashMap::with_capacity(PALETTE_CAPACITY),
        }
    }

    /// Resolve the color of `point` in `[0, 1]`.
    pub fn resolve(&mut self, point: &Point, force_by_id: bool) -> DVec3 {
        if force_by_id || !point.has_color() {
            return self.class_color(point.class_id);
        }
        match infer_rgb(point.r, point.g, point.b) {
            Some([r, g, b]) => DVec3::new(r as f64, g as f64, b as f64) / 255.0,
            None => self.class_color(point.class_id),
        }
    }

    /// Color assigned to a class id, drawing a new one on first sight.
    pub fn class_color(&mut self, class_id: Option<i64>) -> DVec3 {
        let key = class_id.unwrap_or(UNLABELLED_CLASS);
        let rng = &mut self.rng;
        *self.palette.entry(key).or_insert_with(|| {
            DVec3::new(
                rng.gen_range(0.0..1.0),
                rng.gen_range(0.0..1.0),
                rng.gen_range(0.0..1.0),
            )
        })
    }

    /// Register the class ids of `points` in order without resolving anything.
    ///
    /// Priming with the canonical point list fixes every class color before a
    /// random subset is resolved, so sampling never reorders the palette.
    pub fn prime(&mut self, points: &[Point], force_by_id: bool) {
        for point in points {
            if force_by_id || !point.has_color() {
                self.class_color(point.class_id);
            }
        }
    }

    /// Number of class ids seen so far.
    pub fn known_classes(&self) -> usize {
        self.palette.len()
    }
}

impl Default for ColorResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Fill missing color channels from the ones that are present.
///
/// | present | result |
/// |---------|--------|
/// | r, g, b | (r, g, b) |
/// | r, g    | (r, g, g) |
/// | r, b    | (r, r, b) |
/// | g, b    | (b, g, b) |
/// | one     | grey from that channel |
/// | none    | `None` |
pub fn infer_rgb(r: Option<u8>, g: Option<u8>, b: Option<u8>) -> Option<[u8; 3]> {
    match (r, g, b) {
        (Some(r), Some(g), Some(b)) => Some([r, g, b]),
        (Some(r), Some(g), None) => Some([r, g, g]),
        (Some(r), None, Some(b)) => Some([r, r, b]),
        (None, Some(g), Some(b)) => Some([b, g, b]),
        (Some(v), None, None) | (None, Some(v), None) | (None, None, Some(v)) => Some([v, v, v]),
        (None, None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_unit_cube(c: DVec3) -> bool {
        (0.0..=1.0).contains(&c.x) && (0.0..=1.0).contains(&c.y) && (0.0..=1.0).contains(&c.z)
    }

    #[test]
    fn test_explicit_color_is_normalized() {
        let mut resolver = ColorResolver::new();
        let p = Point::new(0.0, 0.0, 0.0).with_rgb(255, 0, 51);
        assert_eq!(resolver.resolve(&p, false), DVec3::new(1.0, 0.0, 0.2));
        assert_eq!(resolver.known_classes(), 0);
    }

    #[test]
    fn test_partial_color_inference() {
        assert_eq!(infer_rgb(Some(1), Some(2), Some(3)), Some([1, 2, 3]));
        assert_eq!(infer_rgb(Some(1), Some(2), None), Some([1, 2, 2]));
        assert_eq!(infer_rgb(Some(1), None, Some(3)), Some([1, 1, 3]));
        assert_eq!(infer_rgb(None, Some(2), Some(3)), Some([3, 2, 3]));
        assert_eq!(infer_rgb(Some(9), None, None), Some([9, 9, 9]));
        assert_eq!(infer_rgb(None, Some(9), None), Some([9, 9, 9]));
        assert_eq!(infer_rgb(None, None, Some(9)), Some([9, 9, 9]));
        assert_eq!(infer_rgb(None, None, None), None);
    }

    #[test]
    fn test_partial_color_resolves_through_table() {
        let mut resolver = ColorResolver::new();
        let mut p = Point::new(0.0, 0.0, 0.0);
        p.g = Some(255);
        assert_eq!(resolver.resolve(&p, false), DVec3::ONE);
    }

    #[test]
    fn test_class_color_is_memoized() {
        let mut resolver = ColorResolver::new();
        let first = resolver.class_color(Some(3));
        let other = resolver.class_color(Some(4));
        assert_eq!(resolver.class_color(Some(3)), first);
        assert_ne!(first, other);
        assert_eq!(resolver.known_classes(), 2);
        assert!(in_unit_cube(first));
        assert!(in_unit_cube(other));
    }

    #[test]
    fn test_class_color_is_deterministic_across_resolvers() {
        let mut a = ColorResolver::new();
        let mut b = ColorResolver::new();
        for id in [5, -3, 5, 0, 12] {
            assert_eq!(a.class_color(Some(id)), b.class_color(Some(id)));
        }
    }

    #[test]
    fn test_colors_follow_first_seen_order() {
        let mut a = ColorResolver::new();
        let mut b = ColorResolver::new();
        let a1 = a.class_color(Some(1));
        let a2 = a.class_color(Some(2));
        let b2 = b.class_color(Some(2));
        let b1 = b.class_color(Some(1));
        // the n-th new id gets the n-th draw whatever its value
        assert_eq!(a1, b2);
        assert_eq!(a2, b1);
    }

    #[test]
    fn test_repeat_lookup_does_not_advance_generator() {
        let mut a = ColorResolver::new();
        let mut b = ColorResolver::new();
        a.class_color(Some(1));
        a.class_color(Some(1));
        a.class_color(Some(1));
        b.class_color(Some(1));
        assert_eq!(a.class_color(Some(2)), b.class_color(Some(2)));
    }

    #[test]
    fn test_unlabelled_points_share_a_color() {
        let mut resolver = ColorResolver::new();
        let p = Point::new(1.0, 2.0, 3.0);
        let q = Point::new(4.0, 5.0, 6.0);
        assert_eq!(resolver.resolve(&p, false), resolver.resolve(&q, false));
        assert_eq!(resolver.class_color(None), resolver.class_color(Some(UNLABELLED_CLASS)));
    }

    #[test]
    fn test_zero_class_is_not_unlabelled() {
        let mut resolver = ColorResolver::new();
        let unlabelled = resolver.class_color(None);
        let zero = resolver.class_color(Some(0));
        assert_ne!(unlabelled, zero);
    }

    #[test]
    fn test_priming_fixes_palette_order() {
        let canonical = [
            Point::new(0.0, 0.0, 0.0).with_class_id(1),
            Point::new(0.0, 0.0, 0.0).with_rgb(1, 2, 3).with_class_id(9),
            Point::new(0.0, 0.0, 0.0).with_class_id(2),
        ];
        let mut primed = ColorResolver::new();
        primed.prime(&canonical, false);
        assert_eq!(primed.known_classes(), 2);

        let mut reference = ColorResolver::new();
        let one = reference.class_color(Some(1));
        let two = reference.class_color(Some(2));
        // resolving the later class first no longer changes its color
        assert_eq!(primed.resolve(&canonical[2], false), two);
        assert_eq!(primed.resolve(&canonical[0], false), one);
    }

    #[test]
    fn test_force_by_id_ignores_explicit_color() {
        let mut resolver = ColorResolver::new();
        let p = Point::new(0.0, 0.0, 0.0).with_rgb(255, 255, 255).with_class_id(8);
        let forced = resolver.resolve(&p, true);
        assert_eq!(forced, resolver.class_color(Some(8)));
        assert_eq!(resolver.resolve(&p, false), DVec3::ONE);
    }
}
