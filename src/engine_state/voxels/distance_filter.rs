//! # Distance Filter
//!
//! Precomputed chunk offsets of a square window, ordered nearest first, so the chunks
//! closest to the viewpoint are requested before the ones at the edge.

use cgmath::Vector3;

/// The `(2R + 1)²` offsets of a window of radius `R`, sorted by squared distance.
///
/// Ties keep scan order (x outer, z inner, both ascending) since the sort is stable.
#[derive(Debug, Clone)]
pub struct DistanceFilter {
    radius: i32,
    offsets: Vec<Vector3<i32>>,
}

impl DistanceFilter {
    pub fn new(radius: i32) -> Self {
        DistanceFilter {
            radius,
            offsets: Self::build(radius),
        }
    }

    fn build(radius: i32) -> Vec<Vector3<i32>> {
        let radius = radius.max(0);
        let side = (2 * radius + 1) as usize;
        let mut tagged = Vec::with_capacity(side * side);
        for dx in -radius..=radius {
            for dz in -radius..=radius {
                tagged.push((dx * dx + dz * dz, Vector3::new(dx, 0, dz)));
            }
        }
        tagged.sort_by_key(|(distance, _)| *distance);
        tagged.into_iter().map(|(_, offset)| offset).collect()
    }

    /// Rebuilds the offsets when `radius` differs from the current one.
    ///
    /// # Returns
    /// `true` if the offsets were rebuilt.
    pub fn update(&mut self, radius: i32) -> bool {
        if radius == self.radius {
            return false;
        }
        self.radius = radius;
        self.offsets = Self::build(radius);
        true
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    pub fn offsets(&self) -> &[Vector3<i32>] {
        &self.offsets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn squared(offset: &Vector3<i32>) -> i32 {
        offset.x * offset.x + offset.z * offset.z
    }

    #[test]
    fn offsets_cover_the_window_nearest_first() {
        let filter = DistanceFilter::new(3);
        let offsets = filter.offsets();
        assert_eq!(offsets.len(), 49);
        assert_eq!(offsets[0], Vector3::new(0, 0, 0));
        assert!(offsets.windows(2).all(|w| squared(&w[0]) <= squared(&w[1])));
        assert!(offsets.iter().all(|o| o.x.abs() <= 3 && o.z.abs() <= 3 && o.y == 0));
    }

    #[test]
    fn ties_keep_scan_order() {
        let filter = DistanceFilter::new(1);
        assert_eq!(
            &filter.offsets()[1..5],
            &[
                Vector3::new(-1, 0, 0),
                Vector3::new(0, 0, -1),
                Vector3::new(0, 0, 1),
                Vector3::new(1, 0, 0),
            ]
        );
    }

    #[test]
    fn update_rebuilds_only_on_change() {
        let mut filter = DistanceFilter::new(2);
        assert!(!filter.update(2));
        assert!(filter.update(0));
        assert_eq!(filter.offsets(), &[Vector3::new(0, 0, 0)]);
    }
}
