//! Bounding boxes and overlap metrics

/// Axis-aligned box in pixel space: top-left corner plus size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Valid boxes have a non-zero width and height.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Exclusive right edge
    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    /// Overlap area with `other`.
    pub fn intersection_area(&self, other: &BoundingBox) -> u64 {
        let left = self.x.max(other.x) as u64;
        let top = self.y.max(other.y) as u64;
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return 0;
        }
        (right - left) * (bottom - top)
    }

    /// Intersection-over-Union in [0, 1]; 0 for invalid or disjoint boxes.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        if !self.is_valid() || !other.is_valid() {
            return 0.0;
        }
        let inter = self.intersection_area(other);
        if inter == 0 {
            return 0.0;
        }
        let union = self.area() + other.area() - inter;
        if union == 0 {
            return 0.0;
        }
        (inter as f64 / union as f64) as f32
    }

    /// min(area) / max(area); 0 when either box is empty.
    pub fn area_ratio(&self, other: &BoundingBox) -> f32 {
        let a = self.area();
        let b = other.area();
        let max = a.max(b);
        if max == 0 {
            return 0.0;
        }
        (a.min(b) as f64 / max as f64) as f32
    }

    /// As `[x, y, width, height]`
    pub fn to_array(&self) -> [u32; 4] {
        [self.x, self.y, self.width, self.height]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_iou_identity() {
        let b = BoundingBox::new(10, 20, 30, 40);
        assert_eq!(b.iou(&b), 1.0);
    }

    #[test]
    fn test_iou_disjoint_and_touching() {
        let a = BoundingBox::new(0, 0, 10, 10);
        let far = BoundingBox::new(50, 50, 10, 10);
        let touching = BoundingBox::new(10, 0, 10, 10);
        assert_eq!(a.iou(&far), 0.0);
        assert_eq!(a.iou(&touching), 0.0);
    }

    #[test]
    fn test_iou_partial() {
        let a = BoundingBox::new(0, 0, 10, 10);
        let b = BoundingBox::new(5, 0, 10, 10);
        // inter 50, union 150
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_box() {
        let empty = BoundingBox::new(0, 0, 0, 10);
        assert!(!empty.is_valid());
        assert_eq!(empty.iou(&empty), 0.0);
        assert_eq!(empty.area_ratio(&BoundingBox::new(0, 0, 5, 5)), 0.0);
    }

    #[test]
    fn test_area_ratio() {
        let a = BoundingBox::new(0, 0, 10, 10);
        let b = BoundingBox::new(100, 100, 20, 10);
        assert!((a.area_ratio(&b) - 0.5).abs() < 1e-6);
        assert!((b.area_ratio(&a) - 0.5).abs() < 1e-6);
    }

    fn valid_box() -> impl Strategy<Value = BoundingBox> {
        (0u32..2000, 0u32..2000, 1u32..2000, 1u32..2000)
            .prop_map(|(x, y, w, h)| BoundingBox::new(x, y, w, h))
    }

    proptest! {
        #[test]
        fn iou_of_box_with_itself_is_one(b in valid_box()) {
            prop_assert!((b.iou(&b) - 1.0).abs() < 1e-6);
        }

        #[test]
        fn iou_is_symmetric_and_bounded(a in valid_box(), b in valid_box()) {
            let ab = a.iou(&b);
            prop_assert!((ab - b.iou(&a)).abs() < 1e-6);
            prop_assert!((0.0..=1.0).contains(&ab));
        }

        #[test]
        fn iou_of_horizontally_disjoint_boxes_is_zero(a in valid_box(), gap in 0u32..100, w in 1u32..500, h in 1u32..500) {
            let b = BoundingBox::new(a.x + a.width + gap, a.y, w, h);
            prop_assert_eq!(a.iou(&b), 0.0);
        }
    }
}
