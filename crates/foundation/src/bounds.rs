use crate::coord::{Coordinate, WORLD_SIZE};
use crate::math::modular::wrapping_extent;

/// Axis-aligned rectangle in torus world space, inclusive on both corners.
///
/// `bottom_right.x < top_left.x` (or the same on y) is valid and means the
/// rectangle crosses the seam at `M-1 -> 0` on that axis.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bounds {
    pub top_left: Coordinate,
    pub bottom_right: Coordinate,
}

impl Bounds {
    pub const fn new(top_left: Coordinate, bottom_right: Coordinate) -> Self {
        Self {
            top_left,
            bottom_right,
        }
    }

    pub const fn from_corners(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            top_left: Coordinate::new(left, top),
            bottom_right: Coordinate::new(right, bottom),
        }
    }

    pub const fn wraps_x(&self) -> bool {
        self.bottom_right.x < self.top_left.x
    }

    pub const fn wraps_y(&self) -> bool {
        self.bottom_right.y < self.top_left.y
    }

    /// Horizontal distance from the left to the right edge, measured across the
    /// seam when the rectangle wraps.
    pub fn width(&self) -> u64 {
        wrapping_extent(self.top_left.x, self.bottom_right.x)
    }

    pub fn height(&self) -> u64 {
        wrapping_extent(self.top_left.y, self.bottom_right.y)
    }

    pub fn contains(&self, c: Coordinate) -> bool {
        axis_contains(self.top_left.x, self.bottom_right.x, c.x)
            && axis_contains(self.top_left.y, self.bottom_right.y, c.y)
    }

    /// Split into non-wrapping rectangles for sources that cannot query across
    /// the seam. Returns one, two or four parts.
    pub fn split_wrapping(&self) -> Vec<Bounds> {
        let xs = split_axis(self.top_left.x, self.bottom_right.x);
        let ys = split_axis(self.top_left.y, self.bottom_right.y);

        let mut parts = Vec::with_capacity(xs.len() * ys.len());
        for &(top, bottom) in &ys {
            for &(left, right) in &xs {
                parts.push(Bounds::from_corners(left, top, right, bottom));
            }
        }
        parts
    }
}

fn axis_contains(begin: u32, end: u32, v: u32) -> bool {
    if end >= begin {
        v >= begin && v <= end
    } else {
        v >= begin || v <= end
    }
}

fn split_axis(begin: u32, end: u32) -> Vec<(u32, u32)> {
    if end >= begin {
        vec![(begin, end)]
    } else {
        vec![(begin, (WORLD_SIZE - 1) as u32), (0, end)]
    }
}

#[cfg(test)]
mod tests {
    use super::Bounds;
    use crate::coord::Coordinate;

    #[test]
    fn non_wrapping_bounds_stay_whole() {
        let b = Bounds::from_corners(10, 20, 30, 40);
        assert!(!b.wraps_x() && !b.wraps_y());
        assert_eq!(b.split_wrapping(), vec![b]);
        assert_eq!(b.width(), 20);
        assert_eq!(b.height(), 20);
    }

    #[test]
    fn wrapping_on_x_splits_in_two() {
        let b = Bounds::from_corners(4_294_967_200, 0, 50, 50);
        assert!(b.wraps_x());
        assert_eq!(
            b.split_wrapping(),
            vec![
                Bounds::from_corners(4_294_967_200, 0, u32::MAX, 50),
                Bounds::from_corners(0, 0, 50, 50),
            ]
        );
        assert_eq!(b.width(), 96 + 50);
    }

    #[test]
    fn wrapping_on_both_axes_splits_in_four() {
        let b = Bounds::from_corners(u32::MAX - 9, u32::MAX - 9, 9, 9);
        let parts = b.split_wrapping();
        assert_eq!(parts.len(), 4);
        for part in &parts {
            assert!(!part.wraps_x() && !part.wraps_y());
        }
        assert!(parts.contains(&Bounds::from_corners(0, 0, 9, 9)));
        assert!(parts.contains(&Bounds::from_corners(u32::MAX - 9, u32::MAX - 9, u32::MAX, u32::MAX)));
    }

    #[test]
    fn contains_respects_the_seam() {
        let b = Bounds::from_corners(u32::MAX - 1, 0, 1, 0);
        assert!(b.contains(Coordinate::new(u32::MAX, 0)));
        assert!(b.contains(Coordinate::new(0, 0)));
        assert!(!b.contains(Coordinate::new(2, 0)));
    }
}
