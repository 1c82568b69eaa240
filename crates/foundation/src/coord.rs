use core::fmt;

/// Side length of the torus world: both axes wrap modulo 2^32.
pub const WORLD_SIZE: u64 = 1 << 32;

/// Largest view-local distance treated as "on screen" before a value is read
/// as having wrapped around the seam.
pub const MAX_VIEW_SIZE: u64 = 1_000_000;

/// A point in torus world space.
///
/// Both axes are plain `u32`, so a coordinate can never leave `[0, M-1]`.
/// All arithmetic on coordinates goes through [`crate::math::modular`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coordinate {
    pub x: u32,
    pub y: u32,
}

impl Coordinate {
    pub const ORIGIN: Coordinate = Coordinate { x: 0, y: 0 };

    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    pub const fn to_array(self) -> [u32; 2] {
        [self.x, self.y]
    }
}

impl From<[u32; 2]> for Coordinate {
    fn from([x, y]: [u32; 2]) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// A cell index relative to the top-left of the viewport.
///
/// Local cells are not wrapped; they only become world coordinates once a
/// world offset is applied.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct LocalCell {
    pub x: i64,
    pub y: i64,
}

impl LocalCell {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Signed cell difference `self - other`.
    ///
    /// Wraps at the ends of `i64`, which leaves the difference unchanged modulo M.
    pub const fn delta_from(self, other: LocalCell) -> CellDelta {
        CellDelta {
            x: self.x.wrapping_sub(other.x),
            y: self.y.wrapping_sub(other.y),
        }
    }
}

/// A signed pan amount in whole cells. Stays signed until combined with a
/// [`Coordinate`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct CellDelta {
    pub x: i64,
    pub y: i64,
}

impl CellDelta {
    pub const ZERO: CellDelta = CellDelta { x: 0, y: 0 };

    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub const fn is_zero(self) -> bool {
        self.x == 0 && self.y == 0
    }
}

impl core::ops::Add for CellDelta {
    type Output = CellDelta;

    fn add(self, rhs: CellDelta) -> CellDelta {
        CellDelta {
            x: self.x.wrapping_add(rhs.x),
            y: self.y.wrapping_add(rhs.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CellDelta, Coordinate, LocalCell, WORLD_SIZE};

    #[test]
    fn coordinate_covers_the_full_torus() {
        let last = Coordinate::new(u32::MAX, u32::MAX);
        assert_eq!(last.x as u64 + 1, WORLD_SIZE);
        assert_eq!(last.to_string(), "4294967295,4294967295");
    }

    #[test]
    fn local_cell_delta_is_signed() {
        let a = LocalCell::new(2, 10);
        let b = LocalCell::new(5, 4);
        assert_eq!(a.delta_from(b), CellDelta::new(-3, 6));
        assert_eq!(CellDelta::new(1, 1) + CellDelta::new(-1, -1), CellDelta::ZERO);
    }
}
