//! Modular coordinate math over the torus `M = 2^32`.
//!
//! Every conversion between world space, the world offset (pan state), the
//! sub-cell pixel offset and screen pixels goes through here, so the
//! wraparound rule lives in one place. All functions are total over the full
//! `u32` domain.
//!
//! Conventions:
//! - `world = local - world_offset (mod M)`; `local = world + world_offset (mod M)`.
//! - The sub-cell shift of a pixel offset `p` is `p == 0 ? 0 : p - cell_size`,
//!   always in `(-cell_size, 0]`. Local cell 0 starts at that screen position.

use crate::coord::{CellDelta, Coordinate, LocalCell, MAX_VIEW_SIZE, WORLD_SIZE};

const M: i64 = WORLD_SIZE as i64;

#[inline]
fn wrap(v: i64) -> u32 {
    v.rem_euclid(M) as u32
}

/// `(offset + delta) mod M` for any `delta`, reducing first so the sum cannot overflow.
#[inline]
fn offset_by(offset: u32, delta: i64) -> u32 {
    wrap(offset as i64 + delta.rem_euclid(M))
}

/// Size of one cell in screen pixels.
///
/// Callers clamp `zoom` to a positive minimum, so this never returns 0.
#[inline]
pub fn cell_size(zoom: f64, zoom_factor: f64) -> f64 {
    debug_assert!(zoom > 0.0 && zoom_factor > 0.0);
    zoom / zoom_factor
}

/// Screen position at which local cell 0 starts, given a pixel offset.
///
/// The zero case is special: without it an extra row/column shows at the origin.
#[inline]
pub fn sub_cell_shift(pixel_offset: f64, cell_size: f64) -> f64 {
    if pixel_offset == 0.0 {
        0.0
    } else {
        pixel_offset - cell_size
    }
}

#[inline]
fn cell_on_axis(cell_size: f64, pixel_offset: f64, screen: f64) -> i64 {
    ((screen - sub_cell_shift(pixel_offset, cell_size)) / cell_size).floor() as i64
}

/// Local (unwrapped) cell under a screen position.
pub fn cell_for_viewport_position(
    zoom: f64,
    zoom_factor: f64,
    pixel_offset: [f64; 2],
    screen: [f64; 2],
) -> LocalCell {
    let cs = cell_size(zoom, zoom_factor);
    LocalCell::new(
        cell_on_axis(cs, pixel_offset[0], screen[0]),
        cell_on_axis(cs, pixel_offset[1], screen[1]),
    )
}

/// Local/view cell to world coordinate: `(local - world_offset) mod M`.
pub fn apply_world_offset(world_offset: Coordinate, local: LocalCell) -> Coordinate {
    Coordinate::new(
        wrap(local.x.rem_euclid(M) - world_offset.x as i64),
        wrap(local.y.rem_euclid(M) - world_offset.y as i64),
    )
}

/// World coordinate to view cell: `(world + world_offset) mod M`.
///
/// Exact inverse of [`apply_world_offset`] for every local cell in `[0, M)`.
pub fn world_to_view(world_offset: Coordinate, world: Coordinate) -> Coordinate {
    Coordinate::new(
        world.x.wrapping_add(world_offset.x),
        world.y.wrapping_add(world_offset.y),
    )
}

/// Pan the world offset by a signed cell delta: `(world_offset + delta + M) mod M`.
pub fn update_world_offset(world_offset: Coordinate, delta: CellDelta) -> Coordinate {
    Coordinate::new(
        offset_by(world_offset.x, delta.x),
        offset_by(world_offset.y, delta.y),
    )
}

/// Signed reading of a view coordinate.
///
/// Anything further than [`MAX_VIEW_SIZE`] from the origin can only be on
/// screen by having wrapped, so it is read as `v - M`.
#[inline]
pub fn view_axis(v: u32) -> i64 {
    if v as u64 > MAX_VIEW_SIZE {
        v as i64 - M
    } else {
        v as i64
    }
}

/// Width measured from `begin` to `end`, crossing the seam when `end < begin`.
#[inline]
pub fn wrapping_extent(begin: u32, end: u32) -> u64 {
    if end >= begin {
        (end - begin) as u64
    } else {
        WORLD_SIZE - begin as u64 + end as u64
    }
}

/// Snap `v` down to a multiple of `stride`.
#[inline]
pub fn snap_down(v: u32, stride: u32) -> u32 {
    debug_assert!(stride > 0);
    v - v % stride
}

/// World-space width of the tile starting at `origin`: `stride`, except at the
/// seam where only `M - origin` cells remain before wrapping to 0.
#[inline]
pub fn seam_span(origin: u32, stride: u32) -> u32 {
    let remaining = WORLD_SIZE - origin as u64;
    remaining.min(stride as u64) as u32
}

/// Project one axis of a tile into view pixels.
///
/// Returns `(offset, extent)`: the distance in pixels from the start of local
/// cell 0 to the tile's first cell, and the drawn width. A tile reaching past
/// `M` is the short seam tile; its extent loses `tile_size - (M - world)` cells.
pub fn world_to_view_offset(
    world_offset: u32,
    world: u32,
    scale: f64,
    tile_size: u32,
) -> (f64, f64) {
    let view = view_axis(world.wrapping_add(world_offset));
    let mut span = tile_size as u64;
    if world as u64 + tile_size as u64 >= WORLD_SIZE {
        span -= tile_size as u64 - (WORLD_SIZE - world as u64);
    }
    (view as f64 * scale, span as f64 * scale)
}

/// Incremental pan by a screen delta on one axis.
///
/// `delta_px` is `last_pointer - pointer`, the camera motion since the previous
/// event. Whole cells carry into the world offset; the remainder stays in the
/// pixel offset. Returns `(pixel_offset, world_offset)`.
pub fn apply_pan_axis(
    pixel_offset: f64,
    world_offset: u32,
    delta_px: f64,
    cell_size: f64,
) -> (f64, u32) {
    if !(cell_size > 0.0) || !delta_px.is_finite() {
        return (pixel_offset, world_offset);
    }
    let shifted = sub_cell_shift(pixel_offset, cell_size) - delta_px;
    let carry = (shifted / cell_size).ceil();
    let remainder = shifted - carry * cell_size;

    // `carry` is integral, so its remainder is exact and fits in i64.
    let world_offset = offset_by(world_offset, carry.rem_euclid(M as f64) as i64);
    let pixel_offset = if remainder == 0.0 || remainder.abs() < f64::EPSILON * cell_size {
        0.0
    } else {
        remainder + cell_size
    };
    (pixel_offset, world_offset)
}

/// Both axes of [`apply_pan_axis`].
pub fn apply_pan(
    pixel_offset: [f64; 2],
    world_offset: Coordinate,
    delta_px: [f64; 2],
    cell_size: f64,
) -> ([f64; 2], Coordinate) {
    let (px, wx) = apply_pan_axis(pixel_offset[0], world_offset.x, delta_px[0], cell_size);
    let (py, wy) = apply_pan_axis(pixel_offset[1], world_offset.y, delta_px[1], cell_size);
    ([px, py], Coordinate::new(wx, wy))
}

#[cfg(test)]
mod tests {
    use super::{
        apply_pan, apply_world_offset, cell_for_viewport_position, cell_size, seam_span, snap_down,
        update_world_offset, view_axis, world_to_view, world_to_view_offset, wrapping_extent,
    };
    use crate::coord::{CellDelta, Coordinate, LocalCell, WORLD_SIZE};

    #[test]
    fn cell_size_is_zoom_over_factor() {
        assert_eq!(cell_size(100.0, 100.0), 1.0);
        assert_eq!(cell_size(4.0, 2.0), 2.0);
    }

    #[test]
    fn cell_for_position_at_origin_is_origin() {
        for zoom in [5.0, 100.0, 333.0, 5000.0] {
            let c = cell_for_viewport_position(zoom, 100.0, [0.0, 0.0], [0.0, 0.0]);
            assert_eq!(c, LocalCell::new(0, 0));
        }
    }

    #[test]
    fn cell_for_position_uses_sub_cell_shift() {
        // cell size 2, offset 10 -> shift 8: (50 - 8) / 2 = 21
        let c = cell_for_viewport_position(4.0, 2.0, [10.0, 10.0], [50.0, 50.0]);
        assert_eq!(c, LocalCell::new(21, 21));

        // cell size 10, offset 4 -> shift -6: screen 0 falls in cell 0, screen 3 in cell 0,
        // screen 4 starts cell 1
        let c = cell_for_viewport_position(1000.0, 100.0, [4.0, 0.0], [3.9, 0.0]);
        assert_eq!(c.x, 0);
        let c = cell_for_viewport_position(1000.0, 100.0, [4.0, 0.0], [4.0, 0.0]);
        assert_eq!(c.x, 1);
    }

    #[test]
    fn apply_world_offset_wraps_instead_of_going_negative() {
        let wo = Coordinate::new(100, 200);
        assert_eq!(
            apply_world_offset(wo, LocalCell::new(150, 250)),
            Coordinate::new(50, 50)
        );
        assert_eq!(
            apply_world_offset(wo, LocalCell::new(0, 0)),
            Coordinate::new(u32::MAX - 99, u32::MAX - 199)
        );
    }

    #[test]
    fn world_to_view_inverts_apply_world_offset() {
        let wo = Coordinate::new(7, u32::MAX);
        let local = Coordinate::new(u32::MAX - 3, 12);
        let world = apply_world_offset(wo, LocalCell::new(local.x as i64, local.y as i64));
        assert_eq!(world_to_view(wo, world), local);
    }

    #[test]
    fn update_world_offset_handles_signed_deltas() {
        assert_eq!(
            update_world_offset(Coordinate::new(100, 200), CellDelta::new(10, -20)),
            Coordinate::new(110, 180)
        );
        assert_eq!(
            update_world_offset(Coordinate::new(0, u32::MAX), CellDelta::new(-1, 1)),
            Coordinate::new(u32::MAX, 0)
        );
    }

    #[test]
    fn view_axis_reads_large_values_as_negative() {
        assert_eq!(view_axis(1_000_000), 1_000_000);
        assert_eq!(view_axis(u32::MAX), -1);
        assert_eq!(view_axis(u32::MAX - 99), -100);
    }

    #[test]
    fn wrapping_extent_measures_across_the_seam() {
        assert_eq!(wrapping_extent(10, 30), 20);
        assert_eq!(wrapping_extent(u32::MAX, 0), 1);
        assert_eq!(wrapping_extent(4_294_967_200, 100), 96 + 100);
    }

    #[test]
    fn seam_tile_is_short() {
        let seam = snap_down(u32::MAX, 100);
        assert_eq!(seam, 4_294_967_200);
        assert_eq!(seam_span(seam, 100) as u64, WORLD_SIZE % 100);
        assert_eq!(seam_span(seam - 100, 100), 100);
    }

    #[test]
    fn seam_tile_abuts_the_tile_at_zero() {
        let wo = 150;
        let (seam_left, seam_width) = world_to_view_offset(wo, 4_294_967_200, 2.0, 100);
        let (zero_left, zero_width) = world_to_view_offset(wo, 0, 2.0, 100);
        assert_eq!(seam_width, 96.0 * 2.0);
        assert_eq!(zero_width, 200.0);
        assert_eq!(seam_left + seam_width, zero_left);
        assert_eq!(zero_left, 300.0);
    }

    #[test]
    fn tiles_left_of_the_view_project_negative() {
        let (left, width) = world_to_view_offset(0, u32::MAX - 199, 1.0, 100);
        assert_eq!(left, -200.0);
        assert_eq!(width, 100.0);
    }

    #[test]
    fn full_cell_pan_leaves_pixel_offset_unchanged() {
        let (po, wo) = apply_pan([0.0, 0.0], Coordinate::new(0, 5), [4.0, 0.0], 4.0);
        assert_eq!(po, [0.0, 0.0]);
        assert_eq!(wo, Coordinate::new(u32::MAX, 5));

        let (po, wo) = apply_pan([1.5, 0.0], Coordinate::new(10, 0), [-4.0, 0.0], 4.0);
        assert_eq!(po, [1.5, 0.0]);
        assert_eq!(wo, Coordinate::new(11, 0));
    }

    #[test]
    fn sub_cell_pan_moves_pixel_offset() {
        // Camera moves left by one pixel: content shifts right by one pixel.
        let (po, wo) = apply_pan([0.0, 0.0], Coordinate::new(0, 0), [-1.0, 0.0], 4.0);
        assert_eq!(po, [1.0, 0.0]);
        assert_eq!(wo, Coordinate::new(1, 0));

        // Cell under the screen origin is preserved in world space.
        let before = apply_world_offset(
            Coordinate::new(0, 0),
            cell_for_viewport_position(400.0, 100.0, [0.0, 0.0], [1.0, 0.0]),
        );
        let after = apply_world_offset(
            wo,
            cell_for_viewport_position(400.0, 100.0, po, [2.0, 0.0]),
        );
        assert_eq!(before, after);
    }

    #[test]
    fn incremental_pans_compose() {
        let start = ([0.0, 0.0], Coordinate::new(3, 3));
        let (po, wo) = apply_pan(start.0, start.1, [1.0, -2.0], 4.0);
        let (po, wo) = apply_pan(po, wo, [6.0, -3.0], 4.0);
        let (po2, wo2) = apply_pan(start.0, start.1, [7.0, -5.0], 4.0);
        assert_eq!(po, po2);
        assert_eq!(wo, wo2);
    }

    #[test]
    fn degenerate_cell_size_is_ignored() {
        let (po, wo) = apply_pan([1.0, 1.0], Coordinate::new(2, 2), [5.0, 5.0], 0.0);
        assert_eq!(po, [1.0, 1.0]);
        assert_eq!(wo, Coordinate::new(2, 2));
    }

    #[test]
    fn extreme_operands_wrap_instead_of_overflowing() {
        // i64::MIN is a multiple of M; i64::MAX is -1 modulo M.
        assert_eq!(
            apply_world_offset(Coordinate::new(1, 0), LocalCell::new(i64::MIN, i64::MAX)),
            Coordinate::new(u32::MAX, u32::MAX)
        );
        assert_eq!(
            update_world_offset(Coordinate::new(1, 0), CellDelta::new(i64::MAX, i64::MIN)),
            Coordinate::new(0, 0)
        );

        let far = cell_for_viewport_position(100.0, 100.0, [0.0, 0.0], [f64::INFINITY, f64::NEG_INFINITY]);
        assert_eq!(far, LocalCell::new(i64::MAX, i64::MIN));
        assert_eq!(far.delta_from(LocalCell::new(0, 1)), CellDelta::new(i64::MAX, i64::MAX));

        // 1e300 cells is a multiple of M, so the pan lands where it started.
        let (po, wo) = apply_pan([0.0, 0.0], Coordinate::new(7, 7), [1e300, -1e300], 1.0);
        assert_eq!(po, [0.0, 0.0]);
        assert_eq!(wo, Coordinate::new(7, 7));
    }
}
