use foundation::math::world_to_view_offset;
use raster::{FrameBuffer, Rect, SourceRect};
use streaming::TileSlot;

use crate::layer::{Layer, LayerContext, LayerId, ViewGeometry};
use crate::symbology::LayerStyle;

/// Pre-rendered tile bitmaps from the frame's tileset.
///
/// Only resolved tiles are drawn; pending and failed slots leave a gap. The
/// seam tile is drawn with its short extent and sampled from the matching
/// left part of its bitmap.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    id: LayerId,
    pub style: LayerStyle,
}

impl TileLayer {
    pub fn new(id: u64) -> Self {
        Self {
            id: LayerId(id),
            style: LayerStyle::default(),
        }
    }
}

/// Screen rectangle and bitmap region for one slot.
pub fn tile_placement(view: &ViewGeometry, slot: &TileSlot, bitmap_size: [u32; 2]) -> (Rect, SourceRect) {
    let stride = slot.key.world_size();
    let [ox, oy] = view.origin();
    let (x, w) = world_to_view_offset(view.world_offset.x, slot.origin.x, view.cell_size, stride);
    let (y, h) = world_to_view_offset(view.world_offset.y, slot.origin.y, view.cell_size, stride);

    let sample = |span: u32, size: u32| -> u32 {
        let px = (span as u64 * size as u64).div_ceil(stride.max(1) as u64);
        (px as u32).clamp(1, size.max(1))
    };
    let src = SourceRect {
        x: 0,
        y: 0,
        w: sample(slot.span[0], bitmap_size[0]),
        h: sample(slot.span[1], bitmap_size[1]),
    };
    (Rect::new(ox + x, oy + y, w, h), src)
}

impl Layer for TileLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn style(&self) -> &LayerStyle {
        &self.style
    }

    fn draw(&self, ctx: &LayerContext<'_>, target: &mut FrameBuffer) -> usize {
        let Some(tileset) = ctx.tileset else {
            return 0;
        };
        let mut drawn = 0;
        for slot in tileset.slots() {
            let Some(tile) = slot.entry.tile() else {
                continue;
            };
            let bitmap = &tile.bitmap;
            let (dst, src) = tile_placement(&ctx.view, slot, [bitmap.width(), bitmap.height()]);
            if target.draw_bitmap(bitmap, src, dst) > 0 {
                drawn += 1;
            }
        }
        drawn
    }
}

#[cfg(test)]
mod tests {
    use super::{TileLayer, tile_placement};
    use crate::layer::{Layer, LayerContext, ViewGeometry};
    use foundation::{Bounds, Coordinate};
    use pretty_assertions::assert_eq;
    use raster::{Bitmap, FrameBuffer, Rect, SourceRect};
    use streaming::{PixelStore, Tile, TileCacheEntry, TileKey, TileSlot, Tileset};

    fn slot(x: u32, span: u32, entry: TileCacheEntry) -> TileSlot {
        TileSlot {
            key: TileKey::new(1, 100, x, 0),
            origin: Coordinate::new(x, 0),
            span: [span, 100],
            entry,
        }
    }

    fn resolved(x: u32, color: [u8; 4]) -> TileCacheEntry {
        TileCacheEntry::Resolved(Tile {
            key: TileKey::new(1, 100, x, 0),
            bitmap: Bitmap::solid(100, 100, color),
        })
    }

    fn view(world_offset: Coordinate) -> ViewGeometry {
        ViewGeometry {
            width: 40,
            height: 20,
            cell_size: 0.2,
            pixel_offset: [0.0, 0.0],
            world_offset,
        }
    }

    #[test]
    fn seam_tile_is_short_and_abuts_the_tile_at_zero() {
        // World 4294967200 is local 0, so the seam tile covers local 0..96.
        let v = view(Coordinate::new(96, 0));
        let (seam_dst, seam_src) = tile_placement(&v, &slot(4_294_967_200, 96, TileCacheEntry::Pending), [100, 100]);
        let (zero_dst, zero_src) = tile_placement(&v, &slot(0, 100, TileCacheEntry::Pending), [100, 100]);

        assert!((seam_dst.x - 0.0).abs() < 1e-9);
        assert!((seam_dst.w - 96.0 * 0.2).abs() < 1e-9);
        assert!((zero_dst.x - (seam_dst.x + seam_dst.w)).abs() < 1e-9);
        assert!((zero_dst.w - 20.0).abs() < 1e-9);
        assert_eq!(seam_src, SourceRect { x: 0, y: 0, w: 96, h: 100 });
        assert_eq!(zero_src, SourceRect { x: 0, y: 0, w: 100, h: 100 });
    }

    #[test]
    fn only_resolved_tiles_are_drawn() {
        let red = [255, 0, 0, 255];
        let tileset = Tileset {
            tile_size: 100,
            scale_factor: 1,
            bounds: Bounds::from_corners(0, 0, 199, 99),
            tile_rows: vec![
                vec![slot(0, 100, resolved(0, red))],
                vec![slot(100, 100, TileCacheEntry::Failed)],
            ],
        };
        let pixels = PixelStore::new();
        let ctx = LayerContext {
            view: view(Coordinate::ORIGIN),
            tileset: Some(&tileset),
            pixels: &pixels,
            hovered: None,
        };
        let mut fb = FrameBuffer::new(40, 20);
        assert_eq!(TileLayer::new(2).draw(&ctx, &mut fb), 1);
        assert_eq!(fb.pixel(5, 5), Some(red));
        assert_eq!(fb.pixel(25, 5), Some([0, 0, 0, 0]));
        assert_eq!(
            tile_placement(&ctx.view, &tileset.tile_rows[1][0], [100, 100]).0,
            Rect::new(20.0, 0.0, 20.0, 20.0)
        );
    }
}
