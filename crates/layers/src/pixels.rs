use raster::{FrameBuffer, opaque_from_packed};

use crate::layer::{Layer, LayerContext, LayerId};
use crate::symbology::LayerStyle;

/// Individually coloured cells from the pixel store, painted opaque.
/// Cells with no data are left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelLayer {
    id: LayerId,
    pub style: LayerStyle,
}

impl PixelLayer {
    pub fn new(id: u64) -> Self {
        Self {
            id: LayerId(id),
            style: LayerStyle::default(),
        }
    }
}

impl Layer for PixelLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn style(&self) -> &LayerStyle {
        &self.style
    }

    fn draw(&self, ctx: &LayerContext<'_>, target: &mut FrameBuffer) -> usize {
        if ctx.pixels.is_empty() {
            return 0;
        }
        let mut drawn = 0;
        for (local, world) in ctx.view.visible_cells() {
            let Some(pixel) = ctx.pixels.get(world) else {
                continue;
            };
            if target.fill_rect(ctx.view.cell_rect(local), opaque_from_packed(pixel.color)) > 0 {
                drawn += 1;
            }
        }
        drawn
    }
}

#[cfg(test)]
mod tests {
    use super::PixelLayer;
    use crate::layer::{Layer, LayerContext, ViewGeometry};
    use foundation::Coordinate;
    use raster::FrameBuffer;
    use streaming::{Pixel, PixelStore};

    #[test]
    fn cells_are_drawn_at_their_wrapped_position() {
        let mut pixels = PixelStore::new();
        pixels.set_many([
            (
                Coordinate::new(u32::MAX, 0),
                Pixel {
                    color: 0x00ff0080,
                    ..Pixel::default()
                },
            ),
            (Coordinate::new(500, 500), Pixel::default()),
        ]);
        // World offset 2 puts world M-1 at local column 1.
        let ctx = LayerContext {
            view: ViewGeometry {
                width: 12,
                height: 4,
                cell_size: 4.0,
                pixel_offset: [0.0, 0.0],
                world_offset: Coordinate::new(2, 0),
            },
            tileset: None,
            pixels: &pixels,
            hovered: None,
        };
        let mut fb = FrameBuffer::new(12, 4);
        assert_eq!(PixelLayer::new(3).draw(&ctx, &mut fb), 1);
        assert_eq!(fb.pixel(4, 0), Some([0, 0xff, 0, 0xff]));
        assert_eq!(fb.pixel(7, 3), Some([0, 0xff, 0, 0xff]));
        assert_eq!(fb.pixel(3, 0), Some([0, 0, 0, 0]));
        assert_eq!(fb.pixel(8, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn empty_store_draws_nothing() {
        let pixels = PixelStore::new();
        let ctx = LayerContext {
            view: ViewGeometry {
                width: 4,
                height: 4,
                cell_size: 1.0,
                pixel_offset: [0.0, 0.0],
                world_offset: Coordinate::ORIGIN,
            },
            tileset: None,
            pixels: &pixels,
            hovered: None,
        };
        let mut fb = FrameBuffer::new(4, 4);
        assert_eq!(PixelLayer::new(3).draw(&ctx, &mut fb), 0);
        assert!(fb.pixels().iter().all(|&b| b == 0));
    }
}
