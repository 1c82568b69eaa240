use raster::FrameBuffer;

use crate::layer::{Layer, LayerContext, LayerId};
use crate::symbology::LayerStyle;

/// One-pixel cell boundaries across the whole view.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayer {
    id: LayerId,
    pub style: LayerStyle,
}

impl GridLayer {
    pub const DEFAULT_COLOR: raster::Rgba = [0xdd, 0xdd, 0xdd, 0xff];

    pub fn new(id: u64) -> Self {
        Self {
            id: LayerId(id),
            style: LayerStyle::new(true, Self::DEFAULT_COLOR),
        }
    }
}

impl Layer for GridLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn style(&self) -> &LayerStyle {
        &self.style
    }

    fn draw(&self, ctx: &LayerContext<'_>, target: &mut FrameBuffer) -> usize {
        let view = &ctx.view;
        let [ox, oy] = view.origin();
        let (w, h) = (view.width as f64, view.height as f64);

        let mut lines = 0;
        for i in 0..=view.columns() + 1 {
            if target.vline(ox + i as f64 * view.cell_size, 0.0, h, self.style.color) > 0 {
                lines += 1;
            }
        }
        for j in 0..=view.rows() + 1 {
            if target.hline(0.0, oy + j as f64 * view.cell_size, w, self.style.color) > 0 {
                lines += 1;
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::GridLayer;
    use crate::layer::{Layer, LayerContext, ViewGeometry};
    use foundation::Coordinate;
    use raster::FrameBuffer;
    use streaming::PixelStore;

    #[test]
    fn lines_fall_on_cell_boundaries() {
        let pixels = PixelStore::new();
        let ctx = LayerContext {
            view: ViewGeometry {
                width: 20,
                height: 10,
                cell_size: 8.0,
                pixel_offset: [3.0, 0.0],
                world_offset: Coordinate::ORIGIN,
            },
            tileset: None,
            pixels: &pixels,
            hovered: None,
        };
        let mut fb = FrameBuffer::new(20, 10);
        let grid = GridLayer::new(1);

        // Shift is 3 - 8 = -5: verticals at 3, 11, 19; horizontals at 0, 8.
        assert_eq!(grid.draw(&ctx, &mut fb), 5);
        assert_eq!(fb.pixel(3, 5), Some(GridLayer::DEFAULT_COLOR));
        assert_eq!(fb.pixel(11, 5), Some(GridLayer::DEFAULT_COLOR));
        assert_eq!(fb.pixel(5, 8), Some(GridLayer::DEFAULT_COLOR));
        assert_eq!(fb.pixel(5, 5), Some([0, 0, 0, 0]));
    }
}
