use raster::{FrameBuffer, opaque_from_packed};

use crate::layer::{Layer, LayerContext, LayerId};
use crate::symbology::LayerStyle;

/// The hovered cell, redrawn larger than its neighbours.
///
/// Uses the cell's own colour; an empty cell gets the style colour.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverLayer {
    id: LayerId,
    pub style: LayerStyle,
    pub margin_px: f64,
}

impl HoverLayer {
    pub const DEFAULT_COLOR: raster::Rgba = [0xee, 0xee, 0xee, 0xff];

    pub fn new(id: u64, margin_px: f64) -> Self {
        Self {
            id: LayerId(id),
            style: LayerStyle::new(true, Self::DEFAULT_COLOR),
            margin_px,
        }
    }
}

impl Layer for HoverLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn style(&self) -> &LayerStyle {
        &self.style
    }

    fn draw(&self, ctx: &LayerContext<'_>, target: &mut FrameBuffer) -> usize {
        let Some(world) = ctx.hovered else {
            return 0;
        };
        let color = ctx
            .pixels
            .get(world)
            .map(|p| opaque_from_packed(p.color))
            .unwrap_or(self.style.color);
        let rect = ctx.view.cell_rect(ctx.view.local_cell(world)).inflate(self.margin_px);
        usize::from(target.fill_rect(rect, color) > 0)
    }
}
