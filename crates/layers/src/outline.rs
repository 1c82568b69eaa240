use raster::{FrameBuffer, Rect};

use crate::layer::{Layer, LayerContext, LayerId};
use crate::symbology::LayerStyle;

/// Border around the whole view, drawn last.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineLayer {
    id: LayerId,
    pub style: LayerStyle,
    pub width_px: f64,
}

impl OutlineLayer {
    pub fn new(id: u64, width_px: f64) -> Self {
        Self {
            id: LayerId(id),
            style: LayerStyle::default(),
            width_px,
        }
    }
}

impl Layer for OutlineLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn style(&self) -> &LayerStyle {
        &self.style
    }

    fn draw(&self, ctx: &LayerContext<'_>, target: &mut FrameBuffer) -> usize {
        let rect = Rect::new(0.0, 0.0, ctx.view.width as f64, ctx.view.height as f64);
        usize::from(target.stroke_rect(rect, self.width_px, self.style.color) > 0)
    }
}
