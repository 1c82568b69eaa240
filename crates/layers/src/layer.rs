use foundation::math::{apply_world_offset, sub_cell_shift, view_axis, world_to_view};
use foundation::{Coordinate, LocalCell};
use raster::{FrameBuffer, Rect};
use streaming::{PixelStore, Tileset};

use crate::symbology::LayerStyle;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

/// Placement of world cells on screen for one frame.
///
/// Local cell 0 starts at [`ViewGeometry::origin`], which is the sub-cell
/// shift of the pixel offset and therefore never right of or below the
/// screen origin.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewGeometry {
    pub width: u32,
    pub height: u32,
    pub cell_size: f64,
    pub pixel_offset: [f64; 2],
    pub world_offset: Coordinate,
}

impl ViewGeometry {
    pub fn origin(&self) -> [f64; 2] {
        [
            sub_cell_shift(self.pixel_offset[0], self.cell_size),
            sub_cell_shift(self.pixel_offset[1], self.cell_size),
        ]
    }

    /// Cells needed to cover the width, not counting the partial cell at the left.
    pub fn columns(&self) -> i64 {
        (self.width as f64 / self.cell_size).ceil() as i64
    }

    pub fn rows(&self) -> i64 {
        (self.height as f64 / self.cell_size).ceil() as i64
    }

    pub fn cell_rect(&self, local: LocalCell) -> Rect {
        let [ox, oy] = self.origin();
        Rect::new(
            ox + local.x as f64 * self.cell_size,
            oy + local.y as f64 * self.cell_size,
            self.cell_size,
            self.cell_size,
        )
    }

    /// Local cell at which `world` is drawn.
    pub fn local_cell(&self, world: Coordinate) -> LocalCell {
        let view = world_to_view(self.world_offset, world);
        LocalCell::new(view_axis(view.x), view_axis(view.y))
    }

    /// Every local cell that can touch the screen, with its world coordinate.
    pub fn visible_cells(&self) -> impl Iterator<Item = (LocalCell, Coordinate)> + '_ {
        let (columns, rows) = (self.columns(), self.rows());
        (0..=columns).flat_map(move |x| {
            (0..=rows).map(move |y| {
                let local = LocalCell::new(x, y);
                (local, apply_world_offset(self.world_offset, local))
            })
        })
    }
}

/// Everything a layer may read while drawing one frame.
#[derive(Debug, Copy, Clone)]
pub struct LayerContext<'a> {
    pub view: ViewGeometry,
    pub tileset: Option<&'a Tileset>,
    pub pixels: &'a PixelStore,
    pub hovered: Option<Coordinate>,
}

pub trait Layer {
    fn id(&self) -> LayerId;

    fn style(&self) -> &LayerStyle;

    /// Draw into `target`. Returns how many items (lines, tiles, cells) were drawn.
    fn draw(&self, ctx: &LayerContext<'_>, target: &mut FrameBuffer) -> usize;
}
