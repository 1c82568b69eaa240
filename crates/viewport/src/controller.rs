use foundation::math::{apply_pan, apply_world_offset, cell_for_viewport_position, cell_size, update_world_offset};
use foundation::{Bounds, Coordinate, LocalCell, Millis};
use layers::ViewGeometry;
use tracing::debug;

use crate::config::ViewportConfig;
use crate::input::InputEvent;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    Dragging,
    Hovering(Coordinate),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RenderMode {
    /// Individual cells from the pixel store.
    Pixel,
    /// Pre-rendered tiles.
    Tile,
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct Drag {
    down_at: Millis,
    down_position: [f64; 2],
    last: [f64; 2],
    saved_pixel_offset: [f64; 2],
    saved_world_offset: Coordinate,
}

/// What an input did, for the engine to turn into redraws and events.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Reaction {
    pub redraw: bool,
    pub clicked: Option<Coordinate>,
    pub hovered: Option<Coordinate>,
}

impl Reaction {
    fn redraw() -> Self {
        Self {
            redraw: true,
            ..Self::default()
        }
    }
}

/// Pan, zoom and gesture state of one viewport.
///
/// Drags apply only the delta since the previous pointer event. A drag that
/// ends quickly and close to where it started is a click: the offsets saved
/// at pointer-down are restored and the clicked cell is reported instead.
#[derive(Debug, Clone)]
pub struct Controller {
    config: ViewportConfig,
    width: u32,
    height: u32,
    zoom: f64,
    world_offset: Coordinate,
    pixel_offset: [f64; 2],
    state: InteractionState,
    drag: Option<Drag>,
}

impl Controller {
    pub fn new(config: ViewportConfig, width: u32, height: u32, zoom: f64) -> Self {
        let zoom = config.clamp_zoom(zoom);
        Self {
            config,
            width,
            height,
            zoom,
            world_offset: Coordinate::ORIGIN,
            pixel_offset: [0.0, 0.0],
            state: InteractionState::Idle,
            drag: None,
        }
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn world_offset(&self) -> Coordinate {
        self.world_offset
    }

    pub fn pixel_offset(&self) -> [f64; 2] {
        self.pixel_offset
    }

    pub fn cell_size(&self) -> f64 {
        cell_size(self.zoom, self.config.zoom_factor)
    }

    pub fn mode(&self) -> RenderMode {
        if self.zoom <= self.config.tile_mode_threshold {
            RenderMode::Tile
        } else {
            RenderMode::Pixel
        }
    }

    pub fn hovered(&self) -> Option<Coordinate> {
        match self.state {
            InteractionState::Hovering(cell) => Some(cell),
            _ => None,
        }
    }

    pub fn geometry(&self) -> ViewGeometry {
        ViewGeometry {
            width: self.width,
            height: self.height,
            cell_size: self.cell_size(),
            pixel_offset: self.pixel_offset,
            world_offset: self.world_offset,
        }
    }

    /// Local cell under a screen position.
    pub fn local_cell_at(&self, position: [f64; 2]) -> LocalCell {
        cell_for_viewport_position(self.zoom, self.config.zoom_factor, self.pixel_offset, position)
    }

    /// World cell under a screen position.
    pub fn world_cell_at(&self, position: [f64; 2]) -> Coordinate {
        apply_world_offset(self.world_offset, self.local_cell_at(position))
    }

    fn middle(&self) -> [f64; 2] {
        [self.width as f64 / 2.0, self.height as f64 / 2.0]
    }

    /// World cell under the middle of the viewport.
    pub fn center(&self) -> Coordinate {
        self.world_cell_at(self.middle())
    }

    /// World bounds from the top-left to the bottom-right visible pixel.
    /// Wraps when the view straddles the seam.
    pub fn worldview(&self) -> Bounds {
        let right = (self.width.max(1) - 1) as f64;
        let bottom = (self.height.max(1) - 1) as f64;
        Bounds::new(self.world_cell_at([0.0, 0.0]), self.world_cell_at([right, bottom]))
    }

    /// Position the view so `world` is under the viewport middle.
    pub fn set_center(&mut self, world: Coordinate) {
        let local = self.local_cell_at(self.middle());
        self.world_offset = apply_world_offset(world, local);
    }

    /// Zoom to `zoom` keeping the cell under `anchor` fixed on screen.
    /// Returns `false` if the clamped zoom did not change.
    pub fn zoom_at(&mut self, zoom: f64, anchor: [f64; 2]) -> bool {
        let zoom = self.config.clamp_zoom(zoom);
        if zoom == self.zoom {
            return false;
        }
        let before = self.local_cell_at(anchor);
        self.zoom = zoom;

        let cs = self.cell_size();
        self.pixel_offset = self.pixel_offset.map(|p| if p < cs { p } else { p.rem_euclid(cs) });

        let after = self.local_cell_at(anchor);
        self.world_offset = update_world_offset(self.world_offset, after.delta_from(before));
        debug!(zoom, world_offset = %self.world_offset, "zoomed");
        true
    }

    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        self.zoom_at(zoom, self.middle())
    }

    pub fn handle(&mut self, event: InputEvent) -> Reaction {
        match event {
            InputEvent::PointerDown { position, at } => {
                self.drag = Some(Drag {
                    down_at: at,
                    down_position: position,
                    last: position,
                    saved_pixel_offset: self.pixel_offset,
                    saved_world_offset: self.world_offset,
                });
                let had_hover = self.hovered().is_some();
                self.state = InteractionState::Dragging;
                Reaction {
                    redraw: had_hover,
                    ..Reaction::default()
                }
            }
            InputEvent::PointerMove { position, .. } => match self.drag.as_mut() {
                Some(drag) => {
                    let delta = [drag.last[0] - position[0], drag.last[1] - position[1]];
                    drag.last = position;
                    self.pan(delta)
                }
                None => self.hover(position),
            },
            InputEvent::PointerUp { position, at } => {
                let Some(drag) = self.drag.take() else {
                    return Reaction::default();
                };
                self.state = InteractionState::Idle;
                let moved = (position[0] - drag.down_position[0]).hypot(position[1] - drag.down_position[1]);
                if at.since(drag.down_at) < self.config.click_max_ms && moved < self.config.click_max_px {
                    self.pixel_offset = drag.saved_pixel_offset;
                    self.world_offset = drag.saved_world_offset;
                    let cell = self.world_cell_at(position);
                    debug!(%cell, "click");
                    return Reaction {
                        redraw: true,
                        clicked: Some(cell),
                        hovered: None,
                    };
                }
                self.pan([drag.last[0] - position[0], drag.last[1] - position[1]]);
                Reaction::redraw()
            }
            InputEvent::PointerLeave => {
                let had = self.drag.take().is_some() || self.hovered().is_some();
                self.state = InteractionState::Idle;
                Reaction {
                    redraw: had,
                    ..Reaction::default()
                }
            }
            InputEvent::Wheel { position, delta_y } => {
                let target = if delta_y <= 0.0 {
                    self.zoom * self.config.zoom_step
                } else {
                    self.zoom / self.config.zoom_step
                };
                Reaction {
                    redraw: self.zoom_at(target, position),
                    ..Reaction::default()
                }
            }
            InputEvent::Resize { width, height } => {
                if (width, height) == (self.width, self.height) {
                    return Reaction::default();
                }
                self.width = width;
                self.height = height;
                Reaction::redraw()
            }
        }
    }

    fn pan(&mut self, delta: [f64; 2]) -> Reaction {
        if delta == [0.0, 0.0] {
            return Reaction::default();
        }
        let (pixel_offset, world_offset) = apply_pan(self.pixel_offset, self.world_offset, delta, self.cell_size());
        self.pixel_offset = pixel_offset;
        self.world_offset = world_offset;
        Reaction::redraw()
    }

    fn hover(&mut self, position: [f64; 2]) -> Reaction {
        let cell = self.world_cell_at(position);
        if self.state == InteractionState::Hovering(cell) {
            return Reaction::default();
        }
        self.state = InteractionState::Hovering(cell);
        Reaction {
            redraw: self.mode() == RenderMode::Pixel,
            clicked: None,
            hovered: Some(cell),
        }
    }
}
