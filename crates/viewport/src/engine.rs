use foundation::{Bounds, Coordinate, Millis};
use layers::grid::GridLayer;
use layers::hover::HoverLayer;
use layers::outline::OutlineLayer;
use layers::pixels::PixelLayer;
use layers::raster::TileLayer;
use layers::{Layer, LayerContext};
use raster::{Bitmap, FrameBuffer, Surface, SurfaceError, TRANSPARENT};
use runtime::budget::FrameBudget;
use runtime::event_bus::{Event, EventBus, SubscriptionId};
use runtime::frame::Frame;
use runtime::metrics::Metrics;
use streaming::{Completion, FetchJob, Pipeline, TileError, TileKey};
use tracing::debug;

use crate::config::ViewportConfig;
use crate::controller::{Controller, InteractionState, RenderMode};
use crate::input::InputEvent;

/// Notifications for the host, delivered after the engine state is settled.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewportEvent {
    WorldviewChanged(Bounds),
    ZoomChanged(f64),
    CenterChanged(Coordinate),
    CellClicked(Coordinate),
    CellHovered(Coordinate),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RenderStats {
    pub frame_index: u64,
    pub mode: RenderMode,
    pub tiles_drawn: usize,
    pub pixels_drawn: usize,
}

#[derive(Debug, Clone)]
struct LayerStack {
    grid: GridLayer,
    tiles: TileLayer,
    pixels: PixelLayer,
    hover: HoverLayer,
    outline: OutlineLayer,
}

impl LayerStack {
    fn new(config: &ViewportConfig) -> Self {
        Self {
            grid: GridLayer::new(1),
            tiles: TileLayer::new(2),
            pixels: PixelLayer::new(3),
            hover: HoverLayer::new(4, config.hover_margin_px),
            outline: OutlineLayer::new(5, config.outline_width_px),
        }
    }
}

fn draw(layer: &dyn Layer, ctx: &LayerContext<'_>, target: &mut FrameBuffer) -> usize {
    if !layer.style().visible {
        return 0;
    }
    layer.draw(ctx, target)
}

/// One viewport onto the torus.
///
/// Single owner of the view state, the data pipeline and the off-screen
/// buffer. The host feeds it input and fetch completions, hands its fetch
/// jobs to a fetcher, and calls [`ViewportEngine::render`] when
/// [`ViewportEngine::needs_render`] says so. Each render composes the layers
/// for the current mode into the buffer and presents it once.
#[derive(Debug)]
pub struct ViewportEngine {
    controller: Controller,
    pipeline: Pipeline,
    buffer: FrameBuffer,
    layers: LayerStack,
    frame: Frame,
    events: EventBus<ViewportEvent>,
    metrics: Metrics,
    last_worldview: Option<Bounds>,
    last_zoom: Option<f64>,
    last_center: Option<Coordinate>,
    last_mode: Option<RenderMode>,
    last_region: Option<Bounds>,
    dirty: bool,
}

impl ViewportEngine {
    pub fn new(config: ViewportConfig, width: u32, height: u32, zoom: f64) -> Self {
        let pipeline = Pipeline::new(config.cache.clone());
        let layers = LayerStack::new(&config);
        let mut engine = Self {
            controller: Controller::new(config, width, height, zoom),
            pipeline,
            buffer: FrameBuffer::new(width, height),
            layers,
            frame: Frame::default(),
            events: EventBus::new(),
            metrics: Metrics::new(),
            last_worldview: None,
            last_zoom: None,
            last_center: None,
            last_mode: None,
            last_region: None,
            dirty: true,
        };
        engine.sync_view();
        engine
    }

    pub fn config(&self) -> &ViewportConfig {
        self.controller.config()
    }

    pub fn state(&self) -> InteractionState {
        self.controller.state()
    }

    pub fn mode(&self) -> RenderMode {
        self.controller.mode()
    }

    pub fn zoom(&self) -> f64 {
        self.controller.zoom()
    }

    pub fn worldview(&self) -> Bounds {
        self.controller.worldview()
    }

    pub fn center(&self) -> Coordinate {
        self.controller.center()
    }

    pub fn world_offset(&self) -> Coordinate {
        self.controller.world_offset()
    }

    pub fn pixel_offset(&self) -> [f64; 2] {
        self.controller.pixel_offset()
    }

    pub fn world_cell_at(&self, position: [f64; 2]) -> Coordinate {
        self.controller.world_cell_at(position)
    }

    /// Index of the frame the next render will produce.
    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Direct access for optimistic local pixel writes. Marks the view dirty.
    pub fn pipeline_mut(&mut self) -> &mut Pipeline {
        self.dirty = true;
        &mut self.pipeline
    }

    pub fn needs_render(&self) -> bool {
        self.dirty
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&Event<ViewportEvent>) + 'static) -> SubscriptionId {
        self.events.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Events nobody was subscribed to receive.
    pub fn drain_events(&mut self) -> Vec<Event<ViewportEvent>> {
        self.events.drain()
    }

    /// Apply an input event. Returns `true` if the view needs redrawing.
    pub fn handle(&mut self, event: InputEvent) -> bool {
        let reaction = self.controller.handle(event);
        if let Some(cell) = reaction.clicked {
            self.events.emit(self.frame, ViewportEvent::CellClicked(cell));
        }
        if let Some(cell) = reaction.hovered {
            self.events.emit(self.frame, ViewportEvent::CellHovered(cell));
        }
        self.dirty |= reaction.redraw;
        self.sync_view();
        self.events.dispatch();
        reaction.redraw
    }

    pub fn set_center(&mut self, world: Coordinate) {
        self.controller.set_center(world);
        self.dirty = true;
        self.sync_view();
        self.events.dispatch();
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        if self.controller.set_zoom(zoom) {
            self.dirty = true;
        }
        self.sync_view();
        self.events.dispatch();
    }

    /// Fetch work for the host, bounded per frame.
    pub fn take_fetch_jobs(&mut self) -> Vec<FetchJob> {
        let mut budget = FrameBudget::new(self.config().max_dispatch_per_frame);
        let jobs = self.pipeline.drain_jobs(&mut budget);
        self.metrics.inc_counter("fetch_jobs_dispatched", jobs.len() as u64);
        jobs
    }

    /// Apply a finished fetch. Returns `true` if the view needs redrawing.
    pub fn apply(&mut self, completion: Completion) -> bool {
        let changed = self.pipeline.apply(completion);
        self.dirty |= changed;
        changed
    }

    /// Upstream data for `key` changed: forget it so the next frame refetches.
    pub fn invalidate_tile(&mut self, key: &TileKey) -> bool {
        let invalidated = self.pipeline.invalidate(key);
        if invalidated {
            self.metrics.inc_counter("tiles_invalidated", 1);
            self.dirty = true;
        }
        invalidated
    }

    pub fn restore_tiles(&mut self, restored: impl IntoIterator<Item = (TileKey, Result<Bitmap, TileError>)>) -> usize {
        let filled = self.pipeline.restore(restored);
        if filled > 0 {
            self.dirty = true;
        }
        filled
    }

    /// Compose one frame into the owned buffer and present it.
    pub fn render(&mut self, surface: &mut dyn Surface, now: Millis) -> Result<RenderStats, SurfaceError> {
        self.frame.started = now;
        let (width, height) = self.controller.size();
        self.buffer.resize(width, height);
        self.buffer.clear(TRANSPARENT);

        let view = self.controller.geometry();
        let mode = self.controller.mode();
        let mut stats = RenderStats {
            frame_index: self.frame.index,
            mode,
            tiles_drawn: 0,
            pixels_drawn: 0,
        };

        match mode {
            RenderMode::Tile => {
                let config = self.controller.config();
                let scale = config.zoom_factor / self.controller.zoom();
                let tileset = self.pipeline.tileset(&config.tileset, scale, self.controller.worldview());
                let ctx = LayerContext {
                    view,
                    tileset: Some(&tileset),
                    pixels: self.pipeline.pixels(),
                    hovered: None,
                };
                stats.tiles_drawn = draw(&self.layers.tiles, &ctx, &mut self.buffer);
                draw(&self.layers.outline, &ctx, &mut self.buffer);
            }
            RenderMode::Pixel => {
                let ctx = LayerContext {
                    view,
                    tileset: None,
                    pixels: self.pipeline.pixels(),
                    hovered: self.controller.hovered(),
                };
                if self.controller.zoom() >= self.controller.config().grid_min_zoom {
                    draw(&self.layers.grid, &ctx, &mut self.buffer);
                }
                stats.pixels_drawn = draw(&self.layers.pixels, &ctx, &mut self.buffer);
                draw(&self.layers.hover, &ctx, &mut self.buffer);
                draw(&self.layers.outline, &ctx, &mut self.buffer);
            }
        }

        surface.present(&self.buffer)?;

        self.metrics.inc_counter("frames_rendered", 1);
        self.metrics.inc_counter("tiles_drawn", stats.tiles_drawn as u64);
        self.metrics.inc_counter("pixels_drawn", stats.pixels_drawn as u64);
        self.metrics
            .set_gauge("tiles_pending", self.pipeline.tiles().counts().pending as i64);
        self.metrics.set_gauge("events_dropped", self.events.dropped() as i64);
        debug!(
            frame = stats.frame_index,
            ?mode,
            tiles = stats.tiles_drawn,
            pixels = stats.pixels_drawn,
            "frame presented"
        );

        self.dirty = false;
        self.sync_view();
        self.events.dispatch();
        self.frame = self.frame.next(now);
        Ok(stats)
    }

    /// Emit what changed since the last notification, and keep the pixel
    /// store loading the visible region while in pixel mode.
    ///
    /// A drag only loads the view it settles on.
    fn sync_view(&mut self) {
        let worldview = self.controller.worldview();
        let zoom = self.controller.zoom();
        let center = self.controller.center();
        let mode = self.controller.mode();

        let worldview_changed = self.last_worldview != Some(worldview);
        if worldview_changed {
            self.events.emit(self.frame, ViewportEvent::WorldviewChanged(worldview));
        }
        if self.last_zoom != Some(zoom) {
            self.events.emit(self.frame, ViewportEvent::ZoomChanged(zoom));
        }
        if self.last_center != Some(center) {
            self.events.emit(self.frame, ViewportEvent::CenterChanged(center));
        }
        match mode {
            RenderMode::Tile => self.last_region = None,
            RenderMode::Pixel => {
                let dragging = self.controller.state() == InteractionState::Dragging;
                if !dragging && self.last_region != Some(worldview) {
                    self.pipeline.request_region(worldview);
                    self.last_region = Some(worldview);
                }
            }
        }
        if self.last_mode != Some(mode) {
            debug!(?mode, zoom, "render mode");
        }

        self.last_worldview = Some(worldview);
        self.last_zoom = Some(zoom);
        self.last_center = Some(center);
        self.last_mode = Some(mode);
    }
}
