use raster::Rgba;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LayerStyle {
    pub visible: bool,
    pub color: Rgba,
}

impl LayerStyle {
    pub const fn new(visible: bool, color: Rgba) -> Self {
        Self { visible, color }
    }
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self {
            visible: true,
            color: [0, 0, 0, 0xff],
        }
    }
}
