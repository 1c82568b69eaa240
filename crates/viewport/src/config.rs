use serde::Deserialize;
use streaming::{CacheConfig, TilesetConfig};

/// Viewport tuning. Every field has a default, so a partial JSON document
/// only overrides what it names.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Zoom at which one cell is one screen pixel.
    pub zoom_factor: f64,
    pub zoom_min: f64,
    pub zoom_max: f64,
    /// Multiplier applied per wheel notch.
    pub zoom_step: f64,
    /// At or below this zoom the view is drawn from tiles.
    pub tile_mode_threshold: f64,
    /// Grid lines are drawn from this zoom up.
    pub grid_min_zoom: f64,
    pub click_max_ms: u64,
    pub click_max_px: f64,
    pub hover_margin_px: f64,
    pub outline_width_px: f64,
    /// Fetch jobs handed to the host per frame.
    pub max_dispatch_per_frame: u32,
    pub tileset: TilesetConfig,
    pub cache: CacheConfig,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            zoom_factor: 100.0,
            zoom_min: 5.0,
            zoom_max: 5000.0,
            zoom_step: 1.25,
            tile_mode_threshold: 300.0,
            grid_min_zoom: 800.0,
            click_max_ms: 500,
            click_max_px: 10.0,
            hover_margin_px: 10.0,
            outline_width_px: 2.0,
            max_dispatch_per_frame: 32,
            tileset: TilesetConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl ViewportConfig {
    /// Clamp a zoom into the configured range, never reaching zero.
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        let min = self.zoom_min.max(f64::MIN_POSITIVE);
        if !zoom.is_finite() {
            return min;
        }
        zoom.clamp(min, self.zoom_max.max(min))
    }
}

#[cfg(test)]
mod tests {
    use super::ViewportConfig;
    use pretty_assertions::assert_eq;
    use streaming::FailurePolicy;

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let config: ViewportConfig = serde_json::from_str(
            r#"{ "tile_mode_threshold": 50, "tileset": { "tile_size": 256 }, "cache": { "failure_policy": "retry_on_request" } }"#,
        )
        .unwrap();
        assert_eq!(config.tile_mode_threshold, 50.0);
        assert_eq!(config.tileset.tile_size, 256);
        assert_eq!(config.tileset.coarse_bucket, 10);
        assert_eq!(config.cache.failure_policy, FailurePolicy::RetryOnRequest);
        assert_eq!(config.zoom_factor, 100.0);
    }

    #[test]
    fn zoom_is_clamped_to_a_positive_range() {
        let config = ViewportConfig::default();
        assert_eq!(config.clamp_zoom(0.0), 5.0);
        assert_eq!(config.clamp_zoom(1e9), 5000.0);
        assert_eq!(config.clamp_zoom(f64::NAN), 5.0);
        assert_eq!(config.clamp_zoom(120.0), 120.0);
    }
}
