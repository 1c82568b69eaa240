//! Wire types shared with the tile and pixel servers.
//!
//! - `TileChanged`: live invalidation feed message (server → client).
//! - `PixelRecord`: one row of a pixel region query response.

use foundation::Coordinate;
use serde::{Deserialize, Serialize};

use crate::key::{ParseKeyError, TileKey};
use crate::pixels::Pixel;

/// Pushed when a pre-rendered tile changed upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileChanged {
    pub tile_name: String,
    #[serde(default)]
    pub timestamp: u64,
}

impl TileChanged {
    pub fn key(&self) -> Result<TileKey, ParseKeyError> {
        self.tile_name.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRecord {
    pub x: u32,
    pub y: u32,
    pub color: u32,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub timestamp: u64,
}

impl From<PixelRecord> for (Coordinate, Pixel) {
    fn from(r: PixelRecord) -> Self {
        (
            Coordinate::new(r.x, r.y),
            Pixel {
                color: r.color,
                owner: r.owner,
                action: r.action,
                text: r.text,
                timestamp: r.timestamp,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{PixelRecord, TileChanged};
    use crate::key::TileKey;
    use foundation::Coordinate;

    #[test]
    fn tile_changed_uses_camel_case() {
        let msg: TileChanged = serde_json::from_str(r#"{"tileName":"1_100_200_300","timestamp":17}"#).unwrap();
        assert_eq!(msg.key(), Ok(TileKey::new(1, 100, 200, 300)));
        assert_eq!(msg.timestamp, 17);

        let bad: TileChanged = serde_json::from_str(r#"{"tileName":"nope"}"#).unwrap();
        assert!(bad.key().is_err());
    }

    #[test]
    fn pixel_records_default_optional_fields() {
        let record: PixelRecord = serde_json::from_str(r#"{"x":1,"y":2,"color":4278190335}"#).unwrap();
        let (at, pixel) = record.into();
        assert_eq!(at, Coordinate::new(1, 2));
        assert_eq!(pixel.color, 0xff0000ff);
        assert!(pixel.owner.is_empty());
    }
}
