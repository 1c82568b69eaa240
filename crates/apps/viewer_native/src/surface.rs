use std::path::Path;

use raster::{FrameBuffer, Surface, SurfaceError};

/// Keeps the last presented frame as PNG bytes, written out on request.
#[derive(Debug, Default)]
pub struct PngSurface {
    last: Option<Vec<u8>>,
    presents: u64,
}

impl PngSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presents(&self) -> u64 {
        self.presents
    }

    /// Write the last frame to `path`. Returns `false` if nothing was presented.
    pub async fn write_to(&self, path: &Path) -> Result<bool, SurfaceError> {
        let Some(png) = &self.last else {
            return Ok(false);
        };
        tokio::fs::write(path, png)
            .await
            .map_err(|err| SurfaceError::Io(err.to_string()))?;
        Ok(true)
    }
}

impl Surface for PngSurface {
    fn present(&mut self, frame: &FrameBuffer) -> Result<(), SurfaceError> {
        let png = frame
            .to_bitmap()
            .encode_png()
            .map_err(|err| SurfaceError::Encode(err.to_string()))?;
        self.last = Some(png);
        self.presents += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::PngSurface;
    use raster::{Bitmap, FrameBuffer, Surface};

    #[tokio::test]
    async fn writes_the_last_frame_as_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let mut surface = PngSurface::new();
        assert!(!surface.write_to(&path).await.unwrap());

        let mut fb = FrameBuffer::new(3, 2);
        fb.clear([10, 20, 30, 255]);
        surface.present(&fb).unwrap();
        assert!(surface.write_to(&path).await.unwrap());

        let decoded = Bitmap::decode(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
        assert_eq!(decoded.pixel(2, 1), Some([10, 20, 30, 255]));
        assert_eq!(surface.presents(), 1);
    }
}
