use crate::bitmap::Bitmap;
use crate::framebuffer::FrameBuffer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    Encode(String),
    Io(String),
}

impl std::fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurfaceError::Encode(msg) => write!(f, "surface encode failed: {msg}"),
            SurfaceError::Io(msg) => write!(f, "surface write failed: {msg}"),
        }
    }
}

impl std::error::Error for SurfaceError {}

/// Visible blit target. Receives one completed frame per render pass.
pub trait Surface {
    fn present(&mut self, frame: &FrameBuffer) -> Result<(), SurfaceError>;
}

/// Surface that keeps the last presented frame in memory.
#[derive(Debug, Default)]
pub struct MemorySurface {
    last: Option<Bitmap>,
    presents: u64,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&Bitmap> {
        self.last.as_ref()
    }

    pub fn presents(&self) -> u64 {
        self.presents
    }
}

impl Surface for MemorySurface {
    fn present(&mut self, frame: &FrameBuffer) -> Result<(), SurfaceError> {
        self.last = Some(frame.to_bitmap());
        self.presents += 1;
        Ok(())
    }
}
