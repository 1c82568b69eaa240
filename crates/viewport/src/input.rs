use foundation::Millis;

/// Host input, in screen pixels relative to the viewport's top-left corner.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown { position: [f64; 2], at: Millis },
    PointerMove { position: [f64; 2], at: Millis },
    PointerUp { position: [f64; 2], at: Millis },
    /// The pointer left the surface. Ends a drag without a click.
    PointerLeave,
    /// `delta_y <= 0` zooms in.
    Wheel { position: [f64; 2], delta_y: f64 },
    Resize { width: u32, height: u32 },
}
