//! Draw requests handed to the (external) renderer.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A colour in hue/saturation/brightness space.
///
/// Hue is in degrees, saturation and brightness in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hsb {
    pub hue: f32,
    pub saturation: f32,
    pub brightness: f32,
}

impl Hsb {
    /// Wraps `hue` into `[0, 360)` and clamps the other channels to `[0, 1]`.
    ///
    /// Turtle hue accumulates without bound as rotation symbols repeat.
    pub fn normalized(hue: f32, saturation: f32, brightness: f32) -> Self {
        let hue = hue.rem_euclid(360.0);
        Self {
            // rem_euclid can round up to exactly 360 for tiny negative inputs
            hue: if hue >= 360.0 { 0.0 } else { hue },
            saturation: saturation.clamp(0.0, 1.0),
            brightness: brightness.clamp(0.0, 1.0),
        }
    }
}

/// One primitive for the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    /// A particle.
    Point { position: Vec3, color: Hsb },
    /// A tree edge.
    Line { start: Vec3, end: Vec3, color: Hsb },
}
