//! Turtle state and operations for branch interpretation.

use crate::draw::Hsb;
use crate::grammar::GrammarParameters;
use crate::quaternion::Quaternion;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// The state of the drawing turtle.
///
/// A plain value: pushing it on the branch stack or storing it in a tree
/// node takes an independent copy, so a saved snapshot never observes later
/// moves of the live turtle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurtleState {
    /// Start of the last segment drawn.
    pub position0: Vec3,

    /// End of the last segment drawn (the turtle's current position).
    pub position1: Vec3,

    /// World-space orientation. The turtle walks along its local +X.
    pub orientation: Quaternion,

    /// Current forward step length.
    pub step_size: f32,

    /// Current turn angle, in degrees.
    pub step_angle: f32,

    /// Hue in degrees. Unbounded; wrap before display.
    pub hue: f32,
    pub saturation: f32,
    pub brightness: f32,
}

impl Default for TurtleState {
    fn default() -> Self {
        Self {
            position0: Vec3::ZERO,
            position1: Vec3::ZERO,
            orientation: Quaternion::IDENTITY,
            step_size: 10.0,
            step_angle: 0.0,
            hue: 0.0,
            saturation: 0.5,
            brightness: 0.5,
        }
    }
}

impl TurtleState {
    /// Initial state at the origin with step size and angle taken from `parameters`.
    pub fn from_parameters(parameters: &GrammarParameters) -> Self {
        Self {
            step_size: parameters.step_size,
            step_angle: parameters.step_angle,
            ..Default::default()
        }
    }

    /// Returns the turtle's walking direction (local X) in world space.
    pub fn heading(&self) -> Vec3 {
        self.orientation.transform(Vec3::X)
    }

    /// Draws a segment of `distance` along the heading.
    pub fn advance(&mut self, distance: f32) {
        self.position0 = self.position1;
        self.position1 += self.orientation.transform(Vec3::new(distance, 0.0, 0.0));
    }

    /// Pre-multiplies a rotation of `degrees` about `axis` onto the
    /// orientation and shifts the hue by the same amount.
    pub fn turn(&mut self, axis: Vec3, degrees: f32) {
        self.hue += degrees;
        self.orientation =
            Quaternion::from_axis_angle(axis, degrees.to_radians()).times(self.orientation);
    }

    /// Rotates about Z by `degrees` (Yaw).
    pub fn yaw(&mut self, degrees: f32) {
        self.turn(Vec3::Z, degrees);
    }

    /// Rotates about X by `degrees` (Pitch).
    pub fn pitch(&mut self, degrees: f32) {
        self.turn(Vec3::X, degrees);
    }

    /// Rotates about Y by `degrees` (Roll).
    pub fn roll(&mut self, degrees: f32) {
        self.turn(Vec3::Y, degrees);
    }

    /// Turns 180 degrees about Z. Hue is left alone.
    pub fn reverse(&mut self) {
        self.orientation =
            Quaternion::from_axis_angle(Vec3::Z, std::f32::consts::PI).times(self.orientation);
    }

    /// Scales saturation and step size by `factor`.
    pub fn grow_size(&mut self, factor: f32) {
        self.saturation *= factor;
        self.step_size *= factor;
    }

    /// Scales brightness by `1 + delta` and the turn angle by `1 - delta`.
    pub fn grow_angle(&mut self, delta: f32) {
        self.brightness *= 1.0 + delta;
        self.step_angle *= 1.0 - delta;
    }

    /// Display colour, wrapped and clamped into range.
    pub fn color(&self) -> Hsb {
        Hsb::normalized(self.hue, self.saturation, self.brightness)
    }
}

/// Operations that can be performed by the turtle.
///
/// Signed variants carry `+1.0` or `-1.0` to select the direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TurtleOp {
    /// Draw forward one step and grow the tree (`F`).
    Forward,
    /// Rotate around Z (`+`/`-`).
    Yaw(f32),
    /// Rotate around X (`/`/`\`).
    Pitch(f32),
    /// Rotate around Y (`}`/`{`).
    Roll(f32),
    /// Scale step size and saturation by `1 ± size_growth` (`<`/`>`).
    GrowSize(f32),
    /// Scale brightness up and angle down, or the reverse (`(`/`)`).
    GrowAngle(f32),
    /// Save the turtle state and open a branch (`[`).
    Push,
    /// Restore the most recently pushed state (`]`).
    Pop,
    /// Negate the turn angle (`!`).
    FlipAngle,
    /// Turn 180 degrees (`|`).
    Reverse,
    /// No-op; the symbol has no registered meaning.
    Ignore,
}
