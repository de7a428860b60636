//! # lsystem-particles
//!
//! Grows branching fractal structures from an L-System and animates particles
//! flowing along them.
//!
//! The pipeline has three stages. A [`GrammarEngine`] rewrites the axiom,
//! a [`TurtleInterpreter`] walks the result with quaternion rotations to
//! build a [`BranchTree`], and a [`ParticleSystem`] streams particles from the
//! root outwards, forking at branch points and dying at the leaves.
//! [`LParticleSystem`] runs all three once per frame and returns
//! engine-agnostic [`DrawCommand`]s for whatever renderer hosts it.

pub mod draw;
pub mod error;
pub mod grammar;
pub mod interpreter;
pub mod particles;
pub mod quaternion;
pub mod system;
pub mod tree;
pub mod turtle;

pub use draw::*;
pub use error::LSystemError;
pub use grammar::*;
pub use interpreter::*;
pub use particles::*;
pub use quaternion::*;
pub use system::*;
pub use tree::*;
pub use turtle::*;
