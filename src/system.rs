//! Per-frame driver tying grammar expansion, interpretation and particles
//! together.
//!
//! [`LParticleSystem`] owns one [`GrammarEngine`], one [`TurtleInterpreter`]
//! and one [`ParticleSystem`]. Input collaborators call the command methods
//! ([`spawn_particle`](LParticleSystem::spawn_particle),
//! [`set_iterations`](LParticleSystem::set_iterations),
//! [`set_modifiers`](LParticleSystem::set_modifiers)); the render loop calls
//! [`frame`](LParticleSystem::frame) or [`tick`](LParticleSystem::tick) once
//! per frame and draws the returned commands.

use crate::draw::DrawCommand;
use crate::error::{LSystemError, Result};
use crate::grammar::{GrammarDefinition, GrammarEngine};
use crate::interpreter::{InterpreterConfig, TurtleInterpreter};
use crate::particles::{ParticleConfig, ParticleId, ParticleSystem};
use crate::tree::BranchTree;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

/// What a frame emits for the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawMode {
    /// Particle points only.
    #[default]
    Particles,
    /// Tree edges only.
    Tree,
    /// Tree edges followed by particle points.
    Both,
}

/// Configuration for the frame driver.
#[derive(Clone, Debug)]
pub struct SystemConfig {
    pub interpreter: InterpreterConfig,
    pub particles: ParticleConfig,
    pub draw_mode: DrawMode,
    /// Largest accepted iteration count. Expansion grows geometrically.
    pub max_iterations: u32,
    /// Seconds between automatic root spawns; `None` spawns only on request.
    pub emit_interval: Option<f32>,
    /// Most timed spawns added in one frame. Time beyond that is dropped.
    pub max_spawns_per_frame: usize,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            interpreter: InterpreterConfig::default(),
            particles: ParticleConfig::default(),
            draw_mode: DrawMode::default(),
            max_iterations: 12,
            emit_interval: Some(1.0),
            max_spawns_per_frame: 64,
        }
    }
}

/// Everything that happened in one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameOutput {
    /// Particles created this frame (forks and root spawns).
    pub spawned: Vec<ParticleId>,
    /// Particles retired this frame, at leaves or by a tree rebuild.
    pub died: Vec<ParticleId>,
    /// Whether the tree was (re)built this frame.
    pub rebuilt: bool,
    pub commands: Vec<DrawCommand>,
}

/// Measures wall-clock time between frames.
#[derive(Clone, Debug, Default)]
pub struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous call; zero on the first call.
    pub fn delta(&mut self, now: Instant) -> f32 {
        let dt = self
            .last
            .map(|last| now.saturating_duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last = Some(now);
        dt
    }
}

/// The full grammar → tree → particles pipeline.
#[derive(Debug)]
pub struct LParticleSystem {
    engine: GrammarEngine,
    interpreter: TurtleInterpreter,
    particles: ParticleSystem,
    config: SystemConfig,
    iterations: u32,
    angle_modifier: f32,
    growth_modifier: f32,
    pending_spawns: usize,
    emit_timer: f32,
    clock: FrameClock,
}

impl LParticleSystem {
    /// Builds the pipeline from an optional definition.
    ///
    /// A missing or malformed definition yields the default `"L"` grammar.
    /// An iteration count above `config.max_iterations` is clamped.
    pub fn new(definition: Option<GrammarDefinition>, config: SystemConfig) -> Self {
        let loaded = GrammarDefinition::load(definition);
        let iterations = if loaded.iterations > config.max_iterations {
            warn!(
                requested = loaded.iterations,
                max = config.max_iterations,
                "clamping iteration count"
            );
            config.max_iterations
        } else {
            loaded.iterations
        };
        Self {
            engine: GrammarEngine::new(loaded.grammar),
            interpreter: TurtleInterpreter::standard(
                loaded.parameters,
                config.interpreter.clone(),
            ),
            particles: ParticleSystem::new(config.particles.clone()),
            config,
            iterations,
            angle_modifier: 1.0,
            growth_modifier: 1.0,
            pending_spawns: 0,
            emit_timer: 0.0,
            clock: FrameClock::new(),
        }
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn engine(&self) -> &GrammarEngine {
        &self.engine
    }

    pub fn interpreter(&self) -> &TurtleInterpreter {
        &self.interpreter
    }

    /// Mutable access, e.g. to remap symbols. Remapping forces a rebuild.
    pub fn interpreter_mut(&mut self) -> &mut TurtleInterpreter {
        &mut self.interpreter
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    /// The tree built by the most recent frame.
    pub fn tree(&self) -> Option<&BranchTree> {
        self.interpreter.cached_tree()
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// `(angle_modifier, growth_modifier)`.
    pub fn modifiers(&self) -> (f32, f32) {
        (self.angle_modifier, self.growth_modifier)
    }

    pub fn set_draw_mode(&mut self, mode: DrawMode) {
        self.config.draw_mode = mode;
    }

    /// Queues a particle to be spawned at the root on the next frame.
    pub fn spawn_particle(&mut self) {
        self.pending_spawns += 1;
    }

    /// Sets the iteration count used from the next frame on.
    ///
    /// Negative counts and counts above `max_iterations` are rejected and
    /// leave the current count in place.
    pub fn set_iterations(&mut self, iterations: i64) -> Result<()> {
        let max = self.config.max_iterations;
        match u32::try_from(iterations) {
            Ok(n) if n <= max => {
                self.iterations = n;
                Ok(())
            }
            _ => Err(LSystemError::IterationsOutOfRange {
                requested: iterations,
                max,
            }),
        }
    }

    /// Sets the angle and growth modifiers used from the next frame on.
    pub fn set_modifiers(&mut self, angle_modifier: f32, growth_modifier: f32) -> Result<()> {
        if !angle_modifier.is_finite() {
            return Err(LSystemError::NonFiniteParameter("angleModifier"));
        }
        if !growth_modifier.is_finite() {
            return Err(LSystemError::NonFiniteParameter("growthModifier"));
        }
        self.angle_modifier = angle_modifier;
        self.growth_modifier = growth_modifier;
        Ok(())
    }

    /// Runs one frame using the wall-clock time since the previous tick.
    pub fn tick(&mut self, now: Instant) -> FrameOutput {
        let dt = self.clock.delta(now);
        self.frame(dt)
    }

    /// Runs one frame of `dt` seconds. A negative or non-finite `dt` runs
    /// the frame with zero elapsed time.
    ///
    /// 1. Expands the grammar (cached per iteration count).
    /// 2. Builds the tree (cached per string and modifiers). When it has to
    ///    be rebuilt, all live particles are retired first since their node
    ///    ids refer to the old tree.
    /// 3. Advances the particles, then spawns queued and timed root particles.
    /// 4. Emits draw commands according to the draw mode.
    pub fn frame(&mut self, dt: f32) -> FrameOutput {
        let mut output = FrameOutput::default();
        let dt = if dt.is_finite() && dt >= 0.0 {
            dt
        } else {
            warn!(dt, "ignoring invalid frame delta");
            0.0
        };

        let expanded = self.engine.expand(self.iterations);
        output.rebuilt =
            !self
                .interpreter
                .is_cached(expanded, self.angle_modifier, self.growth_modifier);
        if output.rebuilt && !self.particles.is_empty() {
            output.died = self.particles.clear();
            debug!(retired = output.died.len(), "tree inputs changed, retiring particles");
        }
        let tree = self
            .interpreter
            .interpret(expanded, self.angle_modifier, self.growth_modifier);

        let report = self.particles.advance(tree, dt);
        output.died.extend(report.died);
        output.spawned.extend(report.spawned);

        if let Some(interval) = self.config.emit_interval.filter(|i| *i > 0.0) {
            self.emit_timer += dt;
            let due = (self.emit_timer / interval).floor();
            self.emit_timer %= interval;
            let cap = self.config.max_spawns_per_frame;
            if due > cap as f32 {
                debug!(due, cap, "capping timed spawns");
            }
            self.pending_spawns += due.min(cap as f32) as usize;
        }
        for _ in 0..std::mem::take(&mut self.pending_spawns) {
            output.spawned.push(self.particles.spawn_at_root(tree));
        }

        if matches!(self.config.draw_mode, DrawMode::Tree | DrawMode::Both) {
            output.commands.extend(tree.line_segments());
        }
        if matches!(self.config.draw_mode, DrawMode::Particles | DrawMode::Both) {
            output.commands.extend(self.particles.draw(tree));
        }
        output
    }
}
