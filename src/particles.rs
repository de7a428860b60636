//! Particles that stream along the edges of a [`BranchTree`].
//!
//! Each particle rides the edge leading into its current node, from the
//! node's `position0` to its `position1`, under a simple gravity model.
//! When its life runs out it forks one new particle onto every sibling
//! branch and continues onto the first child, or dies at a leaf.

use crate::draw::DrawCommand;
use crate::error::{LSystemError, Result};
use crate::tree::{BranchTree, NodeId, TreeNode};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

/// Unique, monotonically increasing particle identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticleId(pub u64);

/// Physics constants for the particle animation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Seconds a particle spends on one edge.
    pub max_life: f32,
    /// Vertical acceleration. Positive is down (screen space).
    pub gravity: f32,
    /// Height of the floor; positions beyond it bounce.
    pub floor: f32,
    /// Fraction of vertical speed kept after a bounce.
    pub restitution: f32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            max_life: 1.0,
            gravity: 10.0,
            floor: 300.0,
            restitution: 0.9,
        }
    }
}

impl ParticleConfig {
    /// Rejects non-finite constants and a `max_life` that is not positive.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("maxLife", self.max_life),
            ("gravity", self.gravity),
            ("floor", self.floor),
            ("restitution", self.restitution),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(LSystemError::NonFiniteParameter(name));
            }
        }
        if self.max_life <= 0.0 {
            return Err(LSystemError::NonPositiveLifetime(self.max_life));
        }
        Ok(())
    }
}

/// A point travelling along one tree edge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub id: ParticleId,
    /// The node whose incoming edge is being travelled.
    pub node: NodeId,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Seconds spent on the current edge.
    pub life: f32,
}

impl Particle {
    /// Places the particle at the start of `node`'s edge with a velocity
    /// that reaches the end of it after `max_life` seconds, absent gravity.
    fn attach(&mut self, id: NodeId, node: &TreeNode, max_life: f32) {
        let (start, end) = (node.state.position0, node.state.position1);
        self.node = id;
        self.position = start;
        self.velocity = (end - start) / max_life;
        self.life = 0.0;
    }

    fn integrate(&mut self, dt: f32, config: &ParticleConfig) {
        self.position += self.velocity * dt;
        self.velocity.y += config.gravity * dt;
        if self.position.y > config.floor {
            self.position.y = config.floor;
            self.velocity.y *= -config.restitution;
        }
        self.life += dt;
    }
}

/// Particles created and retired during one [`ParticleSystem::advance`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepReport {
    pub spawned: Vec<ParticleId>,
    pub died: Vec<ParticleId>,
}

/// The live particle set.
///
/// Particles refer to nodes of a tree they do not own. Every call must be
/// given the same tree the particles were spawned on; when the tree is
/// replaced, [`clear`](Self::clear) first.
#[derive(Clone, Debug, Default)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    config: ParticleConfig,
    next_id: u64,
}

impl ParticleSystem {
    /// An invalid `config` is replaced by [`ParticleConfig::default`].
    pub fn new(config: ParticleConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(err) => {
                warn!(%err, "invalid particle config, using defaults");
                ParticleConfig::default()
            }
        };
        Self {
            particles: Vec::new(),
            config,
            next_id: 0,
        }
    }

    pub fn config(&self) -> &ParticleConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.iter().find(|p| p.id == id)
    }

    fn next_id(&mut self) -> ParticleId {
        let id = ParticleId(self.next_id);
        self.next_id += 1;
        id
    }

    fn push(&mut self, id: NodeId, node: &TreeNode) -> ParticleId {
        let mut particle = Particle {
            id: self.next_id(),
            node: id,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            life: 0.0,
        };
        particle.attach(id, node, self.config.max_life);
        let particle_id = particle.id;
        self.particles.push(particle);
        particle_id
    }

    /// Spawns a particle on `node`'s incoming edge, or returns `None` if
    /// `tree` has no such node.
    pub fn spawn(&mut self, tree: &BranchTree, node: NodeId) -> Option<ParticleId> {
        let target = tree.get(node)?;
        Some(self.push(node, target))
    }

    /// Spawns a particle at the root of `tree`.
    pub fn spawn_at_root(&mut self, tree: &BranchTree) -> ParticleId {
        self.push(BranchTree::ROOT, tree.root())
    }

    /// Retires every particle, returning their ids.
    pub fn clear(&mut self) -> Vec<ParticleId> {
        self.particles.drain(..).map(|p| p.id).collect()
    }

    /// Steps every live particle by `dt` seconds.
    ///
    /// A particle whose life exceeds `max_life` completes its edge: every
    /// child of its node after the first gets a new particle, then the
    /// particle moves onto the first child, or dies if the node is a leaf.
    /// At most one edge is completed per particle per call, however large
    /// `dt` is. Particles forked here are first advanced on the next call.
    pub fn advance(&mut self, tree: &BranchTree, dt: f32) -> StepReport {
        let mut report = StepReport::default();
        let mut forks = Vec::new();
        let config = &self.config;

        self.particles.retain_mut(|particle| {
            particle.integrate(dt, config);
            if particle.life <= config.max_life {
                return true;
            }
            let children = tree.children(particle.node);
            let next = children
                .split_first()
                .and_then(|(&first, _)| tree.get(first).map(|node| (first, node)));
            match next {
                Some((first, node)) => {
                    forks.extend_from_slice(&children[1..]);
                    particle.attach(first, node, config.max_life);
                    true
                }
                None => {
                    report.died.push(particle.id);
                    false
                }
            }
        });

        for id in forks {
            if let Some(node) = tree.get(id) {
                report.spawned.push(self.push(id, node));
            }
        }

        trace!(
            live = self.particles.len(),
            spawned = report.spawned.len(),
            died = report.died.len(),
            "advanced particles"
        );
        report
    }

    /// One point per particle, coloured by the node it is travelling to.
    pub fn draw(&self, tree: &BranchTree) -> Vec<DrawCommand> {
        self.particles
            .iter()
            .filter_map(|p| {
                tree.get(p.node).map(|node| DrawCommand::Point {
                    position: p.position,
                    color: node.state.color(),
                })
            })
            .collect()
    }
}
