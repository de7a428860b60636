//! Interpreter that converts an expanded L-System string into a [`BranchTree`].
//!
//! The entry point is [`TurtleInterpreter`]. Configure it with the grammar's
//! [`GrammarParameters`] and an [`InterpreterConfig`], register
//! symbol-to-operation mappings via [`TurtleInterpreter::set_op`] or
//! [`TurtleInterpreter::populate_standard_symbols`], then call
//! [`TurtleInterpreter::interpret`] with the expanded string.

use crate::grammar::GrammarParameters;
use crate::tree::{BranchTree, NodeId};
use crate::turtle::{TurtleOp, TurtleState};
use std::collections::HashMap;
use tracing::debug;

/// Configuration for turtle interpretation.
#[derive(Clone, Debug)]
pub struct InterpreterConfig {
    /// Maximum stack depth for push/pop operations.
    pub max_stack_depth: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_stack_depth: 1024,
        }
    }
}

/// The inputs a tree was built from, and the tree itself.
#[derive(Clone, Debug)]
struct TreeCache {
    expanded: String,
    angle_modifier: f32,
    growth_modifier: f32,
    tree: BranchTree,
}

impl TreeCache {
    fn matches(&self, expanded: &str, angle_modifier: f32, growth_modifier: f32) -> bool {
        self.angle_modifier == angle_modifier
            && self.growth_modifier == growth_modifier
            && self.expanded == expanded
    }
}

/// Interprets expanded L-System strings into branch trees.
#[derive(Clone, Debug)]
pub struct TurtleInterpreter {
    op_map: HashMap<char, TurtleOp>,
    parameters: GrammarParameters,
    config: InterpreterConfig,
    cache: Option<TreeCache>,
}

impl TurtleInterpreter {
    /// Creates a new interpreter with an empty symbol map.
    ///
    /// Register operations with [`set_op`](Self::set_op) or
    /// [`populate_standard_symbols`](Self::populate_standard_symbols) before calling
    /// [`interpret`](Self::interpret).
    pub fn new(parameters: GrammarParameters, config: InterpreterConfig) -> Self {
        Self {
            op_map: HashMap::new(),
            parameters,
            config,
            cache: None,
        }
    }

    /// Creates an interpreter with the standard symbol table already registered.
    pub fn standard(parameters: GrammarParameters, config: InterpreterConfig) -> Self {
        let mut interpreter = Self::new(parameters, config);
        interpreter.populate_standard_symbols();
        interpreter
    }

    /// Replaces the entire symbol-to-operation map in one step (builder pattern).
    ///
    /// Symbols missing from `map` are treated as [`TurtleOp::Ignore`].
    pub fn with_map(mut self, map: HashMap<char, TurtleOp>) -> Self {
        self.op_map = map;
        self.cache = None;
        self
    }

    /// Assigns a single [`TurtleOp`] to a symbol. Drops any cached tree.
    pub fn set_op(&mut self, symbol: char, op: TurtleOp) {
        self.op_map.insert(symbol, op);
        self.cache = None;
    }

    /// Registers the conventional symbol-to-operation mappings.
    ///
    /// See the crate README for the full symbol table.
    pub fn populate_standard_symbols(&mut self) {
        let mappings = [
            // Drawing
            ('F', TurtleOp::Forward),
            // Rotation
            ('+', TurtleOp::Yaw(1.0)),
            ('-', TurtleOp::Yaw(-1.0)),
            ('/', TurtleOp::Pitch(1.0)),
            ('\\', TurtleOp::Pitch(-1.0)),
            ('}', TurtleOp::Roll(1.0)),
            ('{', TurtleOp::Roll(-1.0)),
            ('|', TurtleOp::Reverse),
            ('!', TurtleOp::FlipAngle),
            // Growth
            ('<', TurtleOp::GrowSize(1.0)),
            ('>', TurtleOp::GrowSize(-1.0)),
            ('(', TurtleOp::GrowAngle(1.0)),
            (')', TurtleOp::GrowAngle(-1.0)),
            // Flow
            ('[', TurtleOp::Push),
            (']', TurtleOp::Pop),
        ];

        for (symbol, op) in mappings {
            self.set_op(symbol, op);
        }
    }

    pub fn parameters(&self) -> &GrammarParameters {
        &self.parameters
    }

    /// The most recently built tree, if any.
    pub fn cached_tree(&self) -> Option<&BranchTree> {
        self.cache.as_ref().map(|c| &c.tree)
    }

    /// Whether [`interpret`](Self::interpret) with these inputs would reuse
    /// the cached tree.
    pub fn is_cached(&self, expanded: &str, angle_modifier: f32, growth_modifier: f32) -> bool {
        self.cache
            .as_ref()
            .is_some_and(|c| c.matches(expanded, angle_modifier, growth_modifier))
    }

    /// Returns the tree for `expanded`, rebuilding it only when the string
    /// or either modifier differs from the previous call.
    pub fn interpret(
        &mut self,
        expanded: &str,
        angle_modifier: f32,
        growth_modifier: f32,
    ) -> &BranchTree {
        let cache = match self.cache.take() {
            Some(cache) if cache.matches(expanded, angle_modifier, growth_modifier) => cache,
            _ => {
                let tree = self.build_tree(expanded, angle_modifier, growth_modifier);
                debug!(
                    nodes = tree.len(),
                    leaves = tree.leaf_count(),
                    angle_modifier,
                    growth_modifier,
                    "built branch tree"
                );
                TreeCache {
                    expanded: expanded.to_string(),
                    angle_modifier,
                    growth_modifier,
                    tree,
                }
            }
        };
        &self.cache.insert(cache).tree
    }

    /// Walks `expanded` and builds a fresh [`BranchTree`], bypassing the cache.
    ///
    /// The turtle starts at the origin with identity orientation, walking
    /// along `+X`. The root node holds that initial state. Symbols with no
    /// registered mapping are silently ignored.
    ///
    /// # Forward
    ///
    /// `F` moves the turtle `step_size × angle_modifier` along its heading
    /// and appends a child to the current node holding a copy of the new
    /// state. The child becomes the current node.
    ///
    /// # Push / Pop
    ///
    /// `[` saves the turtle state together with the current node, then opens
    /// a branch: a child holding a copy of the state, which becomes current.
    /// `]` restores the saved state and makes the node that was current at
    /// the matching `[` current again, so later symbols attach siblings of
    /// the branch. Pushes beyond `max_stack_depth` are dropped along with
    /// their matching pops. Unmatched pops are ignored.
    pub fn build_tree(
        &self,
        expanded: &str,
        angle_modifier: f32,
        growth_modifier: f32,
    ) -> BranchTree {
        let mut turtle = TurtleState::from_parameters(&self.parameters);
        let mut tree = BranchTree::new(turtle.clone());
        let mut node: NodeId = BranchTree::ROOT;
        let mut stack: Vec<(TurtleState, NodeId)> = Vec::new();
        let mut dropped_pushes = 0usize;

        for symbol in expanded.chars() {
            let op = self
                .op_map
                .get(&symbol)
                .copied()
                .unwrap_or(TurtleOp::Ignore);

            match op {
                TurtleOp::Forward => {
                    turtle.advance(turtle.step_size * angle_modifier);
                    node = tree.add_child(node, turtle.clone());
                }
                TurtleOp::Yaw(s) => turtle.yaw(s * turtle.step_angle * angle_modifier),
                TurtleOp::Pitch(s) => turtle.pitch(s * turtle.step_angle * angle_modifier),
                TurtleOp::Roll(s) => turtle.roll(s * turtle.step_angle * angle_modifier),
                TurtleOp::Reverse => turtle.reverse(),
                TurtleOp::FlipAngle => turtle.step_angle = -turtle.step_angle,
                TurtleOp::GrowSize(s) => {
                    turtle.grow_size(1.0 + s * self.parameters.size_growth);
                }
                TurtleOp::GrowAngle(s) => {
                    turtle.grow_angle(s * self.parameters.angle_growth * growth_modifier);
                }
                TurtleOp::Push => {
                    if stack.len() < self.config.max_stack_depth {
                        stack.push((turtle.clone(), node));
                        node = tree.add_child(node, turtle.clone());
                    } else {
                        dropped_pushes += 1;
                    }
                }
                TurtleOp::Pop => {
                    if dropped_pushes > 0 {
                        dropped_pushes -= 1;
                    } else if let Some((state, branch_point)) = stack.pop() {
                        turtle = state;
                        node = branch_point;
                    } else {
                        debug!("ignoring unmatched pop");
                    }
                }
                TurtleOp::Ignore => {}
            }
        }

        tree
    }
}
