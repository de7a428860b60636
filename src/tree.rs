use crate::draw::DrawCommand;
use crate::turtle::TurtleState;
use serde::{Deserialize, Serialize};

/// Index of a node inside a [`BranchTree`].
pub type NodeId = usize;

/// The branching structure traced by the turtle.
///
/// Nodes live in a flat arena and refer to each other by [`NodeId`]. Node
/// ids are stable for the lifetime of the tree, which lets particles hold
/// plain indices instead of borrows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BranchTree {
    nodes: Vec<TreeNode>,
}

/// One snapshot of the turtle plus its ordered children.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Turtle state when this node was emitted; `position1` is the point
    /// the node sits at.
    pub state: TurtleState,

    /// The node this one hangs from. `None` only for the root.
    pub parent: Option<NodeId>,

    /// Children in emission order.
    pub children: Vec<NodeId>,
}

impl BranchTree {
    /// The id of the root node.
    pub const ROOT: NodeId = 0;

    /// Creates a tree holding only the root.
    pub fn new(root_state: TurtleState) -> Self {
        Self {
            nodes: vec![TreeNode {
                state: root_state,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> &TreeNode {
        &self.nodes[Self::ROOT]
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    /// Appends a node holding `state` as the last child of `parent` and
    /// returns its id.
    ///
    /// # Panics
    /// If `parent` is not a node of this tree.
    pub fn add_child(&mut self, parent: NodeId, state: TurtleState) -> NodeId {
        let id = self.nodes.len();
        self.nodes[parent].children.push(id);
        self.nodes.push(TreeNode {
            state,
            parent: Some(parent),
            children: Vec::new(),
        });
        id
    }

    /// Children of `id`; empty for unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.children(id).is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &TreeNode)> {
        self.nodes.iter().enumerate()
    }

    /// Number of leaf nodes.
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.children.is_empty()).count()
    }

    /// One line per edge, depth first, from each parent's `position1` to
    /// the child's `position1`, coloured by the child.
    pub fn line_segments(&self) -> Vec<DrawCommand> {
        let mut lines = Vec::with_capacity(self.nodes.len().saturating_sub(1));
        // Pending (parent, child) edges, reversed so the first child pops first.
        let mut stack: Vec<(NodeId, NodeId)> = self
            .children(Self::ROOT)
            .iter()
            .rev()
            .map(|&child| (Self::ROOT, child))
            .collect();
        while let Some((parent, id)) = stack.pop() {
            let node = &self.nodes[id];
            lines.push(DrawCommand::Line {
                start: self.nodes[parent].state.position1,
                end: node.state.position1,
                color: node.state.color(),
            });
            stack.extend(node.children.iter().rev().map(|&child| (id, child)));
        }
        lines
    }
}
