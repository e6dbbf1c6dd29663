pub mod crossings;
pub mod generator;

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

pub use crossings::{count_crossings, crossing_pairs};

/// Number of nodes in every puzzle.
pub const NODE_COUNT: usize = 6;
/// Fewest edges a dealt puzzle carries.
pub const MIN_EDGES: usize = 10;
/// Upper bound on edges a puzzle may hold.
pub const MAX_EDGES: usize = 12;
/// Squared grab radius around a node.
pub const GRAB_RADIUS_SQ: i64 = 25;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("node index {0} out of range (expected 0..{NODE_COUNT})")]
    NodeOutOfRange(usize),

    #[error("edge {0} connects a node to itself")]
    SelfLoop(NodeId),

    #[error("too many edges: {0} (at most {MAX_EDGES})")]
    TooManyEdges(usize),
}

/// Bounds-checked index into the node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct NodeId(u8);

impl NodeId {
    pub fn new(index: usize) -> Result<Self, GraphError> {
        if index < NODE_COUNT {
            Ok(Self(index as u8))
        } else {
            Err(GraphError::NodeOutOfRange(index))
        }
    }

    const fn fixed(index: u8) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// All node ids in index order.
    pub fn all() -> impl Iterator<Item = NodeId> {
        (0..NODE_COUNT as u8).map(NodeId)
    }
}

impl TryFrom<usize> for NodeId {
    type Error = GraphError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Self::new(index)
    }
}

impl From<NodeId> for usize {
    fn from(id: NodeId) -> Self {
        id.index()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An undirected edge between two distinct nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "(usize, usize)", into = "(usize, usize)")]
pub struct Edge {
    a: NodeId,
    b: NodeId,
}

impl Edge {
    pub fn new(a: NodeId, b: NodeId) -> Result<Self, GraphError> {
        if a == b {
            return Err(GraphError::SelfLoop(a));
        }
        Ok(Self { a, b })
    }

    /// Build an edge from raw indices, validating both.
    pub fn from_indices(a: usize, b: usize) -> Result<Self, GraphError> {
        Self::new(NodeId::new(a)?, NodeId::new(b)?)
    }

    const fn fixed(a: u8, b: u8) -> Self {
        Self {
            a: NodeId::fixed(a),
            b: NodeId::fixed(b),
        }
    }

    pub fn endpoints(self) -> (NodeId, NodeId) {
        (self.a, self.b)
    }

    pub fn shares_endpoint(self, other: Edge) -> bool {
        self.a == other.a || self.a == other.b || self.b == other.a || self.b == other.b
    }

    pub fn touches(self, node: NodeId) -> bool {
        self.a == node || self.b == node
    }
}

impl TryFrom<(usize, usize)> for Edge {
    type Error = GraphError;

    fn try_from((a, b): (usize, usize)) -> Result<Self, Self::Error> {
        Self::from_indices(a, b)
    }
}

impl From<Edge> for (usize, usize) {
    fn from(edge: Edge) -> Self {
        (edge.a.index(), edge.b.index())
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.a, self.b)
    }
}

/// Nine edges present in every puzzle.
pub const BASE_EDGES: [Edge; 9] = [
    Edge::fixed(0, 1),
    Edge::fixed(1, 2),
    Edge::fixed(0, 4),
    Edge::fixed(4, 3),
    Edge::fixed(1, 5),
    Edge::fixed(2, 5),
    Edge::fixed(4, 5),
    Edge::fixed(3, 5),
    Edge::fixed(0, 2),
];

/// Optional edges, appended in order as the edge count grows.
pub const EXTRA_EDGES: [Edge; 3] = [Edge::fixed(0, 3), Edge::fixed(4, 1), Edge::fixed(3, 2)];

/// The fixed topology truncated to `edge_count` edges (clamped to 9..=12).
pub fn topology(edge_count: usize) -> Vec<Edge> {
    let count = edge_count.clamp(BASE_EDGES.len(), MAX_EDGES);
    BASE_EDGES
        .iter()
        .chain(EXTRA_EDGES.iter())
        .take(count)
        .copied()
        .collect()
}

/// A crossing-free embedding of the full twelve-edge topology.
///
/// Any prefix of the topology stays crossing-free in this layout, so every
/// generated puzzle is solvable by moving its nodes here.
pub fn reference_layout() -> Nodes {
    Nodes([
        Point::new(120, 45),
        Point::new(10, 230),
        Point::new(230, 230),
        Point::new(155, 150),
        Point::new(85, 150),
        Point::new(120, 200),
    ])
}

/// Fixed-size node arena.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nodes(pub [Point; NODE_COUNT]);

impl Nodes {
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Point)> + '_ {
        NodeId::all().zip(self.0.iter().copied())
    }

    /// First node (in index order) within the grab radius of `at`.
    pub fn hit_test(&self, at: Point) -> Option<NodeId> {
        self.iter()
            .find(|(_, p)| p.distance_sq(at) <= GRAB_RADIUS_SQ)
            .map(|(id, _)| id)
    }
}

impl Index<NodeId> for Nodes {
    type Output = Point;

    fn index(&self, id: NodeId) -> &Point {
        &self.0[id.index()]
    }
}

impl IndexMut<NodeId> for Nodes {
    fn index_mut(&mut self, id: NodeId) -> &mut Point {
        &mut self.0[id.index()]
    }
}

/// Node layout plus edge list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
    pub nodes: Nodes,
    edges: Vec<Edge>,
}

impl Puzzle {
    pub fn new(nodes: Nodes, edges: Vec<Edge>) -> Result<Self, GraphError> {
        if edges.len() > MAX_EDGES {
            return Err(GraphError::TooManyEdges(edges.len()));
        }
        Ok(Self { nodes, edges })
    }

    /// All nodes at the origin, no edges. Placeholder before a puzzle is dealt.
    pub fn empty() -> Self {
        Self {
            nodes: Nodes::default(),
            edges: Vec::new(),
        }
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn crossings(&self) -> usize {
        count_crossings(&self.nodes, &self.edges)
    }

    /// Validate a deserialized puzzle (serde does not see the edge limit).
    pub fn validated(self) -> Result<Self, GraphError> {
        Self::new(self.nodes, self.edges)
    }
}
