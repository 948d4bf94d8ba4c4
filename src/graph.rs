use rustc_hash::FxHashMap;

use crate::Point;

mod builder;

pub use builder::BuildOptions;

type HashMap<K, V> = FxHashMap<K, V>;

/// Most decimal digits a node key can keep. Beyond this, map-scale coordinates
/// overflow the `i64` range and distinct points saturate into one key.
pub const MAX_PRECISION: u32 = 9;

/// Node identity: a point rounded to `precision` decimal digits, stored as integers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuantizedPoint {
    pub x: i64,
    pub y: i64,
}

impl QuantizedPoint {
    pub fn new(point: Point, precision: u32) -> Self {
        let scale = 10f64.powi(precision as i32);
        Self {
            x: (point.x * scale).round() as i64,
            y: (point.y * scale).round() as i64,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Terminal {
    Start,
    End,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKey {
    /// A node of the drawn network.
    Vertex(QuantizedPoint),
    /// Query-scoped projection of a terminal onto its nearest segment.
    Projection(Terminal),
    /// Query-scoped super-source (`Start`) or super-sink (`End`).
    Super(Terminal),
}

impl NodeKey {
    pub fn is_ephemeral(&self) -> bool {
        !matches!(self, NodeKey::Vertex(_))
    }
}

/// Undirected weighted graph keyed by [`NodeKey`].
///
/// Every edge is stored in both directions with the same weight and there are
/// no self-loops.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
    precision: u32,
    adjacency: HashMap<NodeKey, HashMap<NodeKey, f64>>,
    points: HashMap<NodeKey, Point>,
}

impl Graph {
    /// `precision` is clamped to [`MAX_PRECISION`].
    pub fn new(precision: u32) -> Self {
        Self {
            precision: precision.min(MAX_PRECISION),
            adjacency: HashMap::default(),
            points: HashMap::default(),
        }
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn key_for(&self, point: Point) -> NodeKey {
        NodeKey::Vertex(QuantizedPoint::new(point, self.precision))
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(|edges| edges.len()).sum::<usize>() / 2
    }

    pub fn contains(&self, key: &NodeKey) -> bool {
        self.adjacency.contains_key(key)
    }

    /// Coordinate a node was first created with.
    pub fn point(&self, key: &NodeKey) -> Option<Point> {
        self.points.get(key).copied()
    }

    pub fn weight(&self, from: &NodeKey, to: &NodeKey) -> Option<f64> {
        self.adjacency.get(from)?.get(to).copied()
    }

    pub fn neighbors(&self, key: &NodeKey) -> impl Iterator<Item = (&NodeKey, f64)> {
        self.adjacency
            .get(key)
            .into_iter()
            .flat_map(|edges| edges.iter().map(|(to, &weight)| (to, weight)))
    }

    pub fn keys(&self) -> impl Iterator<Item = &NodeKey> {
        self.adjacency.keys()
    }

    /// Nodes that carry a coordinate, in a stable order.
    pub fn sorted_points(&self) -> Vec<(NodeKey, Point)> {
        let mut nodes: Vec<_> = self.points.iter().map(|(&k, &p)| (k, p)).collect();
        nodes.sort_by_key(|&(key, _)| key);
        nodes
    }

    /// Returns the key for `point`, creating the node on first sight.
    pub(crate) fn ensure_vertex(&mut self, point: Point) -> NodeKey {
        let key = self.key_for(point);
        self.insert_node(key, point);
        key
    }

    pub(crate) fn insert_node(&mut self, key: NodeKey, point: Point) {
        self.adjacency.entry(key).or_default();
        self.points.entry(key).or_insert(point);
    }

    /// Adds `from <-> to`, keeping the smaller weight if the edge exists.
    pub(crate) fn add_edge(&mut self, from: NodeKey, to: NodeKey, weight: f64) {
        if from == to {
            return;
        }

        let mut insert = |a: NodeKey, b: NodeKey| {
            let current = self
                .adjacency
                .entry(a)
                .or_default()
                .entry(b)
                .or_insert(weight);
            *current = current.min(weight);
        };

        insert(from, to);
        insert(to, from);
    }

    /// Drops `key` together with every edge that references it.
    pub(crate) fn remove_node(&mut self, key: &NodeKey) {
        if let Some(edges) = self.adjacency.remove(key) {
            for neighbor in edges.keys() {
                if let Some(back) = self.adjacency.get_mut(neighbor) {
                    back.remove(key);
                }
            }
        }
        self.points.remove(key);
    }
}
