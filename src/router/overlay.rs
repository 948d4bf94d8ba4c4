use std::ops::Deref;

use crate::geometry::{self, EPS_COORD, EPS_DEGENERATE, EPS_ON_SEGMENT};
use crate::graph::{Graph, NodeKey, Terminal};
use crate::{Point, Polyline};

/// Nearest point of the network to a query point.
#[derive(Copy, Clone, Debug)]
pub(super) struct Snap {
    pub a: Point,
    pub b: Point,
    pub point: Point,
    pub t: f64,
    pub offset: f64,
}

impl Snap {
    /// Global arg-min over every segment of every polyline; the first segment wins ties.
    pub fn find(polylines: &[Polyline], query: Point) -> Option<Self> {
        let mut best: Option<Snap> = None;

        for (a, b) in polylines.iter().flat_map(Polyline::segments) {
            let (point, t) = geometry::project_point_to_segment(query, a, b);
            let offset = geometry::distance(query, point);

            if best.map_or(true, |snap| offset < snap.offset) {
                best = Some(Snap {
                    a,
                    b,
                    point,
                    t,
                    offset,
                });
            }
        }

        best.filter(|snap| snap.point.is_finite() && snap.offset.is_finite())
    }
}

/// Query-scoped view of a graph with ephemeral nodes spliced in.
///
/// Every node added through the overlay is removed, together with all edges
/// touching it, when the overlay is dropped.
pub(super) struct QueryOverlay<'g> {
    graph: &'g mut Graph,
    added: Vec<NodeKey>,
}

impl<'g> QueryOverlay<'g> {
    pub fn new(graph: &'g mut Graph) -> Self {
        Self {
            graph,
            added: Vec::with_capacity(4),
        }
    }

    fn add_node(&mut self, key: NodeKey, point: Point) {
        debug_assert!(key.is_ephemeral() && !self.graph.contains(&key));
        self.graph.insert_node(key, point);
        self.added.push(key);
    }

    fn add_edge_to_vertex(&mut self, key: NodeKey, vertex: Point, weight: f64) {
        let vertex = self.graph.key_for(vertex);
        if self.graph.contains(&vertex) {
            self.graph.add_edge(key, vertex, weight);
        }
    }

    /// Inserts the projection node of `terminal` on its matched segment.
    pub fn splice(&mut self, terminal: Terminal, snap: &Snap) {
        let key = NodeKey::Projection(terminal);
        self.add_node(key, snap.point);
        self.add_edge_to_vertex(key, snap.a, geometry::distance(snap.a, snap.point));
        self.add_edge_to_vertex(key, snap.b, geometry::distance(snap.point, snap.b));
    }

    /// Links the projection node of `terminal` to every other node lying
    /// strictly inside its matched segment, weighted by along-segment distance.
    pub fn connect_along_segment(&mut self, terminal: Terminal, snap: &Snap) {
        let length = geometry::distance(snap.a, snap.b);
        if length <= EPS_DEGENERATE {
            return;
        }

        let key = NodeKey::Projection(terminal);
        let on_segment: Vec<_> = self
            .graph
            .sorted_points()
            .into_iter()
            .filter(|&(other, _)| other != key)
            .filter_map(|(other, point)| {
                let (closest, t) = geometry::project_point_to_segment(point, snap.a, snap.b);
                let interior = t > EPS_COORD && t < 1.0 - EPS_COORD;
                (interior && geometry::distance(closest, point) <= EPS_ON_SEGMENT)
                    .then(|| (other, (t - snap.t).abs() * length))
            })
            .collect();

        for (other, weight) in on_segment {
            self.graph.add_edge(key, other, weight);
        }
    }

    /// Adds the super node of `terminal` at its raw query point.
    pub fn attach_terminal(&mut self, terminal: Terminal, raw: Point, snap: &Snap) {
        let key = NodeKey::Super(terminal);
        self.add_node(key, raw);
        self.graph
            .add_edge(key, NodeKey::Projection(terminal), snap.offset);
    }
}

impl Deref for QueryOverlay<'_> {
    type Target = Graph;

    fn deref(&self) -> &Graph {
        &*self.graph
    }
}

impl Drop for QueryOverlay<'_> {
    fn drop(&mut self) {
        for key in self.added.drain(..).rev() {
            self.graph.remove_node(&key);
        }
    }
}
