use rustc_hash::FxHashMap;
use tracing::debug;

use super::Graph;
use crate::geometry::{self, EPS_COORD};
use crate::{Point, Polyline};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BuildOptions {
    /// Decimal digits kept when quantizing node coordinates.
    pub precision: u32,
    /// Nodes closer than this get a bridging edge. `<= 0` disables bridging.
    pub merge_radius: f64,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            precision: 4,
            merge_radius: 6.0,
        }
    }
}

impl BuildOptions {
    pub fn with_merge_radius(self, merge_radius: f64) -> Self {
        Self {
            merge_radius,
            ..self
        }
    }
}

struct Segment {
    id: (usize, usize),
    a: Point,
    b: Point,
}

impl Graph {
    /// Builds the routing graph of a polyline network.
    ///
    /// Segments are split wherever another segment crosses their interior,
    /// then nodes within `merge_radius` of each other are bridged. Both passes
    /// compare every pair, so construction is quadratic in segment count.
    pub fn build(polylines: &[Polyline], options: &BuildOptions) -> Self {
        let segments: Vec<Segment> = polylines
            .iter()
            .enumerate()
            .flat_map(|(pi, polyline)| {
                polyline
                    .segments()
                    .enumerate()
                    .map(move |(si, (a, b))| Segment { id: (pi, si), a, b })
            })
            .collect();

        let splits = find_splits(&segments);

        let mut graph = Graph::new(options.precision);

        for segment in &segments {
            let mut ts = vec![0.0, 1.0];
            if let Some(interior) = splits.get(&segment.id) {
                ts.extend(interior.iter().map(|t| t.clamp(0.0, 1.0)));
            }
            ts.sort_by(f64::total_cmp);
            ts.dedup();

            let mut prev = geometry::lerp(segment.a, segment.b, ts[0]);
            let mut prev_key = graph.ensure_vertex(prev);

            for &t in &ts[1..] {
                let cur = geometry::lerp(segment.a, segment.b, t);
                let cur_key = graph.ensure_vertex(cur);
                graph.add_edge(prev_key, cur_key, geometry::distance(prev, cur));
                prev = cur;
                prev_key = cur_key;
            }
        }

        let bridges = graph.connect_nearby(options.merge_radius);

        debug!(
            segments = segments.len(),
            split_segments = splits.len(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            bridges,
            "built routing graph"
        );

        graph
    }

    /// Adds an edge between every pair of distinct nodes within `radius`.
    ///
    /// Returns the number of node pairs bridged.
    pub(crate) fn connect_nearby(&mut self, radius: f64) -> usize {
        if radius <= 0.0 {
            return 0;
        }

        let nodes = self.sorted_points();
        let mut bridged = 0;

        for (i, &(ka, pa)) in nodes.iter().enumerate() {
            for &(kb, pb) in &nodes[i + 1..] {
                let d = geometry::distance(pa, pb);
                if d <= radius {
                    // Distinct keys can sit closer than rounding distance; keep
                    // such bridges strictly positive.
                    self.add_edge(ka, kb, d.max(EPS_COORD));
                    bridged += 1;
                }
            }
        }

        bridged
    }
}

/// Interior crossing parameters per segment, over all segment pairs.
fn find_splits(segments: &[Segment]) -> FxHashMap<(usize, usize), Vec<f64>> {
    let mut splits: FxHashMap<_, Vec<f64>> = FxHashMap::default();

    for (i, first) in segments.iter().enumerate() {
        for second in &segments[i + 1..] {
            let Some((_, t, u)) =
                geometry::segment_intersection(first.a, first.b, second.a, second.b)
            else {
                continue;
            };

            if geometry::is_interior(t) {
                splits.entry(first.id).or_default().push(t);
            }
            if geometry::is_interior(u) {
                splits.entry(second.id).or_default().push(u);
            }
        }
    }

    splits
}
