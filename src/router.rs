use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry;
use crate::graph::{BuildOptions, Graph, NodeKey, Terminal};
use crate::{path_length, Point, Polyline};

use overlay::{QueryOverlay, Snap};

mod overlay;
mod search;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Dijkstra,
    AStar,
}

impl Algorithm {
    /// Case-insensitive; recognizes `"dijkstra"` and `"astar"`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "dijkstra" => Some(Self::Dijkstra),
            "astar" => Some(Self::AStar),
            _ => None,
        }
    }

    /// `default` when `name` is absent or unrecognized.
    pub fn select(name: Option<&str>, default: Self) -> Self {
        name.and_then(Self::parse).unwrap_or(default)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes popped and expanded before the sink was settled.
    pub settled: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    /// Walkable path from the raw start to the raw end.
    pub points: Vec<Point>,
    pub length: f64,
    /// Set when the straight segment was returned instead of a network path.
    pub fallback: bool,
    pub search: Option<SearchStats>,
}

impl Route {
    pub fn straight(start: Point, end: Point) -> Self {
        Self {
            points: vec![start, end],
            length: geometry::distance(start, end),
            fallback: true,
            search: None,
        }
    }

    fn found(points: Vec<Point>, settled: usize) -> Self {
        Self {
            length: path_length(&points),
            points,
            fallback: false,
            search: Some(SearchStats { settled }),
        }
    }
}

/// A polyline network together with its routing graph.
///
/// Queries temporarily splice ephemeral nodes into the graph, so each query
/// holds the graph lock from snapping until cleanup.
pub struct Network {
    polylines: Vec<Polyline>,
    graph: Mutex<Graph>,
}

impl Network {
    pub fn build(polylines: Vec<Polyline>, options: &BuildOptions) -> Self {
        let graph = Graph::build(&polylines, options);
        Self {
            polylines,
            graph: Mutex::new(graph),
        }
    }

    pub fn polylines(&self) -> &[Polyline] {
        &self.polylines
    }

    pub fn is_empty(&self) -> bool {
        self.polylines.is_empty()
    }

    pub fn graph_snapshot(&self) -> Graph {
        self.lock().clone()
    }

    /// Shortest walkable path from `start` to `end`.
    ///
    /// Never fails: without a network, or when `end` cannot be reached, the
    /// straight segment `[start, end]` is returned.
    pub fn route(&self, start: Point, end: Point, algorithm: Algorithm) -> Route {
        if self.is_empty() {
            debug!("no walkable segments, using straight line");
            return Route::straight(start, end);
        }

        let mut graph = self.lock();
        shortest_path(&mut graph, &self.polylines, start, end, algorithm)
    }

    // The overlay restores the graph while unwinding, so a poisoned lock
    // still guards a clean graph.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Graph> {
        self.graph.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub(crate) fn shortest_path(
    graph: &mut Graph,
    polylines: &[Polyline],
    start: Point,
    end: Point,
    algorithm: Algorithm,
) -> Route {
    let (Some(start_snap), Some(end_snap)) =
        (Snap::find(polylines, start), Snap::find(polylines, end))
    else {
        debug!(?start, ?end, "could not snap to network, using straight line");
        return Route::straight(start, end);
    };

    let mut overlay = QueryOverlay::new(graph);

    overlay.splice(Terminal::Start, &start_snap);
    overlay.splice(Terminal::End, &end_snap);
    overlay.connect_along_segment(Terminal::Start, &start_snap);
    overlay.connect_along_segment(Terminal::End, &end_snap);
    overlay.attach_terminal(Terminal::Start, start, &start_snap);
    overlay.attach_terminal(Terminal::End, end, &end_snap);

    let source = NodeKey::Super(Terminal::Start);
    let sink = NodeKey::Super(Terminal::End);

    let outcome = match algorithm {
        Algorithm::Dijkstra => search::dijkstra(&overlay, source, sink),
        Algorithm::AStar => search::astar(&overlay, source, sink, |key| {
            overlay.point(key).map_or(0.0, |p| geometry::distance(p, end))
        }),
    };

    let Some(outcome) = outcome else {
        debug!(?start, ?end, ?algorithm, "sink unreachable, using straight line");
        return Route::straight(start, end);
    };

    let mut points: Vec<Point> = Vec::with_capacity(outcome.path.len());
    for key in &outcome.path {
        let Some(point) = overlay.point(key) else {
            continue;
        };
        if points.last().map_or(true, |last| !last.approx_eq(&point)) {
            points.push(point);
        }
    }
    // A collapsed tail keeps the first of the near-equal points; the route
    // still has to end on the raw query point.
    if let Some(last) = points.last_mut() {
        *last = end;
    }

    debug!(
        ?algorithm,
        hops = outcome.path.len(),
        distance = outcome.distance,
        settled = outcome.settled,
        "route found"
    );

    Route::found(points, outcome.settled)
}

#[cfg(test)]
mod tests {
    use crate::geometry::distance;
    use crate::*;
    use rstest::rstest;

    fn polyline(points: &[(f64, f64)]) -> Polyline {
        Polyline::try_from(points.to_vec()).unwrap()
    }

    fn network(lines: &[&[(f64, f64)]]) -> Network {
        Network::build(
            lines.iter().map(|l| polyline(l)).collect(),
            &BuildOptions::default(),
        )
    }

    fn assert_points(actual: &[Point], expected: &[(f64, f64)]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?}");
        for (a, &e) in actual.iter().zip(expected) {
            assert!(distance(*a, Point::from(e)) < 1e-9, "{actual:?}");
        }
    }

    #[rstest]
    #[case(Algorithm::Dijkstra)]
    #[case(Algorithm::AStar)]
    fn test_single_polyline(#[case] algorithm: Algorithm) {
        let network = network(&[&[(0.0, 0.0), (10.0, 0.0)]]);
        let route = network.route(Point::new(0.0, 1.0), Point::new(10.0, 1.0), algorithm);

        assert!(!route.fallback);
        assert_points(
            &route.points,
            &[(0.0, 1.0), (0.0, 0.0), (10.0, 0.0), (10.0, 1.0)],
        );
        assert!((route.length - 12.0).abs() < 1e-6);
    }

    #[rstest]
    #[case(Algorithm::Dijkstra)]
    #[case(Algorithm::AStar)]
    fn test_route_through_crossing(#[case] algorithm: Algorithm) {
        let network = network(&[
            &[(0.0, 0.0), (100.0, 100.0)],
            &[(0.0, 100.0), (100.0, 0.0)],
        ]);
        let route = network.route(Point::new(-2.0, 0.0), Point::new(102.0, 0.0), algorithm);

        assert!(!route.fallback);
        assert!(route
            .points
            .iter()
            .any(|p| distance(*p, Point::new(50.0, 50.0)) < 1e-6));
        assert_eq!(route.points.first(), Some(&Point::new(-2.0, 0.0)));
        assert_eq!(route.points.last(), Some(&Point::new(102.0, 0.0)));
        assert!((route.length - (2.0 + 200f64.sqrt() * 10.0 + 2.0)).abs() < 1e-6);
    }

    #[test]
    fn test_enters_mid_segment() {
        let network = network(&[&[(0.0, 0.0), (100.0, 0.0)]]);
        let route = network.route(Point::new(30.0, 5.0), Point::new(60.0, -5.0), Algorithm::AStar);

        assert_points(
            &route.points,
            &[(30.0, 5.0), (30.0, 0.0), (60.0, 0.0), (60.0, -5.0)],
        );
        assert!((route.length - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_enters_mid_split_segment() {
        let network = network(&[&[(0.0, 0.0), (100.0, 0.0)], &[(50.0, -40.0), (50.0, 40.0)]]);
        let route = network.route(Point::new(30.0, 1.0), Point::new(51.0, 20.0), Algorithm::Dijkstra);

        assert_points(
            &route.points,
            &[(30.0, 1.0), (30.0, 0.0), (50.0, 0.0), (50.0, 20.0), (51.0, 20.0)],
        );
        assert!((route.length - 42.0).abs() < 1e-9);
    }

    #[rstest]
    #[case(Algorithm::Dijkstra)]
    #[case(Algorithm::AStar)]
    fn test_unreachable_falls_back(#[case] algorithm: Algorithm) {
        let network = network(&[&[(0.0, 0.0), (10.0, 0.0)], &[(100.0, 0.0), (110.0, 0.0)]]);
        let start = Point::new(1.0, 1.0);
        let end = Point::new(105.0, 1.0);
        let before = network.graph_snapshot();

        let route = network.route(start, end, algorithm);

        assert!(route.fallback);
        assert_eq!(route.points, vec![start, end]);
        assert_eq!(network.graph_snapshot(), before);
    }

    #[test]
    fn test_ends_on_raw_point_after_collapse() {
        let network = network(&[&[(0.0, 0.0), (10.0, 0.0)]]);
        let end = Point::new(10.0, 5e-7);
        let route = network.route(Point::new(0.0, 1.0), end, Algorithm::Dijkstra);

        assert!(!route.fallback);
        assert_eq!(route.points.len(), 3, "{:?}", route.points);
        assert_eq!(route.points.first(), Some(&Point::new(0.0, 1.0)));
        assert_eq!(route.points.last(), Some(&end));
    }

    #[rstest]
    #[case(Point::new(f64::NAN, 0.0))]
    #[case(Point::new(0.0, f64::INFINITY))]
    fn test_unprojectable_point_falls_back(#[case] end: Point) {
        let network = network(&[&[(0.0, 0.0), (10.0, 0.0)]]);
        let start = Point::new(1.0, 1.0);
        let before = network.graph_snapshot();

        let route = network.route(start, end, Algorithm::AStar);

        assert!(route.fallback);
        assert_eq!(route.points.len(), 2);
        assert_eq!(route.points[0], start);
        assert!(route.search.is_none());
        assert_eq!(network.graph_snapshot(), before);
    }

    #[test]
    fn test_high_precision_keeps_corridors_apart() {
        let options = BuildOptions {
            precision: 16,
            merge_radius: 0.0,
        };
        let network = Network::build(
            vec![
                polyline(&[(0.0, 0.0), (1000.0, 0.0)]),
                polyline(&[(2000.0, 0.0), (3000.0, 0.0)]),
            ],
            &options,
        );

        let graph = network.graph_snapshot();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 2);

        let route = network.route(Point::new(0.0, 1.0), Point::new(3000.0, 1.0), Algorithm::Dijkstra);
        assert!(route.fallback);
    }

    #[test]
    fn test_concurrent_queries_share_network() {
        let network = network(&[
            &[(0.0, 0.0), (30.0, 0.0), (30.0, 20.0)],
            &[(0.0, 0.0), (0.0, 20.0), (30.0, 20.0)],
        ]);
        let before = network.graph_snapshot();
        let queries = [
            (Point::new(2.0, -1.0), Point::new(29.0, 21.0)),
            (Point::new(-1.0, 18.0), Point::new(31.0, 3.0)),
            (Point::new(5.0, 1.0), Point::new(25.0, 1.0)),
        ];
        let expected: Vec<Route> = queries
            .iter()
            .map(|&(start, end)| network.route(start, end, Algorithm::Dijkstra))
            .collect();

        assert!((expected[0].length - 51.0).abs() < 1e-9);
        assert!((expected[1].length - 51.0).abs() < 1e-9);
        assert!((expected[2].length - 22.0).abs() < 1e-9);

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let network = &network;
                let expected = &expected;
                scope.spawn(move || {
                    for round in 0..50 {
                        let i = (worker + round) % queries.len();
                        let (start, end) = queries[i];
                        let algorithm = if round % 2 == 0 {
                            Algorithm::Dijkstra
                        } else {
                            Algorithm::AStar
                        };

                        let route = network.route(start, end, algorithm);
                        assert_eq!(route.points, expected[i].points);
                        assert!((route.length - expected[i].length).abs() < 1e-9);
                    }
                });
            }
        });

        assert_eq!(network.graph_snapshot(), before);
    }

    #[test]
    fn test_empty_network_falls_back() {
        let network = Network::build(vec![], &BuildOptions::default());
        let route = network.route(Point::new(1.0, 2.0), Point::new(3.0, 4.0), Algorithm::AStar);

        assert_eq!(route, Route::straight(Point::new(1.0, 2.0), Point::new(3.0, 4.0)));
    }

    #[test]
    fn test_graph_unchanged_by_queries() {
        let network = network(&[
            &[(0.0, 0.0), (40.0, 0.0), (40.0, 30.0)],
            &[(20.0, -10.0), (20.0, 50.0)],
            &[(0.0, 30.0), (44.0, 30.0)],
        ]);
        let before = network.graph_snapshot();

        for (start, end) in [
            ((0.0, 0.0), (40.0, 30.0)),
            ((20.0, 0.0), (20.0, 0.0)),
            ((-5.0, -5.0), (60.0, 60.0)),
            ((40.0, 0.0), (0.0, 30.0)),
        ] {
            for algorithm in [Algorithm::Dijkstra, Algorithm::AStar] {
                network.route(Point::from(start), Point::from(end), algorithm);
                assert_eq!(network.graph_snapshot(), before);
            }
        }
    }

    #[test]
    fn test_astar_matches_dijkstra_with_less_work() {
        let mut lines: Vec<Vec<(f64, f64)>> = vec![];
        for i in 0..8 {
            let c = i as f64 * 10.0;
            lines.push(vec![(0.0, c), (70.0, c)]);
            lines.push(vec![(c, 0.0), (c, 70.0)]);
        }
        let network = Network::build(
            lines.into_iter().map(|l| polyline(&l)).collect(),
            &BuildOptions::default().with_merge_radius(0.0),
        );

        let start = Point::new(1.0, 1.0);
        let end = Point::new(69.0, 3.0);
        let plain = network.route(start, end, Algorithm::Dijkstra);
        let guided = network.route(start, end, Algorithm::AStar);

        assert!((plain.length - guided.length).abs() < 1e-6);
        assert!(guided.search.unwrap().settled < plain.search.unwrap().settled);
    }

    #[test]
    fn test_route_is_deterministic() {
        let lines: &[&[(f64, f64)]] = &[
            &[(0.0, 0.0), (10.0, 10.0), (20.0, 0.0)],
            &[(0.0, 10.0), (20.0, 10.0)],
            &[(0.0, 0.0), (20.0, 0.0)],
        ];
        let first = network(lines).route(Point::new(0.0, 5.0), Point::new(20.0, 5.0), Algorithm::Dijkstra);
        for _ in 0..5 {
            let again = network(lines).route(Point::new(0.0, 5.0), Point::new(20.0, 5.0), Algorithm::Dijkstra);
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_algorithm_selection() {
        assert_eq!(Algorithm::parse(" AStar "), Some(Algorithm::AStar));
        assert_eq!(Algorithm::parse("DIJKSTRA"), Some(Algorithm::Dijkstra));
        assert_eq!(Algorithm::parse("bfs"), None);
        assert_eq!(Algorithm::select(None, Algorithm::AStar), Algorithm::AStar);
        assert_eq!(Algorithm::select(Some(""), Algorithm::Dijkstra), Algorithm::Dijkstra);
        assert_eq!(Algorithm::select(Some("astar"), Algorithm::Dijkstra), Algorithm::AStar);
    }
}
