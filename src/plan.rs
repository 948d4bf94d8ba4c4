use tracing::debug;

use crate::geometry::distance;
use crate::router::shortest_path;
use crate::{Algorithm, Network, Point};

/// A target to visit, tagged with the caller's identifier.
#[derive(Clone, Debug, PartialEq)]
pub struct Stop<Id> {
    pub id: Id,
    pub point: Point,
}

impl<Id> Stop<Id> {
    pub fn new(id: Id, point: Point) -> Self {
        Self { id, point }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoutePlan<Id> {
    /// Stop identifiers in visiting order.
    pub order: Vec<Id>,
    pub polyline: Vec<Point>,
}

impl<Id> Default for RoutePlan<Id> {
    fn default() -> Self {
        Self {
            order: vec![],
            polyline: vec![],
        }
    }
}

/// Greedy nearest-neighbour visiting order from `start`.
///
/// Repeatedly takes the closest remaining stop by straight-line distance; the
/// earlier stop wins ties. This is a heuristic and does not minimise the tour.
pub fn greedy_order<Id>(stops: &[Stop<Id>], start: Point) -> Vec<usize> {
    let mut remaining: Vec<usize> = (0..stops.len()).collect();
    let mut order = Vec::with_capacity(stops.len());
    let mut current = start;

    while !remaining.is_empty() {
        let mut nearest = 0;
        for (slot, &stop) in remaining.iter().enumerate().skip(1) {
            if distance(current, stops[stop].point)
                < distance(current, stops[remaining[nearest]].point)
            {
                nearest = slot;
            }
        }

        let stop = remaining.remove(nearest);
        current = stops[stop].point;
        order.push(stop);
    }

    order
}

impl Network {
    /// Visits every stop in greedy nearest-neighbour order and stitches the
    /// legs into one polyline.
    ///
    /// Without `start` the first stop is the starting position: it is visited
    /// first and contributes its point without a routed leg.
    pub fn plan<Id: Clone>(
        &self,
        stops: &[Stop<Id>],
        start: Option<Point>,
        algorithm: Algorithm,
    ) -> RoutePlan<Id> {
        let Some(first) = stops.first() else {
            return RoutePlan::default();
        };

        let order = greedy_order(stops, start.unwrap_or(first.point));
        let mut polyline: Vec<Point> = vec![];
        let mut current = start;

        // One lock for all legs so the plan sees a single graph state.
        let mut graph = self.lock();

        for &index in &order {
            let goal = stops[index].point;

            let leg = match current {
                Some(from) if !self.is_empty() => {
                    shortest_path(&mut graph, self.polylines(), from, goal, algorithm).points
                }
                Some(from) => vec![from, goal],
                None => vec![goal],
            };

            for point in leg {
                if polyline.last().map_or(true, |last| !last.approx_eq(&point)) {
                    polyline.push(point);
                }
            }

            current = Some(goal);
        }

        debug!(
            stops = stops.len(),
            points = polyline.len(),
            ?algorithm,
            "planned multi-stop route"
        );

        RoutePlan {
            order: order.into_iter().map(|i| stops[i].id.clone()).collect(),
            polyline,
        }
    }
}
