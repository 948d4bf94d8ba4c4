use std::collections::HashMap;
use std::hash::BuildHasher;

use tracing::debug;

use crate::{
    Algorithm, BuildOptions, Network, Point, Polyline, Result, Route, RouteError, RoutePlan,
    RouterConfig, Stop,
};

pub type ItemId = i64;

/// Resolves map items to their coordinates.
pub trait ItemDirectory {
    fn locate(&self, id: ItemId) -> Option<Point>;
}

impl<S: BuildHasher> ItemDirectory for HashMap<ItemId, Point, S> {
    fn locate(&self, id: ItemId) -> Option<Point> {
        self.get(&id).copied()
    }
}

/// Routing entry points over the current segment snapshot.
///
/// Every call builds its own [`Network`], so concurrent calls never share
/// query state.
pub struct RoutingService<D> {
    polylines: Vec<Polyline>,
    items: D,
    config: RouterConfig,
}

impl<D: ItemDirectory> RoutingService<D> {
    pub fn new(polylines: Vec<Polyline>, items: D, config: RouterConfig) -> Self {
        Self {
            polylines,
            items,
            config,
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Replaces the segment snapshot used by later queries.
    pub fn set_polylines(&mut self, polylines: Vec<Polyline>) {
        self.polylines = polylines;
    }

    fn network(&self, options: &BuildOptions) -> Network {
        Network::build(self.polylines.clone(), options)
    }

    /// Point-to-point route; A* unless `algorithm` names another.
    pub fn route_coords(&self, start: Point, end: Point, algorithm: Option<&str>) -> Route {
        let algorithm = Algorithm::select(algorithm, self.config.coordinate_algorithm);
        self.network(&self.config.query_options())
            .route(start, end, algorithm)
    }

    /// Route between two items; Dijkstra unless `algorithm` names another.
    pub fn route_items(&self, from: ItemId, to: ItemId, algorithm: Option<&str>) -> Result<Route> {
        let start = self.items.locate(from).ok_or(RouteError::UnknownItem(from))?;
        let end = self.items.locate(to).ok_or(RouteError::UnknownItem(to))?;

        let algorithm = Algorithm::select(algorithm, self.config.item_algorithm);
        Ok(self
            .network(&self.config.query_options())
            .route(start, end, algorithm))
    }

    /// Multi-stop plan over the given items. Unknown ids are left out.
    pub fn plan_items(
        &self,
        ids: &[ItemId],
        start: Option<Point>,
        algorithm: Option<&str>,
    ) -> RoutePlan<ItemId> {
        let stops: Vec<_> = ids
            .iter()
            .filter_map(|&id| self.items.locate(id).map(|point| Stop::new(id, point)))
            .collect();

        if stops.len() < ids.len() {
            debug!(
                requested = ids.len(),
                resolved = stops.len(),
                "dropped unknown items from plan"
            );
        }

        let algorithm = Algorithm::select(algorithm, self.config.plan_algorithm);
        self.network(&self.config.build_options())
            .plan(&stops, start, algorithm)
    }
}
