mod config;
mod error;
pub mod geometry;
mod graph;
pub mod ingest;
mod plan;
mod router;
mod service;

pub use config::RouterConfig;
pub use error::{Result, RouteError};
pub use graph::{BuildOptions, Graph, NodeKey, QuantizedPoint, Terminal, MAX_PRECISION};
pub use plan::{greedy_order, RoutePlan, Stop};
pub use router::{Algorithm, Network, Route, SearchStats};
pub use service::{ItemDirectory, ItemId, RoutingService};

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Both coordinates within [`geometry::EPS_COORD`] of `other`.
    pub fn approx_eq(&self, other: &Point) -> bool {
        (self.x - other.x).abs() <= geometry::EPS_COORD
            && (self.y - other.y).abs() <= geometry::EPS_COORD
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// One drawn walkable path: at least two finite points.
#[derive(Clone, Debug, PartialEq)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    pub fn new(points: Vec<Point>) -> Result<Self> {
        if points.len() < 2 {
            return Err(RouteError::TooFewPoints(points.len()));
        }

        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(RouteError::NonFinitePoint(index));
        }

        Ok(Self(points))
    }

    pub fn points(&self) -> &[Point] {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.0.windows(2).map(|w| (w[0], w[1]))
    }

    pub fn length(&self) -> f64 {
        path_length(&self.0)
    }
}

impl TryFrom<Vec<(f64, f64)>> for Polyline {
    type Error = RouteError;

    fn try_from(points: Vec<(f64, f64)>) -> Result<Self> {
        Self::new(points.into_iter().map(Point::from).collect())
    }
}

/// Sum of consecutive Euclidean distances along `points`.
pub fn path_length(points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|w| geometry::distance(w[0], w[1]))
        .sum()
}
