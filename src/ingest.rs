//! Conversion of stored segment records into polylines.
//!
//! A record holds the JSON geometry of one drawn path, e.g.
//! `[{"x": 12.0, "y": 40.5}, {"x": 80.0, "y": 40.5}]`.

use tracing::warn;

use crate::{Point, Polyline, Result};

pub fn polyline_from_json(geometry: &str) -> Result<Polyline> {
    let points: Vec<Point> = serde_json::from_str(geometry)?;
    Polyline::new(points)
}

/// Parses every record, skipping the ones that are not a usable polyline.
pub fn polylines_from_records<'a>(records: impl IntoIterator<Item = &'a str>) -> Vec<Polyline> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, geometry)| match polyline_from_json(geometry) {
            Ok(polyline) => Some(polyline),
            Err(error) => {
                warn!(index, %error, "skipping segment record");
                None
            }
        })
        .collect()
}
