use thiserror::Error;

use crate::ItemId;

#[derive(Error, Debug)]
pub enum RouteError {
    #[error("polyline needs at least 2 points, got {0}")]
    TooFewPoints(usize),

    #[error("polyline point {0} has a non-finite coordinate")]
    NonFinitePoint(usize),

    #[error("malformed segment geometry: {0}")]
    MalformedSegment(#[from] serde_json::Error),

    #[error("item {0} not found")]
    UnknownItem(ItemId),

    #[error("precision {0} is out of range, at most {max} digits are supported", max = crate::MAX_PRECISION)]
    Precision(u32),

    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, RouteError>;
