use serde::{Deserialize, Serialize};

use crate::{Algorithm, BuildOptions, Result, RouteError, MAX_PRECISION};

/// Router settings, usually loaded from a `[routing]`-style TOML table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Decimal digits kept in node identities
    pub precision: u32,

    /// Bridge radius for graphs built for multi-stop plans
    pub build_merge_radius: f64,

    /// Bridge radius for graphs built for point-to-point queries
    pub query_merge_radius: f64,

    pub coordinate_algorithm: Algorithm,

    pub item_algorithm: Algorithm,

    pub plan_algorithm: Algorithm,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            precision: 4,
            build_merge_radius: 6.0,
            query_merge_radius: 20.0,
            coordinate_algorithm: Algorithm::AStar,
            item_algorithm: Algorithm::Dijkstra,
            plan_algorithm: Algorithm::Dijkstra,
        }
    }
}

impl RouterConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.precision > MAX_PRECISION {
            return Err(RouteError::Precision(self.precision));
        }
        Ok(())
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            precision: self.precision,
            merge_radius: self.build_merge_radius,
        }
    }

    pub fn query_options(&self) -> BuildOptions {
        BuildOptions {
            precision: self.precision,
            merge_radius: self.query_merge_radius,
        }
    }
}
