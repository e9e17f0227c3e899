use serde::Deserialize;

use crate::errors::{Error, Result};

/// Query timeout asked of the Overpass server, in seconds.
pub const QUERY_TIMEOUT_S: u32 = 90;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    pub fn validate(&self) -> Result<()> {
        if self.south >= self.north {
            return Err(Error::invalid_input("Southern latitude must be less than northern latitude."));
        }
        if self.west >= self.east {
            return Err(Error::invalid_input("Western longitude must be less than eastern longitude."));
        }
        let valid_lat = |lat: f64| (-90.0..=90.0).contains(&lat);
        if !valid_lat(self.south) || !valid_lat(self.north) {
            return Err(Error::invalid_input("Latitude must be between -90 and 90 degrees."));
        }
        let valid_lon = |lon: f64| (-180.0..=180.0).contains(&lon);
        if !valid_lon(self.west) || !valid_lon(self.east) {
            return Err(Error::invalid_input("Longitude must be between -180 and 180 degrees."));
        }
        Ok(())
    }

    /// Overpass QL for every `building` and `building:part` way in the box, with the nodes
    /// they reference.
    pub fn overpass_query(&self) -> Result<String> {
        self.validate()?;
        let bbox = format!("{},{},{},{}", self.south, self.west, self.north, self.east);
        Ok(format!(
            "[out:xml][timeout:{timeout}];\n(\n  way[\"building\"]({bbox});\n  way[\"building:part\"]({bbox});\n);\n(._;>;);\nout meta;\n",
            timeout = QUERY_TIMEOUT_S,
            bbox = bbox,
        ))
    }
}
