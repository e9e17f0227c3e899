use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::geometry;

pub type OsmId = String;

/// Tags of one way. Duplicate keys keep the last value seen.
pub type Tags = HashMap<String, String>;

/// Every node of one document, looked up by id while ways are resolved.
pub type NodeIndex = HashMap<OsmId, MapCoords>;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct MapCoords {
    pub lat: f64,
    pub lon: f64,
}

impl MapCoords {
    pub fn new(lat: f64, lon: f64) -> Self {
        MapCoords { lat, lon }
    }

    /// Arithmetic mean of the points. Not an area centroid.
    pub fn mean<'a>(points: impl IntoIterator<Item = &'a MapCoords>) -> Option<MapCoords> {
        let mut count = 0usize;
        let mut lat = 0.0;
        let mut lon = 0.0;
        for point in points {
            count += 1;
            lat += point.lat;
            lon += point.lon;
        }
        if count == 0 {
            return None;
        }
        Some(MapCoords {
            lat: lat / count as f64,
            lon: lon / count as f64,
        })
    }
}

/// A way tagged `building` or `building:part` whose boundary resolved to at least
/// three nodes. The boundary keeps the way's node order and is not closed explicitly.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Building {
    pub id: OsmId,
    pub tags: Tags,
    pub boundary: Vec<MapCoords>,
    pub centroid: MapCoords,
}

impl Building {
    pub fn name(&self) -> Option<&str> {
        self.tags.get("name").map(String::as_str)
    }
}

/// Polygon drawn by the user. Buildings are kept only when their centroid lies inside.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonFilter {
    vertices: Vec<MapCoords>,
}

impl PolygonFilter {
    pub fn new(vertices: Vec<MapCoords>) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(Error::invalid_input(format!(
                "A polygon filter needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        Ok(PolygonFilter { vertices })
    }

    pub fn vertices(&self) -> &[MapCoords] {
        &self.vertices
    }

    pub fn contains(&self, point: &MapCoords) -> bool {
        geometry::ray_cast(point, &self.vertices)
    }
}
