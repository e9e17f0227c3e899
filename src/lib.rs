pub mod config;
pub mod data;
pub mod errors;
pub mod etl;
pub mod extrude;
pub mod gbxml;
pub mod geometry;
pub mod osm_model;
pub mod overpass;

use crate::data::PolygonFilter;
use crate::errors::Result;
use crate::gbxml::{Conversion, GbXmlOptions};

/// OSM document to gbXML in one call. Each call starts from scratch.
pub fn convert(document: &[u8], filter: Option<&PolygonFilter>, options: &GbXmlOptions) -> Result<Conversion> {
    let buildings = osm_model::parse(document, filter)?;
    gbxml::build(&buildings, options)
}
