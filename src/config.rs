use std::fs::{create_dir_all, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::data::{MapCoords, PolygonFilter};
use crate::errors::Result;
use crate::gbxml::{GbXmlOptions, DEFAULT_COORDINATE_DECIMALS};
use crate::overpass::BoundingBox;

#[derive(Deserialize, Debug)]
pub struct UserConfig {
    /// OSM XML file, optionally xz-compressed (`.xz`).
    pub data_path: String,
    pub dest_path: String,
    pub polygon: Option<Vec<MapCoords>>,
    pub bounding_box: Option<BoundingBox>,
    pub origin: Option<MapCoords>,
    #[serde(default = "default_coordinate_decimals")]
    pub coordinate_decimals: usize,
    #[serde(default)]
    pub use_cache: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_coordinate_decimals() -> usize {
    DEFAULT_COORDINATE_DECIMALS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl UserConfig {
    /// The drawn polygon, if any. The bounding box only scopes the Overpass query, so
    /// buildings straddling its edge are kept.
    pub fn polygon_filter(&self) -> Result<Option<PolygonFilter>> {
        match &self.polygon {
            Some(vertices) => Ok(Some(PolygonFilter::new(vertices.clone())?)),
            None => Ok(None),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(bbox) = &self.bounding_box {
            bbox.validate()?;
        }
        self.polygon_filter()?;
        Ok(())
    }

    pub fn gbxml_options(&self) -> GbXmlOptions {
        GbXmlOptions {
            origin: self.origin,
            coordinate_decimals: self.coordinate_decimals,
        }
    }
}

pub fn load_user_config(path: &Path) -> Result<UserConfig> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// `<dest_path>/<input file name>/`, created if missing.
pub fn create_output_dir(config: &UserConfig) -> Result<PathBuf> {
    let input_fname = Path::new(&config.data_path)
        .file_name()
        .ok_or("Could not get input file name")?;
    let output_dir = Path::new(&config.dest_path).join(input_fname);
    create_dir_all(&output_dir)?;
    Ok(output_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn defaults_apply() {
        let config: UserConfig = serde_json::from_str(
            r#"{"data_path": "data/berlin.osm", "dest_path": "output"}"#,
        ).unwrap();
        assert_eq!(config.coordinate_decimals, 6);
        assert!(!config.use_cache);
        assert_eq!(config.log_level, "info");
        assert!(config.polygon_filter().unwrap().is_none());
        assert_eq!(config.gbxml_options(), GbXmlOptions::default());
    }

    #[test]
    fn polygon_takes_precedence_over_bounding_box() {
        let config: UserConfig = serde_json::from_str(
            r#"{
                "data_path": "berlin.osm",
                "dest_path": "output",
                "polygon": [{"lat": 0.0, "lon": 0.0}, {"lat": 0.0, "lon": 1.0}, {"lat": 1.0, "lon": 0.0}],
                "bounding_box": {"south": 0.0, "west": 0.0, "north": 2.0, "east": 2.0}
            }"#,
        ).unwrap();
        let filter = config.polygon_filter().unwrap().unwrap();
        assert_eq!(filter.vertices().len(), 3);
    }

    #[test]
    fn bounding_box_alone_does_not_filter() {
        let config: UserConfig = serde_json::from_str(
            r#"{
                "data_path": "berlin.osm",
                "dest_path": "output",
                "bounding_box": {"south": 52.5, "west": 13.4, "north": 52.52, "east": 13.42}
            }"#,
        ).unwrap();
        let filter = config.polygon_filter().unwrap();
        assert!(filter.is_none());

        // Centroid lon 13.42067 lies east of the box.
        let doc = r#"<osm>
  <node id="1" lat="52.51" lon="13.419"/>
  <node id="2" lat="52.51" lon="13.4215"/>
  <node id="3" lat="52.511" lon="13.4215"/>
  <way id="9"><nd ref="1"/><nd ref="2"/><nd ref="3"/><tag k="building" v="yes"/></way>
</osm>"#;
        let buildings = crate::osm_model::parse(doc.as_bytes(), filter.as_ref()).unwrap();
        assert_eq!(buildings.len(), 1);
    }

    #[test]
    fn invalid_bounding_box_is_rejected() {
        let config: UserConfig = serde_json::from_str(
            r#"{
                "data_path": "berlin.osm",
                "dest_path": "output",
                "bounding_box": {"south": 2.0, "west": 0.0, "north": 1.0, "east": 2.0}
            }"#,
        ).unwrap();
        assert_eq!(config.validate().unwrap_err().kind, ErrorKind::InvalidInput);
    }
}
