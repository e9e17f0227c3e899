use log::{debug, info};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::data::{Building, ClosedShell, MapCoords, Point3};
use crate::errors::{Error, Result};
use crate::extrude::{extrude, resolve_height};
use crate::geometry::project;

pub const GBXML_NAMESPACE: &str = "http://www.gbxml.org/schema";
pub const GBXML_VERSION: &str = "0.37";
pub const DEFAULT_COORDINATE_DECIMALS: usize = 6;

const LOCATION_DECIMALS: usize = 6;
const STOREY_ID: &str = "storey-1";

#[derive(Debug, Clone, PartialEq)]
pub struct GbXmlOptions {
    /// Replaces the mean of the building centroids as the local origin.
    pub origin: Option<MapCoords>,
    /// Applied to every emitted coordinate.
    pub coordinate_decimals: usize,
}

impl Default for GbXmlOptions {
    fn default() -> Self {
        GbXmlOptions {
            origin: None,
            coordinate_decimals: DEFAULT_COORDINATE_DECIMALS,
        }
    }
}

/// Result of one document build. `xml` is `None` exactly when there were no buildings.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub xml: Option<String>,
    pub space_count: usize,
}

impl Conversion {
    pub fn empty() -> Self {
        Conversion {
            xml: None,
            space_count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.xml.is_none()
    }
}

/// Fixed-point rendering with a `.` decimal separator.
pub fn format_decimal(value: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, value)
}

struct GbXmlWriter {
    writer: Writer<Vec<u8>>,
    decimals: usize,
}

impl GbXmlWriter {
    fn new(decimals: usize) -> Self {
        GbXmlWriter {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
            decimals,
        }
    }

    fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let element = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.writer.write_event(Event::Start(element))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<()> {
        self.start(name, &[])?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn cartesian_point(&mut self, point: &Point3) -> Result<()> {
        self.start("CartesianPoint", &[])?;
        for coordinate in [point.x, point.y, point.z] {
            self.text_element("Coordinate", &format_decimal(coordinate, self.decimals))?;
        }
        self.end("CartesianPoint")
    }

    fn closed_shell(&mut self, shell: &ClosedShell) -> Result<()> {
        self.start("ClosedShell", &[])?;
        for poly_loop in shell.poly_loops() {
            self.start("PolyLoop", &[])?;
            for point in poly_loop {
                self.cartesian_point(point)?;
            }
            self.end("PolyLoop")?;
        }
        self.end("ClosedShell")
    }

    fn space(&mut self, index: usize, building: &Building, origin: &MapCoords) -> Result<()> {
        let space_id = format!("space-{}", building.id);
        let shell_id = format!("shell-{}", building.id);
        let name = building
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Space {}", index + 1));

        let footprint: Vec<_> = building.boundary.iter().map(|node| project(node, origin)).collect();
        let height = resolve_height(&building.tags);
        debug!(way_id = building.id.as_str(), height = height, points = footprint.len(); "Extruding building");
        let shell = extrude(&footprint, height);

        self.start(
            "Space",
            &[
                ("id", space_id.as_str()),
                ("conditionType", "HeatedAndCooled"),
                ("buildingStoreyIdRef", STOREY_ID),
            ],
        )?;
        self.text_element("Name", &name)?;
        self.start("ShellGeometry", &[("id", shell_id.as_str()), ("unit", "Meters")])?;
        self.closed_shell(&shell)?;
        self.end("ShellGeometry")?;
        self.end("Space")
    }

    fn finish(self) -> Result<String> {
        String::from_utf8(self.writer.into_inner())
            .map_err(|err| Error::from(err.to_string()))
    }
}

/// Serializes the buildings as one gbXML campus: one building, one ground storey and a
/// space per input building, in input order.
pub fn build(buildings: &[Building], options: &GbXmlOptions) -> Result<Conversion> {
    if buildings.is_empty() {
        info!("No buildings to write");
        return Ok(Conversion::empty());
    }
    let origin = match options.origin {
        Some(origin) => origin,
        None => MapCoords::mean(buildings.iter().map(|b| &b.centroid))
            .ok_or("No building centroids to derive an origin from")?,
    };

    let mut out = GbXmlWriter::new(options.coordinate_decimals);
    out.writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    out.start(
        "gbXML",
        &[
            ("xmlns", GBXML_NAMESPACE),
            ("useSIUnitsForResults", "true"),
            ("temperatureUnit", "C"),
            ("lengthUnit", "Meters"),
            ("areaUnit", "SquareMeters"),
            ("volumeUnit", "CubicMeters"),
            ("version", GBXML_VERSION),
        ],
    )?;
    out.start("Campus", &[("id", "campus")])?;
    out.start("Location", &[])?;
    out.text_element("Longitude", &format_decimal(origin.lon, LOCATION_DECIMALS))?;
    out.text_element("Latitude", &format_decimal(origin.lat, LOCATION_DECIMALS))?;
    out.end("Location")?;

    out.start("Building", &[("id", "building"), ("buildingType", "Mixed")])?;
    out.text_element("Name", "Combined Building")?;
    out.start("BuildingStorey", &[("id", STOREY_ID)])?;
    out.text_element("Name", "Ground Floor")?;
    out.text_element("Level", &format_decimal(0.0, DEFAULT_COORDINATE_DECIMALS))?;
    out.end("BuildingStorey")?;

    let mut space_count = 0;
    for (index, building) in buildings.iter().enumerate() {
        out.space(index, building, &origin)?;
        space_count += 1;
    }

    out.end("Building")?;
    out.end("Campus")?;
    out.end("gbXML")?;

    info!(spaces = space_count, origin_lat = origin.lat, origin_lon = origin.lon; "Built gbXML document");
    Ok(Conversion {
        xml: Some(out.finish()?),
        space_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Tags;

    fn building(id: &str, tags: &[(&str, &str)], boundary: Vec<MapCoords>) -> Building {
        let centroid = MapCoords::mean(&boundary).unwrap();
        Building {
            id: id.to_string(),
            tags: tags.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<Tags>(),
            boundary,
            centroid,
        }
    }

    fn triangle(id: &str, tags: &[(&str, &str)]) -> Building {
        building(
            id,
            tags,
            vec![
                MapCoords::new(52.5, 13.4),
                MapCoords::new(52.5, 13.401),
                MapCoords::new(52.501, 13.4),
            ],
        )
    }

    #[test]
    fn empty_input_has_no_output() {
        let conversion = build(&[], &GbXmlOptions::default()).unwrap();
        assert!(conversion.is_empty());
        assert_eq!(conversion.space_count, 0);
    }

    #[test]
    fn decimal_formatting_is_fixed() {
        assert_eq!(format_decimal(52.5, 6), "52.500000");
        assert_eq!(format_decimal(-0.1234567, 3), "-0.123");
        assert_eq!(format_decimal(1234.0, 0), "1234");
    }

    #[test]
    fn document_structure() {
        let buildings = [
            triangle("10", &[("building", "yes"), ("name", "Town Hall")]),
            triangle("11", &[("building", "yes"), ("height", "6")]),
        ];
        let conversion = build(&buildings, &GbXmlOptions::default()).unwrap();
        let xml = conversion.xml.unwrap();

        assert_eq!(conversion.space_count, 2);
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("xmlns=\"http://www.gbxml.org/schema\""));
        assert!(xml.contains("version=\"0.37\""));
        assert_eq!(xml.matches("<BuildingStorey ").count(), 1);
        assert!(xml.contains("<Level>0.000000</Level>"));
        assert!(xml.contains("<Space id=\"space-10\""));
        assert!(xml.contains("<ShellGeometry id=\"shell-11\" unit=\"Meters\">"));
        assert!(xml.contains("<Name>Town Hall</Name>"));
        assert!(xml.contains("<Name>Space 2</Name>"));
        assert_eq!(xml.matches("buildingStoreyIdRef=\"storey-1\"").count(), 2);
        // floor + ceiling + 3 walls per triangle
        assert_eq!(xml.matches("<PolyLoop>").count(), 10);
        assert!(xml.contains("<Latitude>52.500333</Latitude>"));
        assert!(xml.contains("<Longitude>13.400333</Longitude>"));
        assert!(xml.contains("<Coordinate>6.000000</Coordinate>"));
    }

    #[test]
    fn precision_applies_to_every_coordinate() {
        let buildings = [triangle("1", &[("building", "yes")])];
        let options = GbXmlOptions {
            coordinate_decimals: 3,
            ..GbXmlOptions::default()
        };
        let xml = build(&buildings, &options).unwrap().xml.unwrap();
        for coordinate in xml.split("<Coordinate>").skip(1) {
            let value = &coordinate[..coordinate.find('<').unwrap()];
            let decimals = value.split('.').nth(1).unwrap();
            assert_eq!(decimals.len(), 3, "{}", value);
        }
        assert!(xml.contains("<Coordinate>0.100</Coordinate>"));
    }

    #[test]
    fn origin_override_moves_location() {
        let buildings = [triangle("1", &[("building", "yes")])];
        let options = GbXmlOptions {
            origin: Some(MapCoords::new(52.5, 13.4)),
            ..GbXmlOptions::default()
        };
        let xml = build(&buildings, &options).unwrap().xml.unwrap();
        assert!(xml.contains("<Latitude>52.500000</Latitude>"));
        assert!(xml.contains("<Longitude>13.400000</Longitude>"));
    }

    #[test]
    fn names_are_escaped() {
        let buildings = [triangle("1", &[("building", "yes"), ("name", "Fish & Chips <Ltd>")])];
        let xml = build(&buildings, &GbXmlOptions::default()).unwrap().xml.unwrap();
        assert!(xml.contains("<Name>Fish &amp; Chips &lt;Ltd&gt;</Name>"));
    }
}
