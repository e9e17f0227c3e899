use log::{debug, info, warn};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::data::{Building, MapCoords, NodeIndex, OsmId, PolygonFilter, Tags};
use crate::errors::{Error, Result};

const BUILDING_KEYS: [&str; 2] = ["building", "building:part"];

/// Nodes and retained buildings of one OSM document.
#[derive(Debug, Default)]
pub struct OsmModel {
    pub nodes: NodeIndex,
    pub buildings: Vec<Building>,
}

struct PendingWay {
    id: OsmId,
    tags: Tags,
    node_refs: Vec<OsmId>,
}

impl PendingWay {
    fn is_building(&self) -> bool {
        BUILDING_KEYS.iter().any(|key| self.tags.contains_key(*key))
    }
}

enum ParserState {
    Top,
    Way(PendingWay),
}

/// Parses a whole OSM XML document and keeps the buildings whose centroid passes `filter`.
///
/// Only malformed XML is an error. Missing coordinates default to 0.0 and dangling
/// node references are dropped.
pub fn parse(document: &[u8], filter: Option<&PolygonFilter>) -> Result<Vec<Building>> {
    Ok(load(document, filter)?.buildings)
}

pub fn load(document: &[u8], filter: Option<&PolygonFilter>) -> Result<OsmModel> {
    let (nodes, ways) = read_elements(document)?;
    let way_count = ways.len();

    let buildings: Vec<Building> = ways
        .into_iter()
        .filter_map(|way| resolve_building(way, &nodes, filter))
        .collect();

    info!(
        nodes = nodes.len(),
        building_ways = way_count,
        buildings = buildings.len(),
        filtered = filter.is_some();
        "Parsed OSM document"
    );
    Ok(OsmModel { nodes, buildings })
}

/// Collects every node and every building-tagged way. Ways are resolved only after the
/// whole document is read, so a way may reference nodes that appear after it.
fn read_elements(document: &[u8]) -> Result<(NodeIndex, Vec<PendingWay>)> {
    let mut reader = Reader::from_reader(document);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut nodes = NodeIndex::new();
    let mut ways: Vec<PendingWay> = Vec::new();
    let mut state = ParserState::Top;
    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) => {
                depth += 1;
                seen_root = true;
                match e.name().as_ref() {
                    b"node" => parse_node(&e, &reader, &mut nodes)?,
                    b"way" => state = ParserState::Way(parse_way_start(&e, &reader)?),
                    _ => {
                        if let ParserState::Way(way) = &mut state {
                            parse_way_child(&e, &reader, way)?;
                        }
                    },
                }
            },
            Event::Empty(e) => {
                seen_root = true;
                match e.name().as_ref() {
                    b"node" => parse_node(&e, &reader, &mut nodes)?,
                    // A self-closing way has no tags, so it is never a building.
                    b"way" => (),
                    _ => {
                        if let ParserState::Way(way) = &mut state {
                            parse_way_child(&e, &reader, way)?;
                        }
                    },
                }
            },
            Event::End(e) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::document("Unexpected closing tag at top level"))?;
                if e.name().as_ref() == b"way" {
                    if let ParserState::Way(way) = std::mem::replace(&mut state, ParserState::Top) {
                        if way.is_building() {
                            ways.push(way);
                        }
                    }
                }
            },
            // Declarations, text, comments and the like carry nothing we need.
            _ => (),
        }
        buf.clear();
    }

    if depth > 0 {
        return Err(Error::document(format!(
            "Unexpected end of document: {} unclosed element(s)",
            depth
        )));
    }
    if !seen_root {
        return Err(Error::document("Document has no root element"));
    }
    Ok((nodes, ways))
}

/// Attribute value decoded with the document's declared encoding.
fn attribute_text(attribute: &Attribute, reader: &Reader<&[u8]>) -> Result<String> {
    Ok(attribute.decode_and_unescape_value(reader)?.into_owned())
}

fn parse_coordinate(value: &str) -> f64 {
    match value.trim().parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => parsed,
        _ => {
            debug!(value = value; "Unparseable coordinate, using 0.0");
            0.0
        },
    }
}

fn parse_node(el: &BytesStart, reader: &Reader<&[u8]>, nodes: &mut NodeIndex) -> Result<()> {
    let mut id: Option<OsmId> = None;
    let mut lat = 0.0;
    let mut lon = 0.0;

    for attribute_res in el.attributes() {
        let attribute = attribute_res?;
        match attribute.key.as_ref() {
            b"id" => id = Some(attribute_text(&attribute, reader)?),
            b"lat" => lat = parse_coordinate(&attribute_text(&attribute, reader)?),
            b"lon" => lon = parse_coordinate(&attribute_text(&attribute, reader)?),
            _ => (),
        }
    }

    match id {
        Some(id) => {
            nodes.insert(id, MapCoords { lat, lon });
        },
        None => warn!(lat = lat, lon = lon; "Skipping node without id"),
    }
    Ok(())
}

fn parse_way_start(el: &BytesStart, reader: &Reader<&[u8]>) -> Result<PendingWay> {
    let mut id = OsmId::new();
    for attribute_res in el.attributes() {
        let attribute = attribute_res?;
        if attribute.key.as_ref() == b"id" {
            id = attribute_text(&attribute, reader)?;
        }
    }
    Ok(PendingWay {
        id,
        tags: Tags::new(),
        node_refs: Vec::new(),
    })
}

fn parse_way_child(el: &BytesStart, reader: &Reader<&[u8]>, way: &mut PendingWay) -> Result<()> {
    match el.name().as_ref() {
        b"tag" => {
            let mut key: Option<String> = None;
            let mut value = String::new();
            for attribute_res in el.attributes() {
                let attribute = attribute_res?;
                match attribute.key.as_ref() {
                    b"k" => key = Some(attribute_text(&attribute, reader)?),
                    b"v" => value = attribute_text(&attribute, reader)?,
                    _ => (),
                }
            }
            if let Some(key) = key {
                way.tags.insert(key, value);
            }
        },
        b"nd" => {
            for attribute_res in el.attributes() {
                let attribute = attribute_res?;
                if attribute.key.as_ref() == b"ref" {
                    way.node_refs.push(attribute_text(&attribute, reader)?);
                }
            }
        },
        _ => (),
    }
    Ok(())
}

fn resolve_building(way: PendingWay, nodes: &NodeIndex, filter: Option<&PolygonFilter>) -> Option<Building> {
    let boundary: Vec<MapCoords> = way
        .node_refs
        .iter()
        .filter_map(|node_ref| nodes.get(node_ref).copied())
        .collect();

    let dangling = way.node_refs.len() - boundary.len();
    if dangling > 0 {
        debug!(way_id = way.id.as_str(), dangling = dangling; "Dropped dangling node references");
    }
    if boundary.len() < 3 {
        debug!(way_id = way.id.as_str(), resolved = boundary.len(); "Skipping building with fewer than 3 nodes");
        return None;
    }

    // Includes the closing duplicate when the way repeats its first node.
    let centroid = MapCoords::mean(&boundary)?;
    if let Some(filter) = filter {
        if !filter.contains(&centroid) {
            debug!(way_id = way.id.as_str(); "Building centroid outside polygon filter");
            return None;
        }
    }

    Some(Building {
        id: way.id,
        tags: way.tags,
        boundary,
        centroid,
    })
}
