pub mod osm;
pub mod shell;

pub use self::osm::{Building, MapCoords, NodeIndex, OsmId, PolygonFilter, Tags};
pub use self::shell::{ClosedShell, LocalCoords, Point3};
