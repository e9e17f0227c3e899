use log::debug;

use crate::data::{ClosedShell, LocalCoords, Tags};

pub const METERS_PER_LEVEL: f64 = 3.0;
/// Used when no tag gives a height, so the solid is never flat.
pub const DEFAULT_HEIGHT_M: f64 = 0.1;

/// Height of a building in meters: `height` first (a trailing "m" is allowed), then
/// `building:levels` times 3 m, then 0.1 m.
pub fn resolve_height(tags: &Tags) -> f64 {
    if let Some(height) = tags.get("height").and_then(|value| parse_height(value)) {
        return height;
    }
    if let Some(levels) = tags.get("building:levels").and_then(|value| value.trim().parse::<i64>().ok()) {
        return levels as f64 * METERS_PER_LEVEL;
    }
    debug!(height = tags.get("height").map(String::as_str).unwrap_or(""); "No usable height tag, using default");
    DEFAULT_HEIGHT_M
}

fn parse_height(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let number = trimmed.strip_suffix('m').unwrap_or(trimmed).trim();
    number.parse::<f64>().ok().filter(|height| height.is_finite())
}

/// Extrudes a footprint into floor, ceiling and wall loops.
///
/// A boundary whose last point repeats the first is treated as the same ring without
/// the repeat.
pub fn extrude(boundary: &[LocalCoords], height: f64) -> ClosedShell {
    let ring = match boundary {
        [first, .., last] if first == last => &boundary[..boundary.len() - 1],
        _ => boundary,
    };

    let floor = ring.iter().map(|p| p.at(0.0)).collect();
    let ceiling = ring.iter().rev().map(|p| p.at(height)).collect();
    let walls = ring
        .iter()
        .zip(ring.iter().cycle().skip(1))
        .map(|(a, b)| [a.at(0.0), b.at(0.0), b.at(height), a.at(height)])
        .collect();

    ClosedShell { floor, ceiling, walls }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Point3;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn square() -> Vec<LocalCoords> {
        vec![
            LocalCoords { x: 0.0, y: 0.0 },
            LocalCoords { x: 10.0, y: 0.0 },
            LocalCoords { x: 10.0, y: 10.0 },
            LocalCoords { x: 0.0, y: 10.0 },
        ]
    }

    #[test]
    fn height_tag_with_unit() {
        assert_eq!(resolve_height(&tags(&[("height", "12.5m")])), 12.5);
        assert_eq!(resolve_height(&tags(&[("height", " 7 m ")])), 7.0);
    }

    #[test]
    fn levels_when_no_height() {
        assert_eq!(resolve_height(&tags(&[("building:levels", "4")])), 12.0);
        assert_eq!(resolve_height(&tags(&[("height", "tall"), ("building:levels", "2")])), 6.0);
    }

    #[test]
    fn default_when_nothing_usable() {
        assert_eq!(resolve_height(&tags(&[])), 0.1);
        assert_eq!(resolve_height(&tags(&[("height", "12,5"), ("building:levels", "2.5")])), 0.1);
        assert_eq!(resolve_height(&tags(&[("height", "NaN")])), 0.1);
    }

    #[test]
    fn shell_has_one_wall_per_edge() {
        let shell = extrude(&square(), 5.0);
        assert_eq!(shell.floor.len(), 4);
        assert_eq!(shell.ceiling.len(), 4);
        assert_eq!(shell.walls.len(), 4);
        assert_eq!(shell.poly_loops().count(), 6);
    }

    #[test]
    fn ceiling_is_floor_reversed() {
        let shell = extrude(&square(), 5.0);
        let mut reversed: Vec<(f64, f64)> = shell.floor.iter().map(|p| (p.x, p.y)).collect();
        reversed.reverse();
        let ceiling: Vec<(f64, f64)> = shell.ceiling.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(ceiling, reversed);
        assert!(shell.floor.iter().all(|p| p.z == 0.0));
        assert!(shell.ceiling.iter().all(|p| p.z == 5.0));
    }

    #[test]
    fn last_wall_wraps_to_first_point() {
        let shell = extrude(&square(), 3.0);
        assert_eq!(
            shell.walls[3],
            [
                Point3 { x: 0.0, y: 10.0, z: 0.0 },
                Point3 { x: 0.0, y: 0.0, z: 0.0 },
                Point3 { x: 0.0, y: 0.0, z: 3.0 },
                Point3 { x: 0.0, y: 10.0, z: 3.0 },
            ]
        );
    }

    #[test]
    fn closed_ring_matches_open_ring() {
        let open = square();
        let mut closed = open.clone();
        closed.push(open[0]);
        assert_eq!(extrude(&closed, 4.0), extrude(&open, 4.0));
    }
}
