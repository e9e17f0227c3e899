/// Planar position in meters relative to the conversion origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalCoords {
    pub x: f64,
    pub y: f64,
}

impl LocalCoords {
    pub fn at(&self, z: f64) -> Point3 {
        Point3 { x: self.x, y: self.y, z }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Watertight volume of one extruded footprint.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedShell {
    /// Footprint at z = 0 in the boundary's winding order.
    pub floor: Vec<Point3>,
    /// Footprint at z = height, reversed.
    pub ceiling: Vec<Point3>,
    /// One vertical quad per boundary edge.
    pub walls: Vec<[Point3; 4]>,
}

impl ClosedShell {
    /// Floor, ceiling, then walls: the order loops are written out in.
    pub fn poly_loops(&self) -> impl Iterator<Item = &[Point3]> {
        std::iter::once(self.floor.as_slice())
            .chain(std::iter::once(self.ceiling.as_slice()))
            .chain(self.walls.iter().map(|wall| wall.as_slice()))
    }
}
