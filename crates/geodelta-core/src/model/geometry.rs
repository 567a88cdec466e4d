//! Integer geometry primitives.
//!
//! Coordinates are stored in degrees × 10⁷ so that equality is exact and
//! locations can be hashed and ordered.

use serde::{Deserialize, Serialize};
use std::fmt;

const DM7_PER_DEGREE: f64 = 10_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees × 10⁷
    pub latitude: i64,
    /// Longitude in degrees × 10⁷
    pub longitude: i64,
}

impl Location {
    pub fn new(latitude: i64, longitude: i64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn from_degrees(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: (latitude * DM7_PER_DEGREE).round() as i64,
            longitude: (longitude * DM7_PER_DEGREE).round() as i64,
        }
    }

    pub fn latitude_degrees(&self) -> f64 {
        self.latitude as f64 / DM7_PER_DEGREE
    }

    pub fn longitude_degrees(&self) -> f64 {
        self.longitude as f64 / DM7_PER_DEGREE
    }

    pub fn bounds(&self) -> Rectangle {
        Rectangle {
            lower: *self,
            upper: *self,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.7},{:.7})",
            self.latitude_degrees(),
            self.longitude_degrees()
        )
    }
}

/// Ordered sequence of locations
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolyLine(Vec<Location>);

impl PolyLine {
    pub fn new(locations: Vec<Location>) -> Self {
        Self(locations)
    }

    pub fn locations(&self) -> &[Location] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<Location> {
        self.0.first().copied()
    }

    pub fn last(&self) -> Option<Location> {
        self.0.last().copied()
    }

    /// Consecutive (from, to) vertex pairs
    pub fn segments(&self) -> impl Iterator<Item = (Location, Location)> + '_ {
        self.0.windows(2).map(|w| (w[0], w[1]))
    }

    pub fn reversed(&self) -> PolyLine {
        PolyLine(self.0.iter().rev().copied().collect())
    }

    pub fn bounds(&self) -> Option<Rectangle> {
        Rectangle::from_locations(&self.0)
    }
}

impl From<Vec<Location>> for PolyLine {
    fn from(locations: Vec<Location>) -> Self {
        Self(locations)
    }
}

/// Outer ring of an area. The closing vertex is implicit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon(Vec<Location>);

impl Polygon {
    pub fn new(ring: Vec<Location>) -> Self {
        Self(ring)
    }

    pub fn ring(&self) -> &[Location] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ring with the first vertex repeated at the end
    pub fn closed_ring(&self) -> Vec<Location> {
        let mut ring = self.0.clone();
        if let (Some(first), Some(last)) = (self.0.first(), self.0.last()) {
            if first != last {
                ring.push(*first);
            }
        }
        ring
    }

    pub fn bounds(&self) -> Option<Rectangle> {
        Rectangle::from_locations(&self.0)
    }
}

/// Axis-aligned bounding box, inclusive on all sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rectangle {
    pub lower: Location,
    pub upper: Location,
}

impl Rectangle {
    pub fn from_locations(locations: &[Location]) -> Option<Self> {
        let first = locations.first()?;
        let mut bounds = first.bounds();
        for location in &locations[1..] {
            bounds = bounds.expand(*location);
        }
        Some(bounds)
    }

    pub fn expand(self, location: Location) -> Self {
        Self {
            lower: Location::new(
                self.lower.latitude.min(location.latitude),
                self.lower.longitude.min(location.longitude),
            ),
            upper: Location::new(
                self.upper.latitude.max(location.latitude),
                self.upper.longitude.max(location.longitude),
            ),
        }
    }

    pub fn intersects(&self, other: &Rectangle) -> bool {
        self.lower.latitude <= other.upper.latitude
            && other.lower.latitude <= self.upper.latitude
            && self.lower.longitude <= other.upper.longitude
            && other.lower.longitude <= self.upper.longitude
    }

    pub fn contains(&self, location: Location) -> bool {
        self.intersects(&location.bounds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degrees_round_trip_to_dm7() {
        let loc = Location::from_degrees(37.3349, -122.009);
        assert_eq!(loc.latitude, 373_349_000);
        assert_eq!(loc.longitude, -1_220_090_000);
    }

    #[test]
    fn test_touching_rectangles_intersect() {
        let a = Rectangle::from_locations(&[Location::new(0, 0), Location::new(10, 10)]).unwrap();
        let b = Rectangle::from_locations(&[Location::new(10, 10), Location::new(20, 20)]).unwrap();
        let c = Rectangle::from_locations(&[Location::new(11, 11), Location::new(20, 20)]).unwrap();
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_polygon_closed_ring_appends_first_vertex() {
        let polygon = Polygon::new(vec![
            Location::new(0, 0),
            Location::new(0, 1),
            Location::new(1, 1),
        ]);
        let ring = polygon.closed_ring();
        assert_eq!(ring.len(), 4);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn test_segments_of_three_point_polyline() {
        let line = PolyLine::new(vec![
            Location::new(0, 0),
            Location::new(0, 1),
            Location::new(0, 2),
        ]);
        assert_eq!(line.segments().count(), 2);
        assert!(PolyLine::new(vec![Location::new(0, 0)]).segments().next().is_none());
    }
}
