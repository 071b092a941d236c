use geo::Coord;
use serde::Serialize;

/// A location to visit. The client at index 0 of a problem is the depot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Client {
    coordinates: Coord<f64>,
    demand: f64,
    service_duration: f64,
}

impl Client {
    pub fn new(coordinates: Coord<f64>, demand: f64, service_duration: f64) -> Self {
        Client {
            coordinates,
            demand,
            service_duration,
        }
    }

    pub fn depot(coordinates: Coord<f64>) -> Self {
        Client::new(coordinates, 0.0, 0.0)
    }

    pub fn from_cartesian(x: f64, y: f64, demand: f64) -> Self {
        Client::new(Coord { x, y }, demand, 0.0)
    }

    #[inline(always)]
    pub fn coordinates(&self) -> Coord<f64> {
        self.coordinates
    }

    #[inline(always)]
    pub fn x(&self) -> f64 {
        self.coordinates.x
    }

    #[inline(always)]
    pub fn y(&self) -> f64 {
        self.coordinates.y
    }

    #[inline(always)]
    pub fn demand(&self) -> f64 {
        self.demand
    }

    #[inline(always)]
    pub fn service_duration(&self) -> f64 {
        self.service_duration
    }

    pub fn euclidean_distance(&self, other: &Client) -> f64 {
        let dx = self.x() - other.x();
        let dy = self.y() - other.y();

        (dx * dx + dy * dy).sqrt()
    }

    /// Angle of the client around `origin`, in radians.
    pub fn polar_angle(&self, origin: &Client) -> f64 {
        (self.y() - origin.y()).atan2(self.x() - origin.x())
    }
}
