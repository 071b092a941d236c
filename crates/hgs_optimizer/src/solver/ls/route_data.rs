/// A route being optimized, with prefix data indexed by position.
///
/// Position 0 is the starting depot, positions `1..=len()` the clients and
/// `len() + 1` the returning depot.
#[derive(Debug, Clone, Default)]
pub(super) struct RouteData {
    pub clients: Vec<usize>,
    pub cumulated_load: Vec<f64>,
    /// Travel and service time from the depot up to the position.
    pub cumulated_time: Vec<f64>,
    /// Cost difference of travelling the route backward up to the position.
    pub cumulated_reversal_distance: Vec<f64>,
    pub load: f64,
    pub duration: f64,
    pub reversal_distance: f64,
    pub penalty: f64,
    pub when_last_modified: usize,
    pub polar_angle_barycenter: f64,
}

impl RouteData {
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Client at `position`, 0 for both depots.
    #[inline(always)]
    pub fn client_at(&self, position: usize) -> usize {
        if position == 0 || position > self.clients.len() {
            0
        } else {
            self.clients[position - 1]
        }
    }

    #[inline(always)]
    pub fn is_end_depot(&self, position: usize) -> bool {
        position == self.clients.len() + 1
    }
}
