use tracing::warn;

use crate::error::SolverError;

use super::{
    client::Client,
    travel_cost_matrix::{Distance, TravelCostMatrix},
};

/// Capacitated vehicle routing problem with an optional route duration limit.
///
/// Clients are indexed from 0, the depot, to `nb_clients()` included.
#[derive(Debug, Clone)]
pub struct VehicleRoutingProblem {
    clients: Vec<Client>,
    travel_costs: TravelCostMatrix,
    vehicle_capacity: f64,
    duration_limit: Option<f64>,
    nb_vehicles: usize,

    total_demand: f64,
    max_demand: f64,
    max_distance: Distance,
}

impl VehicleRoutingProblem {
    #[inline(always)]
    pub fn nb_clients(&self) -> usize {
        self.clients.len() - 1
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    #[inline(always)]
    pub fn client(&self, index: usize) -> &Client {
        &self.clients[index]
    }

    pub fn depot(&self) -> &Client {
        &self.clients[0]
    }

    #[inline(always)]
    pub fn demand(&self, index: usize) -> f64 {
        self.clients[index].demand()
    }

    #[inline(always)]
    pub fn service_duration(&self, index: usize) -> f64 {
        self.clients[index].service_duration()
    }

    #[inline(always)]
    pub fn distance(&self, from: usize, to: usize) -> Distance {
        self.travel_costs.cost(from, to)
    }

    pub fn travel_costs(&self) -> &TravelCostMatrix {
        &self.travel_costs
    }

    pub fn vehicle_capacity(&self) -> f64 {
        self.vehicle_capacity
    }

    pub fn duration_limit(&self) -> Option<f64> {
        self.duration_limit
    }

    pub fn has_duration_limit(&self) -> bool {
        self.duration_limit.is_some()
    }

    pub fn nb_vehicles(&self) -> usize {
        self.nb_vehicles
    }

    pub fn total_demand(&self) -> f64 {
        self.total_demand
    }

    pub fn max_demand(&self) -> f64 {
        self.max_demand
    }

    pub fn max_distance(&self) -> Distance {
        self.max_distance
    }

    #[inline(always)]
    pub fn load_excess(&self, load: f64) -> f64 {
        (load - self.vehicle_capacity).max(0.0)
    }

    #[inline(always)]
    pub fn duration_excess(&self, duration: f64) -> f64 {
        match self.duration_limit {
            Some(limit) => (duration - limit).max(0.0),
            None => 0.0,
        }
    }

    /// Minimum number of vehicles needed to carry the total demand.
    pub fn vehicles_lower_bound(&self) -> usize {
        lower_bound_vehicles(self.total_demand, self.vehicle_capacity)
    }

    /// Starting weight of the capacity penalty, `maxDistance / maxDemand` clamped to `[0.1, 1000]`.
    pub fn initial_capacity_penalty(&self) -> f64 {
        if self.max_demand <= 0.0 {
            return 1000.0;
        }

        (self.max_distance / self.max_demand).clamp(0.1, 1000.0)
    }
}

fn lower_bound_vehicles(total_demand: f64, capacity: f64) -> usize {
    (total_demand / capacity).ceil().max(0.0) as usize
}

/// Fleet size used when none is given: 30% above the lower bound plus three vehicles.
pub fn default_fleet_size(total_demand: f64, capacity: f64) -> usize {
    (1.3 * total_demand / capacity).ceil().max(0.0) as usize + 3
}

#[derive(Default)]
pub struct VehicleRoutingProblemBuilder {
    clients: Option<Vec<Client>>,
    travel_costs: Option<TravelCostMatrix>,
    vehicle_capacity: Option<f64>,
    duration_limit: Option<f64>,
    nb_vehicles: Option<usize>,
    round_distances: bool,
}

impl VehicleRoutingProblemBuilder {
    /// The first client is the depot.
    pub fn set_clients(&mut self, clients: Vec<Client>) -> &mut VehicleRoutingProblemBuilder {
        self.clients = Some(clients);
        self
    }

    pub fn add_client(&mut self, client: Client) -> &mut VehicleRoutingProblemBuilder {
        if let Some(clients) = &mut self.clients {
            clients.push(client);
        } else {
            self.clients = Some(vec![client]);
        }

        self
    }

    /// Without a matrix, euclidean distances between client coordinates are used.
    pub fn set_travel_costs(
        &mut self,
        travel_costs: TravelCostMatrix,
    ) -> &mut VehicleRoutingProblemBuilder {
        self.travel_costs = Some(travel_costs);
        self
    }

    pub fn set_round_distances(&mut self, round: bool) -> &mut VehicleRoutingProblemBuilder {
        self.round_distances = round;
        self
    }

    pub fn set_vehicle_capacity(&mut self, capacity: f64) -> &mut VehicleRoutingProblemBuilder {
        self.vehicle_capacity = Some(capacity);
        self
    }

    pub fn set_duration_limit(
        &mut self,
        duration_limit: Option<f64>,
    ) -> &mut VehicleRoutingProblemBuilder {
        self.duration_limit = duration_limit;
        self
    }

    pub fn set_nb_vehicles(
        &mut self,
        nb_vehicles: Option<usize>,
    ) -> &mut VehicleRoutingProblemBuilder {
        self.nb_vehicles = nb_vehicles;
        self
    }

    pub fn build(self) -> Result<VehicleRoutingProblem, SolverError> {
        let clients = self.clients.unwrap_or_default();
        let nb_clients = clients.len().saturating_sub(1);
        if nb_clients < 2 {
            return Err(SolverError::TooFewClients(nb_clients));
        }

        let vehicle_capacity = self.vehicle_capacity.unwrap_or(f64::INFINITY);
        if vehicle_capacity.is_nan() || vehicle_capacity <= 0.0 {
            return Err(SolverError::InvalidCapacity(vehicle_capacity));
        }

        if let Some(limit) = self.duration_limit.filter(|limit| limit.is_nan() || *limit <= 0.0) {
            return Err(SolverError::InvalidDurationLimit(limit));
        }

        if let Some(client) = clients
            .iter()
            .position(|client| client.demand() < 0.0 || client.service_duration() < 0.0)
        {
            return Err(SolverError::InvalidClient { client });
        }

        let travel_costs = match self.travel_costs {
            Some(travel_costs) => {
                if travel_costs.num_locations() != clients.len() {
                    return Err(SolverError::MatrixSizeMismatch {
                        expected: clients.len(),
                        found: travel_costs.num_locations(),
                    });
                }
                travel_costs
            }
            None => TravelCostMatrix::from_euclidean(&clients, self.round_distances),
        };

        let total_demand: f64 = clients.iter().skip(1).map(Client::demand).sum();
        let max_demand = clients.iter().skip(1).map(Client::demand).fold(0.0, f64::max);
        let max_distance = travel_costs.max_cost();

        let lower_bound = lower_bound_vehicles(total_demand, vehicle_capacity);
        let nb_vehicles = match self.nb_vehicles {
            Some(0) => return Err(SolverError::NoVehicles),
            Some(nb_vehicles) if nb_vehicles < lower_bound => {
                return Err(SolverError::InsufficientFleet {
                    vehicles: nb_vehicles,
                    lower_bound,
                });
            }
            Some(nb_vehicles) => nb_vehicles,
            None if vehicle_capacity.is_infinite() => 1,
            None => default_fleet_size(total_demand, vehicle_capacity),
        };

        if max_demand > vehicle_capacity {
            warn!(
                max_demand,
                vehicle_capacity, "A client demand exceeds the vehicle capacity"
            );
        }

        Ok(VehicleRoutingProblem {
            clients,
            travel_costs,
            vehicle_capacity,
            duration_limit: self.duration_limit,
            nb_vehicles,
            total_demand,
            max_demand,
            max_distance,
        })
    }
}
