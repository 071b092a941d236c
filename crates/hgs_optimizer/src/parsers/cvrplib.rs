use std::path::Path;

use anyhow::{Context, bail};
use geo::Coord;
use tracing::warn;

use crate::{
    parsers::parser::DatasetParser,
    problem::{
        client::Client,
        vehicle_routing_problem::{VehicleRoutingProblem, VehicleRoutingProblemBuilder},
    },
};

/// Reader for CVRPLIB `.vrp` instances with euclidean distances.
#[derive(Debug, Clone)]
pub struct CVRPLibParser {
    pub round_distances: bool,
    /// Overrides the `VEHICLES` entry of the instance.
    pub nb_vehicles: Option<usize>,
}

impl Default for CVRPLibParser {
    fn default() -> Self {
        CVRPLibParser {
            round_distances: true,
            nb_vehicles: None,
        }
    }
}

impl DatasetParser for CVRPLibParser {
    fn parse<P: AsRef<Path>>(&self, file: P) -> Result<VehicleRoutingProblem, anyhow::Error> {
        let path = file.as_ref();
        let file_content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let instance = parse(&file_content)
            .with_context(|| format!("Invalid CVRPLIB instance {}", path.display()))?;

        self.build_problem(&instance)
    }
}

impl CVRPLibParser {
    pub fn build_problem(&self, instance: &CvrpInstance) -> Result<VehicleRoutingProblem, anyhow::Error> {
        let clients = instance
            .coords
            .iter()
            .zip(&instance.demands)
            .enumerate()
            .map(|(id, (&coordinates, &demand))| {
                if id == 0 {
                    Client::depot(coordinates)
                } else {
                    Client::new(coordinates, demand, instance.service_time)
                }
            })
            .collect::<Vec<_>>();

        let lower_bound = (instance.demands.iter().sum::<f64>() / instance.capacity).ceil() as usize;
        let nb_vehicles = self.nb_vehicles.or(instance.vehicles).filter(|&nb_vehicles| {
            if nb_vehicles < lower_bound {
                warn!(
                    nb_vehicles,
                    lower_bound, "Fleet size below the vehicles lower bound, using the default fleet"
                );
                false
            } else {
                true
            }
        });

        let mut builder = VehicleRoutingProblemBuilder::default();
        builder
            .set_clients(clients)
            .set_round_distances(self.round_distances)
            .set_vehicle_capacity(instance.capacity)
            .set_duration_limit(instance.distance)
            .set_nb_vehicles(nb_vehicles);

        Ok(builder.build()?)
    }
}

#[derive(Debug, Clone)]
pub struct CvrpInstance {
    pub name: Option<String>,
    pub dimension: usize,
    pub capacity: f64,
    /// Route duration limit.
    pub distance: Option<f64>,
    /// Service duration of every client.
    pub service_time: f64,
    pub vehicles: Option<usize>,
    pub coords: Vec<Coord<f64>>,
    pub demands: Vec<f64>,
    pub depots: Vec<usize>,
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, anyhow::Error> {
    value
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid {}: {}", key.to_lowercase(), value))
}

pub fn parse(text: &str) -> Result<CvrpInstance, anyhow::Error> {
    let mut name: Option<String> = None;
    let mut dimension: Option<usize> = None;
    let mut capacity: Option<f64> = None;
    let mut distance: Option<f64> = None;
    let mut service_time: Option<f64> = None;
    let mut vehicles: Option<usize> = None;
    let mut coords: Option<Vec<Coord<f64>>> = None;
    let mut demands: Option<Vec<f64>> = None;
    let mut depots: Option<Vec<usize>> = None;

    let lines: Vec<&str> = text.lines().map(|l| l.trim()).collect();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if line.is_empty() || line == "EOF" {
            i += 1;
            continue;
        }

        // Header entries (KEY : VALUE)
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim().to_uppercase();
            let value = value.trim();

            match key.as_str() {
                "NAME" => name = Some(value.to_owned()),
                "DIMENSION" => dimension = Some(parse_value(&key, value)?),
                "CAPACITY" => capacity = Some(parse_value(&key, value)?),
                "DISTANCE" => distance = Some(parse_value(&key, value)?),
                "SERVICE_TIME" => service_time = Some(parse_value(&key, value)?),
                "VEHICLES" => vehicles = Some(parse_value(&key, value)?),
                "EDGE_WEIGHT_TYPE" if value != "EUC_2D" => {
                    bail!("Unsupported edge weight type: {}", value)
                }
                _ => {}
            }
            i += 1;
            continue;
        }

        if line.contains("NODE_COORD_SECTION") {
            i += 1;
            let mut parsed_coords = Vec::new();
            while i < lines.len() && !lines[i].contains("SECTION") && lines[i] != "EOF" {
                let parts: Vec<&str> = lines[i].split_whitespace().collect();
                if parts.len() >= 3 {
                    let id: usize = parse_value("node id", parts[0])?;
                    if id != parsed_coords.len() + 1 {
                        bail!("Nodes must be numbered from 1 in order, found {}", id);
                    }
                    let x: f64 = parse_value("x coordinate", parts[1])?;
                    let y: f64 = parse_value("y coordinate", parts[2])?;
                    parsed_coords.push(Coord { x, y });
                }
                i += 1;
            }
            coords = Some(parsed_coords);
            continue;
        }

        if line.contains("DEMAND_SECTION") {
            i += 1;
            let mut parsed_demands: Vec<f64> = Vec::new();
            while i < lines.len() && !lines[i].contains("SECTION") && lines[i] != "EOF" {
                let parts: Vec<&str> = lines[i].split_whitespace().collect();
                if parts.len() >= 2 {
                    parsed_demands.push(parse_value("demand", parts[1])?);
                }
                i += 1;
            }
            demands = Some(parsed_demands);
            continue;
        }

        if line.contains("DEPOT_SECTION") {
            i += 1;
            let mut parsed_depots = Vec::new();
            while i < lines.len() && !lines[i].contains("SECTION") && lines[i] != "EOF" {
                for part in lines[i].split_whitespace() {
                    let idx: i64 = parse_value("depot index", part)?;
                    if idx == -1 {
                        break;
                    }
                    if idx < 1 {
                        bail!("Invalid depot index: {}", idx);
                    }
                    // 0-indexed
                    parsed_depots.push((idx - 1) as usize);
                }
                i += 1;
            }
            depots = Some(parsed_depots);
            continue;
        }

        i += 1;
    }

    let instance = CvrpInstance {
        name,
        dimension: dimension.ok_or_else(|| anyhow::anyhow!("Missing DIMENSION"))?,
        capacity: capacity.ok_or_else(|| anyhow::anyhow!("Missing CAPACITY"))?,
        distance,
        service_time: service_time.unwrap_or(0.0),
        vehicles,
        coords: coords.ok_or_else(|| anyhow::anyhow!("Missing NODE_COORD_SECTION"))?,
        demands: demands.ok_or_else(|| anyhow::anyhow!("Missing DEMAND_SECTION"))?,
        depots: depots.unwrap_or_else(|| vec![0]),
    };

    if instance.coords.len() != instance.dimension || instance.demands.len() != instance.dimension
    {
        bail!(
            "Expected {} nodes, found {} coordinates and {} demands",
            instance.dimension,
            instance.coords.len(),
            instance.demands.len()
        );
    }
    if instance.depots != [0] {
        bail!("Only node 1 is supported as the depot");
    }

    Ok(instance)
}

/// Cost written on the `Cost` line of a CVRPLIB solution file.
pub fn parse_solution_file<P: AsRef<Path>>(path: P) -> Option<f64> {
    if !path.as_ref().exists() {
        return None;
    }

    let content = std::fs::read_to_string(path).ok()?;

    content
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix("Cost "))
        .and_then(|cost| cost.trim().parse().ok())
}
