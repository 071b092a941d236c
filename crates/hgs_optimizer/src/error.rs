use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("At least two clients are required, found {0}")]
    TooFewClients(usize),
    #[error("The fleet must contain at least one vehicle")]
    NoVehicles,
    #[error("Fleet of {vehicles} vehicles is below the lower bound of {lower_bound} vehicles")]
    InsufficientFleet { vehicles: usize, lower_bound: usize },
    #[error("Vehicle capacity must be positive, got {0}")]
    InvalidCapacity(f64),
    #[error("Duration limit must be positive, got {0}")]
    InvalidDurationLimit(f64),
    #[error("Client {client} has a negative demand or service duration")]
    InvalidClient { client: usize },
    #[error("Travel cost matrix has {found} locations, expected {expected}")]
    MatrixSizeMismatch { expected: usize, found: usize },
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}
