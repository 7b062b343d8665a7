//! Error types for the lot engine.

use std::path::PathBuf;

use thiserror::Error;

use crate::validation::ValidationError;

/// Result type alias for lot operations.
pub type LotResult<T> = Result<T, LotError>;

/// Coarse error taxonomy callers branch on (exit codes, retry decisions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Lookup miss (vehicle, owner, spot, admin)
    NotFound,
    /// Already parked, spot taken, capacity reached, duplicate registration
    Conflict,
    /// Operation not valid for the current state of the record
    InvalidState,
    /// File open/read/write failure
    IoFailure,
    /// Current time earlier than a recorded entry time
    ClockSkew,
    /// Caller supplied malformed input
    Invalid,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::InvalidState => "invalid state",
            ErrorKind::IoFailure => "I/O failure",
            ErrorKind::ClockSkew => "clock skew",
            ErrorKind::Invalid => "invalid input",
        }
    }
}

/// Errors that can occur during lot operations.
#[derive(Error, Debug)]
pub enum LotError {
    #[error("Vehicle not found: {0}")]
    VehicleNotFound(String),

    #[error("Spot not found: {0}")]
    SpotNotFound(u32),

    #[error("Vehicle {vehicle_id} is already parked in spot {spot}")]
    AlreadyParked { vehicle_id: String, spot: u32 },

    #[error("Spot {spot} is already occupied by {vehicle_id}")]
    AlreadyOccupied { spot: u32, vehicle_id: String },

    #[error("No available parking spots ({capacity} of {capacity} occupied)")]
    LotFull { capacity: usize },

    #[error("Maximum number of {what} reached ({limit})")]
    CapacityReached { what: &'static str, limit: usize },

    #[error("Admin already registered: {0}")]
    AdminExists(String),

    #[error("Vehicle is not currently parked: {0}")]
    NotParked(String),

    #[error("Spot {0} is not occupied")]
    NotOccupied(u32),

    #[error("No admins registered")]
    NoAdmins,

    #[error("No matching admin found for {0}")]
    InvalidCredentials(String),

    #[error("Clock skew: now ({now}) is before entry time ({entry})")]
    ClockSkew { entry: i64, now: i64 },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Record file error: {0}")]
    Csv(#[from] csv::Error),
}

impl LotError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LotError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LotError::VehicleNotFound(_)
            | LotError::SpotNotFound(_)
            | LotError::NoAdmins
            | LotError::InvalidCredentials(_) => ErrorKind::NotFound,
            LotError::AlreadyParked { .. }
            | LotError::AlreadyOccupied { .. }
            | LotError::LotFull { .. }
            | LotError::CapacityReached { .. }
            | LotError::AdminExists(_) => ErrorKind::Conflict,
            LotError::NotParked(_) | LotError::NotOccupied(_) => ErrorKind::InvalidState,
            LotError::ClockSkew { .. } => ErrorKind::ClockSkew,
            LotError::Validation(_) => ErrorKind::Invalid,
            LotError::Io { .. } | LotError::Csv(_) => ErrorKind::IoFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            LotError::VehicleNotFound("VH0001".to_string()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(LotError::LotFull { capacity: 2 }.kind(), ErrorKind::Conflict);
        assert_eq!(
            LotError::NotParked("VH0001".to_string()).kind(),
            ErrorKind::InvalidState
        );
        assert_eq!(
            LotError::ClockSkew { entry: 10, now: 5 }.kind(),
            ErrorKind::ClockSkew
        );

        let io = LotError::io(
            "vehicles/data.txt",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(io.kind(), ErrorKind::IoFailure);
        assert!(io.to_string().contains("vehicles/data.txt"));
    }

    #[test]
    fn test_messages_name_the_record() {
        let err = LotError::AlreadyParked {
            vehicle_id: "VH0003".to_string(),
            spot: 7,
        };
        assert_eq!(err.to_string(), "Vehicle VH0003 is already parked in spot 7");
    }
}
