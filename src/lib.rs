// Lot Manager - Core Library
// Exposes all modules for use in the CLI, the TUI and tests

pub mod allocator; // Spot Allocator - first-fit over spots 1..=N
pub mod config;
pub mod entities; // Vehicle, ParkingSpot, Owner, Admin + id sequences
pub mod error;
pub mod fee; // Fee Calculator - billed hours * rate
pub mod lot; // Session Lifecycle - park / unpark / delete
pub mod report;
pub mod store; // Record Store - pipe-delimited flat files
pub mod validation;

// Re-export commonly used types
pub use allocator::SpotAllocator;
pub use config::{ConfigError, LotConfig, OwnerIdScheme};
pub use entities::{Admin, IdSequence, NewAdmin, NewVehicle, Owner, ParkingSpot, Vehicle, VehicleType};
pub use error::{ErrorKind, LotError, LotResult};
pub use fee::FeeCalculator;
pub use lot::{Lot, SharedLot};
pub use report::{LotStatus, ParkedRow, Report, SpotRow};
pub use store::{FlatRecord, Layout};
pub use validation::ValidationError;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
