// Entity Models - records the lot persists
//
// Each entity has:
// - Stable identity that never changes once assigned
// - A flat-file codec (FlatRecord) matching its data file line shape

pub mod admin;
pub mod ids;
pub mod owner;
pub mod spot;
pub mod vehicle;

pub use admin::{Admin, NewAdmin};
pub use ids::IdSequence;
pub use owner::Owner;
pub use spot::ParkingSpot;
pub use vehicle::{NewVehicle, Vehicle, VehicleType};

use chrono::{DateTime, Utc};

/// Epoch seconds on disk → timestamp; `0` means "not set".
pub(crate) fn from_epoch(secs: i64) -> Option<DateTime<Utc>> {
    if secs <= 0 {
        None
    } else {
        DateTime::from_timestamp(secs, 0)
    }
}

pub(crate) fn to_epoch(time: Option<DateTime<Utc>>) -> i64 {
    time.map(|t| t.timestamp()).unwrap_or(0)
}
