// 🚗 Vehicle Entity - registered vehicle and its current session
//
// Line shape in vehicles/data.txt:
//   vehicleId|licensePlate|ownerName|vehicleType|parkedFlag|spotNumber|ownerPhone|entryTimeEpoch

use super::{from_epoch, to_epoch};
use crate::store::{flag, read_flag, read_parsed, read_string, FlatRecord};
use chrono::{DateTime, Utc};
use csv::StringRecord;
use serde::{Deserialize, Serialize};

// ============================================================================
// VEHICLE TYPE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleType {
    Car,
    Bike,
    Truck,
    Bus,
    /// Anything else, kept as typed
    Other(String),
}

impl VehicleType {
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "car" => VehicleType::Car,
            "bike" | "motorbike" | "motorcycle" => VehicleType::Bike,
            "truck" => VehicleType::Truck,
            "bus" => VehicleType::Bus,
            _ => VehicleType::Other(tag.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            VehicleType::Car => "Car",
            VehicleType::Bike => "Bike",
            VehicleType::Truck => "Truck",
            VehicleType::Bus => "Bus",
            VehicleType::Other(tag) => tag,
        }
    }
}

impl Default for VehicleType {
    fn default() -> Self {
        VehicleType::Other(String::new())
    }
}

// ============================================================================
// VEHICLE ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Vehicle {
    /// Stable identity (`VH0001`) - never changes
    pub id: String,
    pub license_plate: String,
    pub owner_name: String,
    pub owner_phone: String,
    pub vehicle_type: VehicleType,

    // ========================================================================
    // SESSION STATE
    // ========================================================================
    pub parked: bool,
    /// 0 when not parked
    pub spot_number: u32,
    /// None when not parked
    pub entry_time: Option<DateTime<Utc>>,
}

/// Fields supplied when registering a vehicle.
#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub license_plate: String,
    pub vehicle_type: String,
    pub owner_name: String,
    pub owner_phone: String,
}

impl Vehicle {
    pub fn new(id: String, new: &NewVehicle) -> Self {
        Vehicle {
            id,
            license_plate: new.license_plate.clone(),
            owner_name: new.owner_name.clone(),
            owner_phone: new.owner_phone.clone(),
            vehicle_type: VehicleType::parse(&new.vehicle_type),
            parked: false,
            spot_number: 0,
            entry_time: None,
        }
    }

    pub fn park(&mut self, spot_number: u32, entry_time: DateTime<Utc>) {
        self.parked = true;
        self.spot_number = spot_number;
        self.entry_time = Some(entry_time);
    }

    pub fn clear_session(&mut self) {
        self.parked = false;
        self.spot_number = 0;
        self.entry_time = None;
    }

    /// Parked flag and spot number agree with each other.
    pub fn is_consistent(&self) -> bool {
        self.parked == (self.spot_number != 0)
    }
}

impl FlatRecord for Vehicle {
    const KIND: &'static str = "vehicle";

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.license_plate.clone(),
            self.owner_name.clone(),
            self.vehicle_type.as_str().to_string(),
            flag(self.parked),
            self.spot_number.to_string(),
            self.owner_phone.clone(),
            to_epoch(self.entry_time).to_string(),
        ]
    }

    fn read_fields(&mut self, fields: &StringRecord) {
        read_string(fields, 0, &mut self.id);
        read_string(fields, 1, &mut self.license_plate);
        read_string(fields, 2, &mut self.owner_name);
        if let Some(tag) = fields.get(3) {
            self.vehicle_type = VehicleType::parse(tag);
        }
        read_flag(fields, 4, &mut self.parked);
        read_parsed(fields, 5, &mut self.spot_number);
        read_string(fields, 6, &mut self.owner_phone);
        let mut epoch = 0i64;
        read_parsed(fields, 7, &mut epoch);
        self.entry_time = from_epoch(epoch);
    }
}
