// 🅿️ Parking Spot Entity - one fixed physical location
//
// Line shape in parking/data.txt (no count line, spot-number order):
//   spotNumber|occupiedFlag|vehicleId|entryTimeEpoch|fee

use super::{from_epoch, to_epoch};
use crate::store::{flag, read_flag, read_parsed, read_string, FlatRecord};
use chrono::{DateTime, Utc};
use csv::StringRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParkingSpot {
    /// 1..=N, assigned at init, never changes
    pub number: u32,
    pub occupied: bool,
    /// Empty when free
    pub vehicle_id: String,
    /// Start of the current session, or of the last one after release
    pub entry_time: Option<DateTime<Utc>>,
    /// Fee of the last completed session; stale while occupied
    pub last_fee: f64,
}

impl ParkingSpot {
    pub fn new(number: u32) -> Self {
        ParkingSpot {
            number,
            ..Default::default()
        }
    }

    pub fn is_free(&self) -> bool {
        !self.occupied
    }

    /// Occupancy flag and vehicle binding agree with each other.
    pub fn is_consistent(&self) -> bool {
        self.occupied == !self.vehicle_id.is_empty()
    }
}

impl FlatRecord for ParkingSpot {
    const KIND: &'static str = "spot";

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.number.to_string(),
            flag(self.occupied),
            self.vehicle_id.clone(),
            to_epoch(self.entry_time).to_string(),
            format!("{:.2}", self.last_fee),
        ]
    }

    fn read_fields(&mut self, fields: &StringRecord) {
        read_parsed(fields, 0, &mut self.number);
        read_flag(fields, 1, &mut self.occupied);
        read_string(fields, 2, &mut self.vehicle_id);
        let mut epoch = 0i64;
        read_parsed(fields, 3, &mut epoch);
        self.entry_time = from_epoch(epoch);
        read_parsed(fields, 4, &mut self.last_fee);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_spot_is_free() {
        let spot = ParkingSpot::new(12);
        assert_eq!(spot.number, 12);
        assert!(spot.is_free());
        assert!(spot.is_consistent());
        assert_eq!(spot.to_fields().join("|"), "12|0||0|0.00");
    }

    #[test]
    fn test_read_released_spot_with_fee() {
        let row = StringRecord::from(vec!["3", "0", "", "1700000000", "200.00"]);
        let mut spot = ParkingSpot::default();
        spot.read_fields(&row);

        assert_eq!(spot.number, 3);
        assert!(spot.is_free());
        assert_eq!(spot.last_fee, 200.0);
        assert_eq!(spot.entry_time.map(|t| t.timestamp()), Some(1_700_000_000));
    }

    #[test]
    fn test_inconsistent_binding_detected() {
        let mut spot = ParkingSpot::new(1);
        spot.occupied = true;
        assert!(!spot.is_consistent());
    }
}
