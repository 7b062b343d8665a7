// 🧭 Spot Allocator - which spots are free, first-fit assignment
//
// Spots live in a dense table indexed by `number - 1`. Allocation is a
// deterministic ascending scan: the lowest-numbered free spot always wins.

use crate::entities::ParkingSpot;
use crate::error::{LotError, LotResult};
use chrono::{DateTime, Utc};
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct SpotAllocator {
    spots: Vec<ParkingSpot>,
}

impl SpotAllocator {
    /// `capacity` free spots numbered 1..=capacity.
    pub fn new(capacity: usize) -> Self {
        let spots = (1..=capacity as u32).map(ParkingSpot::new).collect();
        Self { spots }
    }

    /// Build the dense 1..=capacity table from loaded records.
    ///
    /// Missing spots are created free; free records with a number outside
    /// the range, or records repeating a number already seen, are dropped.
    /// An occupied record above `capacity` grows the table to reach it, so a
    /// smaller configured lot never ends a running session.
    pub fn from_records(records: Vec<ParkingSpot>, capacity: usize) -> Self {
        let highest_occupied = records
            .iter()
            .filter(|r| r.occupied)
            .map(|r| r.number as usize)
            .max()
            .unwrap_or(0);
        if highest_occupied > capacity {
            warn!(
                configured = capacity,
                occupied_spot = highest_occupied,
                "occupied spots beyond configured capacity, keeping them"
            );
        }
        let capacity = capacity.max(highest_occupied);

        let mut allocator = Self::new(capacity);
        let mut seen = vec![false; capacity];

        for record in records {
            let number = record.number;
            if number == 0 || number as usize > capacity {
                warn!(spot = number, capacity, "dropping spot record outside the lot");
                continue;
            }
            let index = number as usize - 1;
            if seen[index] {
                warn!(spot = number, "dropping duplicate spot record");
                continue;
            }
            seen[index] = true;
            allocator.spots[index] = record;
        }

        allocator
    }

    pub fn capacity(&self) -> usize {
        self.spots.len()
    }

    pub fn spots(&self) -> &[ParkingSpot] {
        &self.spots
    }

    pub fn get(&self, number: u32) -> Option<&ParkingSpot> {
        let index = (number as usize).checked_sub(1)?;
        self.spots.get(index)
    }

    fn get_mut(&mut self, number: u32) -> LotResult<&mut ParkingSpot> {
        (number as usize)
            .checked_sub(1)
            .and_then(|index| self.spots.get_mut(index))
            .ok_or(LotError::SpotNotFound(number))
    }

    pub fn occupied_count(&self) -> usize {
        self.spots.iter().filter(|s| s.occupied).count()
    }

    pub fn available_count(&self) -> usize {
        self.capacity() - self.occupied_count()
    }

    pub fn is_full(&self) -> bool {
        self.available_count() == 0
    }

    /// Lowest-numbered free spot, if any.
    pub fn find_available_spot(&self) -> Option<u32> {
        self.spots.iter().find(|s| s.is_free()).map(|s| s.number)
    }

    /// Spot currently bound to `vehicle_id`.
    pub fn spot_of(&self, vehicle_id: &str) -> Option<&ParkingSpot> {
        self.spots
            .iter()
            .find(|s| s.occupied && s.vehicle_id == vehicle_id)
    }

    pub fn occupy(
        &mut self,
        number: u32,
        vehicle_id: &str,
        entry_time: DateTime<Utc>,
    ) -> LotResult<()> {
        let spot = self.get_mut(number)?;
        if spot.occupied {
            return Err(LotError::AlreadyOccupied {
                spot: number,
                vehicle_id: spot.vehicle_id.clone(),
            });
        }
        spot.occupied = true;
        spot.vehicle_id = vehicle_id.to_string();
        spot.entry_time = Some(entry_time);
        spot.last_fee = 0.0;
        Ok(())
    }

    /// Free the spot. Entry time and fee stay until the next `occupy`.
    /// Returns the vehicle id that was bound.
    pub fn release(&mut self, number: u32) -> LotResult<String> {
        let spot = self.get_mut(number)?;
        if !spot.occupied {
            return Err(LotError::NotOccupied(number));
        }
        spot.occupied = false;
        Ok(std::mem::take(&mut spot.vehicle_id))
    }

    /// Force the spot free and unbound, whatever its current flags say.
    /// Only used to repair records loaded from disk.
    pub(crate) fn reset_binding(&mut self, number: u32) -> LotResult<()> {
        let spot = self.get_mut(number)?;
        spot.occupied = false;
        spot.vehicle_id.clear();
        Ok(())
    }

    pub fn record_fee(&mut self, number: u32, fee: f64) -> LotResult<()> {
        self.get_mut(number)?.last_fee = fee;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_new_allocator_is_dense_and_free() {
        let allocator = SpotAllocator::new(4);
        let numbers: Vec<u32> = allocator.spots().iter().map(|s| s.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert_eq!(allocator.available_count(), 4);
        assert_eq!(allocator.find_available_spot(), Some(1));
    }

    #[test]
    fn test_first_fit_picks_lowest_free() {
        let mut allocator = SpotAllocator::new(5);
        allocator.occupy(1, "VH0001", at()).unwrap();
        allocator.occupy(2, "VH0002", at()).unwrap();
        allocator.occupy(4, "VH0004", at()).unwrap();
        assert_eq!(allocator.find_available_spot(), Some(3));

        allocator.release(2).unwrap();
        assert_eq!(allocator.find_available_spot(), Some(2));
    }

    #[test]
    fn test_find_never_returns_occupied_spot() {
        // walk every occupancy pattern of a 6-spot lot
        for mask in 0u32..(1 << 6) {
            let mut allocator = SpotAllocator::new(6);
            for bit in 0..6 {
                if mask & (1 << bit) != 0 {
                    allocator.occupy(bit + 1, "VH", at()).unwrap();
                }
            }
            let expected = (0..6).find(|bit| mask & (1 << bit) == 0).map(|bit| bit + 1);
            assert_eq!(allocator.find_available_spot(), expected, "mask {:06b}", mask);
            if let Some(number) = allocator.find_available_spot() {
                assert!(allocator.get(number).unwrap().is_free());
            }
        }
    }

    #[test]
    fn test_full_lot_has_no_spot() {
        let mut allocator = SpotAllocator::new(2);
        allocator.occupy(1, "A", at()).unwrap();
        allocator.occupy(2, "B", at()).unwrap();
        assert!(allocator.is_full());
        assert_eq!(allocator.find_available_spot(), None);
    }

    #[test]
    fn test_occupy_taken_spot_fails() {
        let mut allocator = SpotAllocator::new(2);
        allocator.occupy(1, "VH0001", at()).unwrap();

        let err = allocator.occupy(1, "VH0002", at()).unwrap_err();
        assert!(matches!(err, LotError::AlreadyOccupied { spot: 1, .. }));
        assert_eq!(allocator.get(1).unwrap().vehicle_id, "VH0001");
    }

    #[test]
    fn test_release_free_spot_fails() {
        let mut allocator = SpotAllocator::new(2);
        assert!(matches!(allocator.release(2), Err(LotError::NotOccupied(2))));
    }

    #[test]
    fn test_out_of_range_spot() {
        let mut allocator = SpotAllocator::new(2);
        assert!(matches!(
            allocator.occupy(0, "VH", at()),
            Err(LotError::SpotNotFound(0))
        ));
        assert!(matches!(allocator.release(3), Err(LotError::SpotNotFound(3))));
        assert!(allocator.get(0).is_none());
    }

    #[test]
    fn test_release_keeps_entry_time_and_fee() {
        let mut allocator = SpotAllocator::new(1);
        allocator.occupy(1, "VH0001", at()).unwrap();
        let released = allocator.release(1).unwrap();
        allocator.record_fee(1, 300.0).unwrap();

        let spot = allocator.get(1).unwrap();
        assert_eq!(released, "VH0001");
        assert!(spot.is_free());
        assert!(spot.vehicle_id.is_empty());
        assert_eq!(spot.entry_time, Some(at()));
        assert_eq!(spot.last_fee, 300.0);

        allocator.occupy(1, "VH0002", at()).unwrap();
        assert_eq!(allocator.get(1).unwrap().last_fee, 0.0);
    }

    #[test]
    fn test_from_records_keeps_occupied_spot_above_capacity() {
        let mut far = ParkingSpot::new(5);
        far.occupied = true;
        far.vehicle_id = "VH0005".to_string();

        let allocator = SpotAllocator::from_records(vec![far.clone(), ParkingSpot::new(4)], 2);

        assert_eq!(allocator.capacity(), 5);
        assert_eq!(allocator.get(5), Some(&far));
        assert!(allocator.get(3).unwrap().is_free());
    }

    #[test]
    fn test_from_records_normalizes() {
        let mut taken = ParkingSpot::new(2);
        taken.occupied = true;
        taken.vehicle_id = "VH0009".to_string();

        let mut dup = ParkingSpot::new(2);
        dup.vehicle_id = "ignored".to_string();

        let records = vec![taken.clone(), ParkingSpot::new(9), dup, ParkingSpot::new(0)];
        let allocator = SpotAllocator::from_records(records, 3);

        assert_eq!(allocator.capacity(), 3);
        assert_eq!(allocator.get(2), Some(&taken));
        assert!(allocator.get(1).unwrap().is_free());
        assert!(allocator.get(3).unwrap().is_free());
        assert_eq!(allocator.spot_of("VH0009").map(|s| s.number), Some(2));
    }
}
