// 🚦 Lot - session lifecycle over vehicles, owners, admins and spots
//
// The Lot aggregate owns every collection. Operations either fully apply or
// fully reject: validation happens before any mutation, and if persisting a
// mutation fails the in-memory state is rolled back to what it was before
// the call, so memory never runs ahead of the files.

use crate::allocator::SpotAllocator;
use crate::config::{LotConfig, OwnerIdScheme};
use crate::entities::{Admin, IdSequence, NewAdmin, NewVehicle, Owner, ParkingSpot, Vehicle};
use crate::error::{LotError, LotResult};
use crate::fee::FeeCalculator;
use crate::store::{self, Layout};
use crate::validation::{
    normalize, validate_email, validate_license_plate, validate_name, validate_password,
    validate_phone, validate_vehicle_type,
};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

pub const VEHICLE_PREFIX: &str = "VH";
pub const OWNER_PREFIX: &str = "OWN";

/// One mutex guarding the whole lot, for callers that share it across threads.
pub type SharedLot = Arc<Mutex<Lot>>;

/// Vehicle and spot state captured before a session mutation.
struct SessionSnapshot {
    vehicles: Vec<Vehicle>,
    owners: Vec<Owner>,
    allocator: SpotAllocator,
}

pub struct Lot {
    config: LotConfig,
    fees: FeeCalculator,
    admins: Vec<Admin>,
    owners: Vec<Owner>,
    vehicles: Vec<Vehicle>,
    allocator: SpotAllocator,
    vehicle_ids: IdSequence,
    owner_ids: IdSequence,
}

impl Lot {
    // ========================================================================
    // STARTUP
    // ========================================================================

    /// Bootstrap the data directory and load every collection from disk.
    pub fn open(config: LotConfig) -> LotResult<Self> {
        store::bootstrap(&config.data_dir)?;

        let admins: Vec<Admin> = store::load(&config.admin_file(), Layout::Counted)?;
        for admin in admins.iter().filter(|a| a.password_digest.is_empty()) {
            warn!(admin = %admin.name, "admin record has no password, login disabled");
        }
        let owners: Vec<Owner> = store::load(&config.owner_file(), Layout::Counted)?;
        let vehicles: Vec<Vehicle> = store::load(&config.vehicle_file(), Layout::Counted)?;
        let spots: Vec<ParkingSpot> = store::load(&config.spot_file(), Layout::Plain)?;

        let mut lot = Self::from_parts(config, admins, owners, vehicles, spots);
        let repairs = lot.reconcile();
        if repairs > 0 {
            warn!(repairs, "vehicle and spot files disagreed, saving repaired state");
            lot.persist_sessions()?;
        }

        info!(
            spots = lot.allocator.capacity(),
            admins = lot.admins.len(),
            vehicles = lot.vehicles.len(),
            occupied = lot.allocator.occupied_count(),
            "lot opened"
        );
        Ok(lot)
    }

    fn from_parts(
        config: LotConfig,
        admins: Vec<Admin>,
        owners: Vec<Owner>,
        vehicles: Vec<Vehicle>,
        spots: Vec<ParkingSpot>,
    ) -> Self {
        let mut config = config;
        // parked vehicles keep their spot even if the lot was configured smaller
        let claimed = vehicles
            .iter()
            .filter(|v| v.parked)
            .map(|v| v.spot_number as usize)
            .max()
            .unwrap_or(0);
        if claimed > config.spot_count {
            warn!(
                configured = config.spot_count,
                claimed_spot = claimed,
                "parked vehicles beyond configured capacity, keeping their spots"
            );
        }
        let allocator = SpotAllocator::from_records(spots, config.spot_count.max(claimed));
        config.spot_count = allocator.capacity();
        let vehicle_ids = IdSequence::resume(VEHICLE_PREFIX, vehicles.iter().map(|v| v.id.as_str()));
        let owner_ids = IdSequence::resume(OWNER_PREFIX, owners.iter().map(|o| o.id.as_str()));

        Self {
            fees: FeeCalculator::new(config.rate_per_hour),
            config,
            admins,
            owners,
            vehicles,
            allocator,
            vehicle_ids,
            owner_ids,
        }
    }

    pub fn into_shared(self) -> SharedLot {
        Arc::new(Mutex::new(self))
    }

    /// Bring vehicles and spots back into agreement after a partial write.
    ///
    /// A vehicle that claims a spot gets it if the spot is free; otherwise its
    /// session is cleared. A spot bound to a vehicle that doesn't claim it is
    /// freed. Returns the number of records changed.
    fn reconcile(&mut self) -> usize {
        let mut repairs = 0;

        for index in 0..self.vehicles.len() {
            let vehicle = &self.vehicles[index];
            if !vehicle.parked {
                if vehicle.spot_number != 0 || vehicle.entry_time.is_some() {
                    warn!(vehicle = %vehicle.id, "clearing leftover session on unparked vehicle");
                    self.vehicles[index].clear_session();
                    repairs += 1;
                }
                continue;
            }

            let id = vehicle.id.clone();
            let number = vehicle.spot_number;
            let bound_here = self
                .allocator
                .get(number)
                .is_some_and(|spot| spot.occupied && spot.vehicle_id == id);
            if bound_here {
                continue;
            }

            let already_bound = self.allocator.spot_of(&id).map(|s| s.number);
            let free_here = self.allocator.get(number).is_some_and(|s| s.is_free());
            if already_bound.is_none() && free_here {
                let entry = self.vehicles[index].entry_time.unwrap_or_else(Utc::now);
                // spot checked free just above
                if self.allocator.occupy(number, &id, entry).is_ok() {
                    self.vehicles[index].entry_time = Some(entry);
                    warn!(vehicle = %id, spot = number, "rebinding spot from vehicle record");
                    repairs += 1;
                    continue;
                }
            }

            warn!(vehicle = %id, spot = number, "vehicle claims a spot it cannot hold, unparking");
            self.vehicles[index].clear_session();
            repairs += 1;
        }

        let stale: Vec<u32> = self
            .allocator
            .spots()
            .iter()
            .filter(|spot| spot.occupied || !spot.vehicle_id.is_empty())
            .filter(|spot| {
                !spot.occupied
                    || !self.vehicles.iter().any(|v| {
                        v.id == spot.vehicle_id && v.parked && v.spot_number == spot.number
                    })
            })
            .map(|spot| spot.number)
            .collect();

        for number in stale {
            warn!(spot = number, "freeing spot not claimed by any parked vehicle");
            if self.allocator.reset_binding(number).is_ok() {
                repairs += 1;
            }
        }

        repairs
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn config(&self) -> &LotConfig {
        &self.config
    }

    pub fn fees(&self) -> &FeeCalculator {
        &self.fees
    }

    pub fn admins(&self) -> &[Admin] {
        &self.admins
    }

    pub fn owners(&self) -> &[Owner] {
        &self.owners
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn spots(&self) -> &[ParkingSpot] {
        self.allocator.spots()
    }

    pub fn allocator(&self) -> &SpotAllocator {
        &self.allocator
    }

    pub fn find_vehicle(&self, vehicle_id: &str) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.id == vehicle_id)
    }

    pub fn owner_of(&self, vehicle_id: &str) -> Option<&Owner> {
        self.owners.iter().find(|o| o.vehicle_id == vehicle_id)
    }

    fn vehicle_index(&self, vehicle_id: &str) -> LotResult<usize> {
        self.vehicles
            .iter()
            .position(|v| v.id == vehicle_id)
            .ok_or_else(|| LotError::VehicleNotFound(vehicle_id.to_string()))
    }

    // ========================================================================
    // REGISTRATION
    // ========================================================================

    /// Register a vehicle together with its owner.
    pub fn register_vehicle(&mut self, new: NewVehicle) -> LotResult<Vehicle> {
        let new = NewVehicle {
            license_plate: normalize(&new.license_plate),
            vehicle_type: normalize(&new.vehicle_type),
            owner_name: normalize(&new.owner_name),
            owner_phone: normalize(&new.owner_phone),
        };
        validate_license_plate(&new.license_plate)?;
        validate_vehicle_type(&new.vehicle_type)?;
        validate_name(&new.owner_name)?;
        validate_phone(&new.owner_phone)?;

        if self.vehicles.len() >= self.config.max_vehicles {
            return Err(LotError::CapacityReached {
                what: "vehicles",
                limit: self.config.max_vehicles,
            });
        }

        let snapshot = self.snapshot();
        let ids = (self.vehicle_ids.clone(), self.owner_ids.clone());

        let vehicle = Vehicle::new(self.vehicle_ids.next_id(), &new);
        let owner_id = match self.config.owner_ids {
            OwnerIdScheme::Sequential => self.owner_ids.next_id(),
            OwnerIdScheme::Token => uuid::Uuid::new_v4().to_string(),
        };
        self.vehicles.push(vehicle.clone());
        self.owners.push(Owner::new(
            owner_id,
            new.owner_name.clone(),
            new.owner_phone.clone(),
            vehicle.id.clone(),
        ));

        if let Err(e) = self.persist_registrations() {
            self.rollback(snapshot);
            (self.vehicle_ids, self.owner_ids) = ids;
            return Err(e);
        }

        info!(vehicle = %vehicle.id, plate = %vehicle.license_plate, "vehicle registered");
        Ok(vehicle)
    }

    pub fn register_admin(&mut self, new: NewAdmin) -> LotResult<&Admin> {
        let new = NewAdmin {
            name: normalize(&new.name),
            phone: normalize(&new.phone),
            email: normalize(&new.email),
            password: new.password,
        };
        validate_name(&new.name)?;
        validate_phone(&new.phone)?;
        validate_email(&new.email)?;
        validate_password(&new.password)?;

        if self.admins.len() >= self.config.max_admins {
            return Err(LotError::CapacityReached {
                what: "admins",
                limit: self.config.max_admins,
            });
        }
        if self.admins.iter().any(|a| a.name == new.name) {
            return Err(LotError::AdminExists(new.name));
        }

        self.admins.push(Admin::new(&new));
        if let Err(e) = store::save(&self.admins, &self.config.admin_file(), Layout::Counted) {
            self.admins.pop();
            return Err(e);
        }

        info!(admin = %new.name, "admin registered");
        Ok(&self.admins[self.admins.len() - 1])
    }

    pub fn login(&self, name: &str, password: &str) -> LotResult<&Admin> {
        if self.admins.is_empty() {
            return Err(LotError::NoAdmins);
        }
        let name = normalize(name);
        match self.admins.iter().find(|a| a.name == name && a.verify(password)) {
            Some(admin) => {
                info!(admin = %admin.name, "admin logged in");
                Ok(admin)
            }
            None => {
                warn!(admin = %name, "failed login");
                Err(LotError::InvalidCredentials(name))
            }
        }
    }

    // ========================================================================
    // SESSION LIFECYCLE
    // ========================================================================

    pub fn park(&mut self, vehicle_id: &str) -> LotResult<u32> {
        self.park_at(vehicle_id, Utc::now())
    }

    /// Bind the vehicle to the lowest free spot, stamping `now` as entry time.
    pub fn park_at(&mut self, vehicle_id: &str, now: DateTime<Utc>) -> LotResult<u32> {
        let index = self.vehicle_index(vehicle_id)?;
        let vehicle = &self.vehicles[index];
        if vehicle.parked {
            return Err(LotError::AlreadyParked {
                vehicle_id: vehicle.id.clone(),
                spot: vehicle.spot_number,
            });
        }
        let number = self
            .allocator
            .find_available_spot()
            .ok_or(LotError::LotFull {
                capacity: self.allocator.capacity(),
            })?;

        let snapshot = self.snapshot();
        self.allocator.occupy(number, vehicle_id, now)?;
        self.vehicles[index].park(number, now);

        if let Err(e) = self.persist_sessions() {
            self.rollback(snapshot);
            return Err(e);
        }

        info!(vehicle = vehicle_id, spot = number, "vehicle parked");
        Ok(number)
    }

    pub fn unpark(&mut self, vehicle_id: &str) -> LotResult<f64> {
        self.unpark_at(vehicle_id, Utc::now())
    }

    /// End the vehicle's session at `now`, free its spot and return the fee.
    pub fn unpark_at(&mut self, vehicle_id: &str, now: DateTime<Utc>) -> LotResult<f64> {
        let index = self.vehicle_index(vehicle_id)?;
        let vehicle = &self.vehicles[index];
        if !vehicle.parked {
            return Err(LotError::NotParked(vehicle_id.to_string()));
        }
        let number = vehicle.spot_number;
        let entry = vehicle.entry_time.unwrap_or(now);
        let fee = self.fees.compute_fee(entry, now);

        let snapshot = self.snapshot();
        let applied = self
            .allocator
            .release(number)
            .and_then(|_| self.allocator.record_fee(number, fee));
        if let Err(e) = applied {
            self.restore(snapshot);
            return Err(e);
        }
        self.vehicles[index].clear_session();

        if let Err(e) = self.persist_sessions() {
            self.rollback(snapshot);
            return Err(e);
        }

        info!(vehicle = vehicle_id, spot = number, fee, "vehicle unparked");
        Ok(fee)
    }

    /// Remove a vehicle (and its owner record), freeing its spot first.
    pub fn delete_vehicle(&mut self, vehicle_id: &str) -> LotResult<Vehicle> {
        let index = self.vehicle_index(vehicle_id)?;
        let snapshot = self.snapshot();

        let vehicle = &self.vehicles[index];
        if vehicle.parked {
            let number = vehicle.spot_number;
            self.allocator.release(number)?;
            debug!(vehicle = vehicle_id, spot = number, "released spot of deleted vehicle");
        }
        let removed = self.vehicles.remove(index);
        self.owners.retain(|o| o.vehicle_id != removed.id);

        let saved = self
            .persist_registrations()
            .and_then(|_| self.persist_spots());
        if let Err(e) = saved {
            self.rollback(snapshot);
            return Err(e);
        }

        info!(vehicle = vehicle_id, "vehicle deleted");
        Ok(removed)
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            vehicles: self.vehicles.clone(),
            owners: self.owners.clone(),
            allocator: self.allocator.clone(),
        }
    }

    fn restore(&mut self, snapshot: SessionSnapshot) {
        self.vehicles = snapshot.vehicles;
        self.owners = snapshot.owners;
        self.allocator = snapshot.allocator;
    }

    /// Restore memory after a failed save and try to bring the files back
    /// in line with it; earlier files in the same save may already hold the
    /// new state. Whatever still disagrees is repaired on the next open.
    fn rollback(&mut self, snapshot: SessionSnapshot) {
        self.restore(snapshot);
        if let Err(e) = self.persist_registrations().and_then(|_| self.persist_spots()) {
            warn!(error = %e, "could not rewrite data files after failed save");
        }
    }

    fn persist_vehicles(&self) -> LotResult<()> {
        store::save(&self.vehicles, &self.config.vehicle_file(), Layout::Counted)
    }

    fn persist_spots(&self) -> LotResult<()> {
        store::save(self.allocator.spots(), &self.config.spot_file(), Layout::Plain)
    }

    fn persist_sessions(&self) -> LotResult<()> {
        self.persist_vehicles()?;
        self.persist_spots()
    }

    fn persist_registrations(&self) -> LotResult<()> {
        self.persist_vehicles()?;
        store::save(&self.owners, &self.config.owner_file(), Layout::Counted)
    }

    /// Write every collection to disk.
    pub fn save_all(&self) -> LotResult<()> {
        store::save(&self.admins, &self.config.admin_file(), Layout::Counted)?;
        self.persist_registrations()?;
        self.persist_spots()
    }
}

// ============================================================================
// TESTS
// ============================================================================
