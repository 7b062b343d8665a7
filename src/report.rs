// 📊 Reporting - read-only views over the lot
//
// LotStatus is the live occupancy picture; Report adds money and counts and
// can be rendered to text or saved under reports/report_<epoch>.txt.

use crate::error::{LotError, LotResult};
use crate::fee::FeeCalculator;
use crate::lot::Lot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

// ============================================================================
// LOT STATUS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotRow {
    pub number: u32,
    pub occupied: bool,
    pub vehicle_id: Option<String>,
    pub license_plate: Option<String>,
    /// Fractional hours since entry, occupied spots only
    pub hours_parked: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotStatus {
    pub captured_at: DateTime<Utc>,
    pub total: usize,
    pub occupied: usize,
    pub available: usize,
    /// 0.0..=1.0
    pub occupancy_rate: f64,
    pub spots: Vec<SpotRow>,
}

impl LotStatus {
    pub fn capture(lot: &Lot, now: DateTime<Utc>) -> Self {
        let allocator = lot.allocator();
        let total = allocator.capacity();
        let occupied = allocator.occupied_count();

        let spots = allocator
            .spots()
            .iter()
            .map(|spot| {
                if !spot.occupied {
                    return SpotRow {
                        number: spot.number,
                        occupied: false,
                        vehicle_id: None,
                        license_plate: None,
                        hours_parked: None,
                    };
                }
                let plate = lot
                    .find_vehicle(&spot.vehicle_id)
                    .map(|v| v.license_plate.clone());
                SpotRow {
                    number: spot.number,
                    occupied: true,
                    vehicle_id: Some(spot.vehicle_id.clone()),
                    license_plate: plate,
                    hours_parked: spot
                        .entry_time
                        .map(|entry| FeeCalculator::hours_parked(entry, now)),
                }
            })
            .collect();

        LotStatus {
            captured_at: now,
            total,
            occupied,
            available: total - occupied,
            occupancy_rate: if total == 0 {
                0.0
            } else {
                occupied as f64 / total as f64
            },
            spots,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} spots: {} occupied, {} available ({:.1}% full)",
            self.total,
            self.occupied,
            self.available,
            self.occupancy_rate * 100.0
        )
    }
}

// ============================================================================
// REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkedRow {
    pub vehicle_id: String,
    pub license_plate: String,
    pub vehicle_type: String,
    pub owner_name: String,
    pub spot_number: u32,
    pub entry_time: Option<DateTime<Utc>>,
    /// Fee if the session ended at report time
    pub fee_so_far: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub status: LotStatus,
    pub registered_vehicles: usize,
    pub registered_admins: usize,
    pub rate_per_hour: f64,
    pub currency: String,
    /// Sum of `fee_so_far` over every active session
    pub estimated_revenue: f64,
    pub parked: Vec<ParkedRow>,
}

impl Report {
    pub fn generate(lot: &Lot, now: DateTime<Utc>) -> Self {
        let fees = lot.fees();
        let parked: Vec<ParkedRow> = lot
            .vehicles()
            .iter()
            .filter(|v| v.parked)
            .map(|v| ParkedRow {
                vehicle_id: v.id.clone(),
                license_plate: v.license_plate.clone(),
                vehicle_type: v.vehicle_type.as_str().to_string(),
                owner_name: v.owner_name.clone(),
                spot_number: v.spot_number,
                entry_time: v.entry_time,
                fee_so_far: fees.compute_fee(v.entry_time.unwrap_or(now), now),
            })
            .collect();

        Report {
            generated_at: now,
            status: LotStatus::capture(lot, now),
            registered_vehicles: lot.vehicles().len(),
            registered_admins: lot.admins().len(),
            rate_per_hour: fees.rate_per_hour,
            currency: lot.config().currency.clone(),
            estimated_revenue: parked.iter().map(|row| row.fee_so_far).sum(),
            parked,
        }
    }

    /// Plain-text rendering, the same text `write_to` saves.
    pub fn render(&self) -> String {
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = writeln!(out, "PARKING LOT REPORT");
        let _ = writeln!(out, "==================");
        let _ = writeln!(
            out,
            "Generated: {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "Total spots:         {}", self.status.total);
        let _ = writeln!(out, "Occupied:            {}", self.status.occupied);
        let _ = writeln!(out, "Available:           {}", self.status.available);
        let _ = writeln!(
            out,
            "Occupancy:           {:.1}%",
            self.status.occupancy_rate * 100.0
        );
        let _ = writeln!(out, "Registered vehicles: {}", self.registered_vehicles);
        let _ = writeln!(out, "Registered admins:   {}", self.registered_admins);
        let _ = writeln!(
            out,
            "Hourly rate:         {:.2} {}",
            self.rate_per_hour, self.currency
        );
        let _ = writeln!(
            out,
            "Estimated revenue:   {:.2} {}",
            self.estimated_revenue, self.currency
        );
        let _ = writeln!(out);

        if self.parked.is_empty() {
            let _ = writeln!(out, "No vehicles parked.");
            return out;
        }

        let _ = writeln!(
            out,
            "{:<6} {:<8} {:<10} {:<8} {:<20} {:<17} {:>9} {:>10}",
            "Spot", "Vehicle", "Plate", "Type", "Owner", "Entry", "Duration", "Fee"
        );
        for row in &self.parked {
            let entry = row
                .entry_time
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string());
            let duration = row
                .entry_time
                .map(|t| format!("{:.2}h", FeeCalculator::hours_parked(t, self.generated_at)))
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(
                out,
                "{:<6} {:<8} {:<10} {:<8} {:<20} {:<17} {:>9} {:>10.2}",
                row.spot_number,
                row.vehicle_id,
                row.license_plate,
                row.vehicle_type,
                row.owner_name,
                entry,
                duration,
                row.fee_so_far
            );
        }
        out
    }

    /// Save the rendered report as `report_<epoch>.txt` inside `dir`.
    pub fn write_to(&self, dir: &Path) -> LotResult<PathBuf> {
        std::fs::create_dir_all(dir).map_err(|e| LotError::io(dir, e))?;
        let path = dir.join(format!("report_{}.txt", self.generated_at.timestamp()));
        std::fs::write(&path, self.render()).map_err(|e| LotError::io(&path, e))?;
        info!(path = %path.display(), "report written");
        Ok(path)
    }
}

// ============================================================================
// TESTS
// ============================================================================
