//! End-to-end lot lifecycle over real data files.

use chrono::{DateTime, Duration, TimeZone, Utc};
use lot_manager::{ErrorKind, Lot, LotConfig, LotError, NewVehicle, Report};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
}

fn config(dir: &Path, spots: usize) -> LotConfig {
    LotConfig::new(dir).with_spots(spots)
}

fn register(lot: &mut Lot, plate: &str) -> String {
    lot.register_vehicle(NewVehicle {
        license_plate: plate.to_string(),
        vehicle_type: "Car".to_string(),
        owner_name: "Farhana Akter".to_string(),
        owner_phone: "01912345678".to_string(),
    })
    .unwrap()
    .id
}

#[test]
fn test_two_spot_lot_scenario() {
    let dir = tempdir().unwrap();
    let mut lot = Lot::open(config(dir.path(), 2)).unwrap();
    let a = register(&mut lot, "DHA-1001");
    let b = register(&mut lot, "DHA-1002");
    let c = register(&mut lot, "DHA-1003");

    assert_eq!(lot.park_at(&a, t0()).unwrap(), 1);
    assert_eq!(lot.park_at(&b, t0()).unwrap(), 2);

    let before = (lot.vehicles().to_vec(), lot.spots().to_vec());
    let err = lot.park_at(&c, t0()).unwrap_err();
    assert!(matches!(err, LotError::LotFull { capacity: 2 }));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!((lot.vehicles().to_vec(), lot.spots().to_vec()), before);

    let fee = lot.unpark_at(&a, t0() + Duration::minutes(90)).unwrap();
    assert_eq!(fee, 200.0);
    assert_eq!(lot.park_at(&c, t0() + Duration::hours(2)).unwrap(), 1);

    let spot = &lot.spots()[0];
    assert_eq!(spot.vehicle_id, c);
    assert_eq!(spot.last_fee, 0.0);
}

#[test]
fn test_state_survives_reopen() {
    let dir = tempdir().unwrap();
    {
        let mut lot = Lot::open(config(dir.path(), 3)).unwrap();
        let a = register(&mut lot, "CTG-2001");
        let b = register(&mut lot, "CTG-2002");
        lot.park_at(&a, t0()).unwrap();
        lot.park_at(&b, t0()).unwrap();
        lot.unpark_at(&a, t0() + Duration::hours(3)).unwrap();
    }

    let lot = Lot::open(config(dir.path(), 3)).unwrap();
    let b = lot.find_vehicle("VH0002").unwrap();
    assert!(b.parked);
    assert_eq!(b.spot_number, 2);
    assert_eq!(b.entry_time, Some(t0()));

    let released = &lot.spots()[0];
    assert!(!released.occupied);
    assert_eq!(released.last_fee, 300.0);
    assert_eq!(released.entry_time, Some(t0()));
    assert_eq!(lot.owners().len(), 2);
}

#[test]
fn test_reopen_repairs_disagreeing_files() {
    let dir = tempdir().unwrap();
    let cfg = config(dir.path(), 3);
    {
        let mut lot = Lot::open(cfg.clone()).unwrap();
        let a = register(&mut lot, "SYL-3001");
        lot.park_at(&a, t0()).unwrap();
    }

    // spot write lost for VH0001, and spot 3 bound to a vehicle nobody knows
    let entry = t0().timestamp();
    fs::write(
        cfg.spot_file(),
        format!("1|0||0|0.00\n2|0||0|0.00\n3|1|VH0099|{}|0.00\n", entry),
    )
    .unwrap();

    let lot = Lot::open(cfg.clone()).unwrap();
    let spot1 = &lot.spots()[0];
    assert!(spot1.occupied);
    assert_eq!(spot1.vehicle_id, "VH0001");
    assert_eq!(spot1.entry_time, Some(t0()));
    assert!(!lot.spots()[2].occupied);
    assert!(lot.spots()[2].vehicle_id.is_empty());

    let on_disk = fs::read_to_string(cfg.spot_file()).unwrap();
    assert!(on_disk.starts_with(&format!("1|1|VH0001|{}|", entry)));
    assert!(on_disk.contains("3|0||"));
}

#[test]
fn test_vehicle_claiming_taken_spot_is_unparked() {
    let dir = tempdir().unwrap();
    let cfg = config(dir.path(), 2);
    fs::create_dir_all(cfg.vehicle_file().parent().unwrap()).unwrap();
    fs::create_dir_all(cfg.spot_file().parent().unwrap()).unwrap();
    fs::write(
        cfg.vehicle_file(),
        "2\nVH0001|AB-12|Jamal|Car|1|1|01711111111|1700000000\n\
         VH0002|AB-13|Kamal|Bike|1|1|01722222222|1700000100\n",
    )
    .unwrap();
    fs::write(cfg.spot_file(), "1|1|VH0001|1700000000|0.00\n2|0||0|0.00\n").unwrap();

    let lot = Lot::open(cfg).unwrap();
    assert!(lot.find_vehicle("VH0001").unwrap().parked);
    let loser = lot.find_vehicle("VH0002").unwrap();
    assert!(!loser.parked);
    assert_eq!(loser.spot_number, 0);
    assert_eq!(lot.allocator().occupied_count(), 1);
}

#[test]
fn test_truncated_vehicle_file_loads_partially() {
    let dir = tempdir().unwrap();
    let cfg = config(dir.path(), 2);
    fs::create_dir_all(cfg.vehicle_file().parent().unwrap()).unwrap();
    fs::write(
        cfg.vehicle_file(),
        "3\nVH0004|AB-12|Jamal|Car|0|0|01711111111|0\n",
    )
    .unwrap();

    let mut lot = Lot::open(cfg).unwrap();
    assert_eq!(lot.vehicles().len(), 1);

    // ids continue after the highest one on disk
    let next = register(&mut lot, "AB-14");
    assert_eq!(next, "VH0005");
}

#[test]
fn test_delete_parked_vehicle_frees_spot_on_disk() {
    let dir = tempdir().unwrap();
    let cfg = config(dir.path(), 2);
    let mut lot = Lot::open(cfg.clone()).unwrap();
    let a = register(&mut lot, "RAJ-4001");
    let b = register(&mut lot, "RAJ-4002");
    lot.park_at(&a, t0()).unwrap();

    lot.delete_vehicle(&a).unwrap();
    drop(lot);

    let lot = Lot::open(cfg).unwrap();
    assert_eq!(lot.vehicles().len(), 1);
    assert_eq!(lot.vehicles()[0].id, b);
    assert!(lot.owner_of(&a).is_none());
    assert_eq!(lot.allocator().find_available_spot(), Some(1));
}

#[test]
fn test_report_file_lands_in_reports_dir() {
    let dir = tempdir().unwrap();
    let mut lot = Lot::open(config(dir.path(), 2)).unwrap();
    let a = register(&mut lot, "KHU-5001");
    lot.park_at(&a, t0()).unwrap();

    let report = Report::generate(&lot, t0() + Duration::minutes(10));
    let path = report.write_to(&lot.config().reports_dir()).unwrap();

    assert!(path.starts_with(dir.path().join("reports")));
    let text = fs::read_to_string(path).unwrap();
    assert!(text.contains("KHU-5001"));
    assert!(text.contains("Occupied:            1"));
}
