//! CLI command definitions and their implementations.
//!
//! Every subcommand opens the lot from the data directory, runs one library
//! operation and prints the outcome. State lives only in the data files.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use lot_manager::config::{parse_rate, parse_spots};
use lot_manager::{Lot, LotConfig, LotStatus, NewAdmin, NewVehicle, Report};

/// lot-manager - parking spot allocation and fee tracking
#[derive(Parser)]
#[command(name = "lot-manager")]
#[command(version, about = "Parking lot spot allocation and fee tracking")]
#[command(long_about = r#"
Allocates parking spots to registered vehicles, prices each stay by the
started hour and keeps everything in pipe-delimited files under the data
directory (admin/, vehicles/, owners/, parking/, reports/).

EXIT CODES:
  0 - Success
  1 - General error
  2 - Not found
  3 - Conflict (already parked, lot full, duplicate)
  4 - Invalid input or state
  5 - File I/O failure
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory (default: LOT_DATA_DIR or the current directory)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Number of spots in the lot (default: LOT_SPOTS or 50)
    #[arg(long, global = true, value_parser = parse_spots)]
    pub spots: Option<usize>,

    /// Price per started hour (default: LOT_RATE or 100)
    #[arg(long, global = true, value_parser = parse_rate)]
    pub rate: Option<f64>,

    #[command(flatten)]
    pub auth: AdminAuth,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show occupancy per spot
    Status(OutputArgs),

    /// Generate a report and save it under reports/
    Report(OutputArgs),

    /// Manage administrators
    #[command(subcommand)]
    Admin(AdminCommand),

    /// Manage registered vehicles
    #[command(subcommand)]
    Vehicle(VehicleCommand),

    /// Park a vehicle in the lowest free spot
    Park {
        /// Vehicle id (e.g. VH0001)
        vehicle_id: String,
    },

    /// End a vehicle's session and print the fee
    Unpark {
        /// Vehicle id (e.g. VH0001)
        vehicle_id: String,
    },

    /// List vehicle owners
    Owners(OutputArgs),

    /// Open the terminal dashboard
    Ui,
}

/// Credentials checked before any command that changes lot state.
#[derive(Args)]
pub struct AdminAuth {
    /// Admin name for park, unpark, vehicle add/delete and ui
    #[arg(long, global = true, env = "LOT_ADMIN")]
    pub admin: Option<String>,

    #[arg(long, global = true, env = "LOT_ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,
}

impl Commands {
    /// Commands an admin has to be logged in for. Registering an admin stays
    /// open so the first one can be created.
    pub fn changes_state(&self) -> bool {
        matches!(
            self,
            Commands::Park { .. }
                | Commands::Unpark { .. }
                | Commands::Ui
                | Commands::Vehicle(VehicleCommand::Add { .. } | VehicleCommand::Delete { .. })
        )
    }
}

#[derive(Args)]
pub struct OutputArgs {
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum AdminCommand {
    /// Register a new administrator
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "LOT_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Check administrator credentials
    Login {
        #[arg(long)]
        name: String,
        #[arg(long, env = "LOT_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// List administrators
    List(OutputArgs),
}

#[derive(Subcommand)]
pub enum VehicleCommand {
    /// Register a vehicle and its owner
    Add {
        /// License plate (e.g. DHA-1234)
        #[arg(long)]
        plate: String,
        /// Car, Bike, Truck, Bus or any short tag
        #[arg(long = "type", default_value = "Car")]
        vehicle_type: String,
        #[arg(long)]
        owner: String,
        #[arg(long)]
        phone: String,
    },

    /// List registered vehicles
    List(OutputArgs),

    /// Delete a vehicle, freeing its spot if parked
    Delete {
        vehicle_id: String,
    },
}

impl Cli {
    /// Environment first, then command-line overrides.
    pub fn lot_config(&self) -> Result<LotConfig> {
        let mut config = LotConfig::from_env().context("invalid LOT_* environment")?;
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(spots) = self.spots {
            config.spot_count = spots;
        }
        if let Some(rate) = self.rate {
            config.rate_per_hour = rate;
        }
        debug!(?config, "resolved configuration");
        Ok(config)
    }
}

/// Log in with the global `--admin` / `--admin-password` pair.
pub fn require_admin(lot: &Lot, auth: &AdminAuth) -> Result<()> {
    let name = auth
        .admin
        .as_deref()
        .context("this command needs an admin: pass --admin and --admin-password (or LOT_ADMIN / LOT_ADMIN_PASSWORD)")?;
    let password = auth.admin_password.as_deref().unwrap_or_default();
    let admin = lot.login(name, password)?;
    debug!(admin = %admin.name, "admin authorized");
    Ok(())
}

pub fn open_lot(config: LotConfig) -> Result<Lot> {
    let dir = config.data_dir.display().to_string();
    Lot::open(config).with_context(|| format!("failed to open lot at {}", dir))
}

// ============================================================================
// COMMANDS
// ============================================================================

pub fn status(lot: &Lot, args: OutputArgs) -> Result<()> {
    let status = LotStatus::capture(lot, Utc::now());
    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("🅿️  {}", status.summary());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for row in &status.spots {
        match (&row.vehicle_id, row.hours_parked) {
            (Some(vehicle), hours) => println!(
                "  #{:<4} 🚗 {:<8} {:<10} {:>6.2}h",
                row.number,
                vehicle,
                row.license_plate.as_deref().unwrap_or("?"),
                hours.unwrap_or(0.0)
            ),
            (None, _) => println!("  #{:<4} ✓ free", row.number),
        }
    }
    Ok(())
}

pub fn report(lot: &Lot, args: OutputArgs) -> Result<()> {
    let report = Report::generate(lot, Utc::now());
    let path = report
        .write_to(&lot.config().reports_dir())
        .context("failed to save report")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render());
        println!("\n💾 Saved to {}", path.display());
    }
    Ok(())
}

pub fn admin(lot: &mut Lot, command: AdminCommand) -> Result<()> {
    match command {
        AdminCommand::Register {
            name,
            phone,
            email,
            password,
        } => {
            let admin = lot.register_admin(NewAdmin {
                name,
                phone,
                email,
                password,
            })?;
            println!("✅ Admin registered: {}", admin.name);
        }
        AdminCommand::Login { name, password } => {
            let admin = lot.login(&name, &password)?;
            println!("✅ Welcome, {} ({})", admin.name, admin.email);
        }
        AdminCommand::List(args) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(lot.admins())?);
                return Ok(());
            }
            println!("👥 {} admin(s)", lot.admins().len());
            for admin in lot.admins() {
                println!("  {:<20} {:<12} {}", admin.name, admin.phone, admin.email);
            }
        }
    }
    Ok(())
}

pub fn vehicle(lot: &mut Lot, command: VehicleCommand) -> Result<()> {
    match command {
        VehicleCommand::Add {
            plate,
            vehicle_type,
            owner,
            phone,
        } => {
            let vehicle = lot.register_vehicle(NewVehicle {
                license_plate: plate,
                vehicle_type,
                owner_name: owner,
                owner_phone: phone,
            })?;
            println!(
                "✅ Registered {} ({}, {})",
                vehicle.id,
                vehicle.license_plate,
                vehicle.vehicle_type.as_str()
            );
        }
        VehicleCommand::List(args) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(lot.vehicles())?);
                return Ok(());
            }
            println!("🚗 {} vehicle(s)", lot.vehicles().len());
            for v in lot.vehicles() {
                let state = if v.parked {
                    format!("spot #{}", v.spot_number)
                } else {
                    "not parked".to_string()
                };
                println!(
                    "  {:<8} {:<10} {:<8} {:<20} {}",
                    v.id,
                    v.license_plate,
                    v.vehicle_type.as_str(),
                    v.owner_name,
                    state
                );
            }
        }
        VehicleCommand::Delete { vehicle_id } => {
            let removed = lot.delete_vehicle(&vehicle_id)?;
            println!("🗑️  Deleted {} ({})", removed.id, removed.license_plate);
        }
    }
    Ok(())
}

pub fn park(lot: &mut Lot, vehicle_id: &str) -> Result<()> {
    let spot = lot.park(vehicle_id)?;
    println!("🅿️  {} parked in spot #{}", vehicle_id, spot);
    Ok(())
}

pub fn unpark(lot: &mut Lot, vehicle_id: &str) -> Result<()> {
    let fee = lot.unpark(vehicle_id)?;
    println!(
        "👋 {} left the lot. Fee: {:.2} {}",
        vehicle_id,
        fee,
        lot.config().currency
    );
    Ok(())
}

pub fn owners(lot: &Lot, args: OutputArgs) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(lot.owners())?);
        return Ok(());
    }
    println!("👤 {} owner(s)", lot.owners().len());
    for owner in lot.owners() {
        println!(
            "  {:<10} {:<20} {:<12} {}",
            owner.id, owner.name, owner.phone, owner.vehicle_id
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use lot_manager::LotError;
    use tempfile::tempdir;

    fn lot_with_admin(dir: &std::path::Path) -> Lot {
        let mut lot = Lot::open(LotConfig::new(dir)).unwrap();
        lot.register_admin(NewAdmin {
            name: "Sadia".to_string(),
            phone: "01711111111".to_string(),
            email: "sadia@gmail.com".to_string(),
            password: "s3cretpass".to_string(),
        })
        .unwrap();
        lot
    }

    fn auth(admin: Option<&str>, password: Option<&str>) -> AdminAuth {
        AdminAuth {
            admin: admin.map(str::to_string),
            admin_password: password.map(str::to_string),
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_state_changing_commands() {
        let park = Cli::try_parse_from(["lot-manager", "park", "VH0001"]).unwrap();
        assert!(park.command.changes_state());

        let delete = Cli::try_parse_from(["lot-manager", "vehicle", "delete", "VH0001"]).unwrap();
        assert!(delete.command.changes_state());

        let status = Cli::try_parse_from(["lot-manager", "status", "--json"]).unwrap();
        assert!(!status.command.changes_state());

        let list = Cli::try_parse_from(["lot-manager", "vehicle", "list"]).unwrap();
        assert!(!list.command.changes_state());
    }

    #[test]
    fn test_global_admin_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "lot-manager",
            "unpark",
            "VH0001",
            "--admin",
            "Sadia",
            "--admin-password",
            "s3cretpass",
        ])
        .unwrap();
        assert_eq!(cli.auth.admin.as_deref(), Some("Sadia"));
    }

    #[test]
    fn test_require_admin() {
        let dir = tempdir().unwrap();
        let lot = lot_with_admin(dir.path());

        assert!(require_admin(&lot, &auth(Some("Sadia"), Some("s3cretpass"))).is_ok());
        assert!(require_admin(&lot, &auth(None, Some("s3cretpass"))).is_err());

        let err = require_admin(&lot, &auth(Some("Sadia"), None)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LotError>(),
            Some(LotError::InvalidCredentials(_))
        ));
    }

    #[test]
    fn test_require_admin_without_registered_admins() {
        let dir = tempdir().unwrap();
        let lot = Lot::open(LotConfig::new(dir.path())).unwrap();
        let err = require_admin(&lot, &auth(Some("Sadia"), Some("s3cretpass"))).unwrap_err();
        assert!(matches!(err.downcast_ref::<LotError>(), Some(LotError::NoAdmins)));
    }
}
