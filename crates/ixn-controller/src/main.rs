//! ixn-controller command line entry point.
//!
//! Offline tooling around the driver: dry-run port planning against an
//! exported reservation, statistics rendering and delivery, and config
//! validation.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use ixn_controller::reconcile::fetch_reservation_ports;
use ixn_controller::statistics::deliver_statistics;
use ixn_controller::{
    format_statistics, format_statistics_as, reconcile, DriverConfig, ReservationSnapshot,
    StatisticsDelivery, DEFAULT_CONFIG_PATH,
};
use tgn_common::{LogicalPort, OutputKind, StatisticsTable};

/// CloudShell IxNetwork controller driver
#[derive(Parser, Debug)]
#[command(name = "ixn-controller")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show how configuration ports would be bound to a reservation
    PlanPorts {
        /// File with one configuration port name per line
        #[arg(short = 'p', long)]
        ports: PathBuf,

        /// Reservation snapshot (JSON)
        #[arg(short = 'r', long)]
        reservation: PathBuf,

        /// Driver configuration file
        #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },

    /// Render a statistics table as JSON or CSV
    FormatStats {
        /// Statistics table (JSON)
        #[arg(short = 'i', long)]
        input: PathBuf,

        /// Output kind (json, csv)
        #[arg(short = 'o', long, default_value = "csv")]
        output_kind: String,
    },

    /// Render a statistics table and deliver it to a reservation snapshot
    DeliverStats {
        /// Statistics table (JSON)
        #[arg(short = 'i', long)]
        input: PathBuf,

        /// Statistics view the table was read from
        #[arg(short = 'v', long)]
        view: String,

        /// Output kind (json, csv)
        #[arg(short = 'o', long, default_value = "csv")]
        output_kind: String,

        /// Reservation snapshot (JSON)
        #[arg(short = 'r', long)]
        reservation: PathBuf,

        /// Directory receiving attachments
        #[arg(short = 'u', long)]
        upload_dir: Option<PathBuf>,

        /// Driver configuration file
        #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },

    /// Validate a driver configuration file and print the effective values
    CheckConfig {
        /// Driver configuration file
        #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
}

/// Initialize tracing/logging.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn read_port_names(path: &Path) -> Result<Vec<LogicalPort>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read port list {}", path.display()))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .enumerate()
        .map(|(i, name)| LogicalPort::new(name, format!("vport:{}", i + 1)))
        .collect())
}

async fn plan_ports(ports: &Path, reservation: &Path, config: &Path) -> Result<()> {
    let config = DriverConfig::load_or_default(config)?;
    let logical_ports = read_port_names(ports)?;
    if logical_ports.is_empty() {
        bail!("No port names in {}", ports.display());
    }

    let snapshot = ReservationSnapshot::load(reservation)
        .with_context(|| format!("Failed to load reservation {}", reservation.display()))?;
    let reservation_ports =
        fetch_reservation_ports(&snapshot, snapshot.reservation_id(), &config.reservation).await?;
    info!(
        "Reservation {} has {} traffic generator ports",
        snapshot.reservation_id(),
        reservation_ports.len()
    );

    for binding in reconcile(&logical_ports, &reservation_ports)? {
        println!("{}\t{}", binding.logical_name, binding.physical_address);
    }
    Ok(())
}

fn read_table(input: &Path) -> Result<StatisticsTable> {
    let content = fs::read_to_string(input)
        .with_context(|| format!("Failed to read statistics {}", input.display()))?;
    let table: StatisticsTable = serde_json::from_str(&content)
        .with_context(|| format!("Invalid statistics table in {}", input.display()))?;

    if table.is_empty() {
        warn!("Statistics table {} has no rows", input.display());
    }
    Ok(table)
}

fn format_stats(input: &Path, output_kind: &str) -> Result<()> {
    let table = read_table(input)?;
    println!("{}", format_statistics_as(&table, output_kind)?);
    Ok(())
}

async fn deliver_stats(
    input: &Path,
    view: &str,
    output_kind: &str,
    reservation: &Path,
    upload_dir: Option<&Path>,
    config: &Path,
) -> Result<()> {
    let config = DriverConfig::load_or_default(config)?;
    let kind: OutputKind = output_kind.parse()?;
    let content = format_statistics(&read_table(input)?, kind)?;

    let mut snapshot = ReservationSnapshot::load(reservation)
        .with_context(|| format!("Failed to load reservation {}", reservation.display()))?;
    if let Some(dir) = upload_dir {
        snapshot = snapshot.with_upload_dir(dir);
    }

    let delivery = config.statistics.delivery;
    deliver_statistics(
        &snapshot,
        delivery,
        snapshot.reservation_id(),
        view,
        kind,
        &content,
    )
    .await?;

    // Output messages only live in memory
    if delivery == StatisticsDelivery::Output {
        for message in snapshot.messages() {
            println!("{}", message);
        }
    }
    Ok(())
}

fn check_config(path: &Path) -> Result<()> {
    let config = DriverConfig::load_or_default(path)?;
    let rendered = toml::to_string_pretty(&config).context("Failed to render configuration")?;

    info!("Configuration {} is valid", path.display());
    print!("{}", rendered);
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    match args.command {
        Command::PlanPorts {
            ports,
            reservation,
            config,
        } => plan_ports(&ports, &reservation, &config).await,
        Command::FormatStats { input, output_kind } => format_stats(&input, &output_kind),
        Command::DeliverStats {
            input,
            view,
            output_kind,
            reservation,
            upload_dir,
            config,
        } => {
            deliver_stats(
                &input,
                &view,
                &output_kind,
                &reservation,
                upload_dir.as_deref(),
                &config,
            )
            .await
        }
        Command::CheckConfig { config } => check_config(&config),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
