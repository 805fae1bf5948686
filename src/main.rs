//! CLI Entry Point for sensor-monitor
//!
//! Provides command-line interface for:
//! - Running the monitor (simulated hardware) until Ctrl+C / SIGTERM
//! - Listing recorded session files
//! - Checking a configuration file
//!
//! # Usage
//!
//! Record and monitor:
//! ```bash
//! sensor-monitor run --mode RDM
//! ```
//!
//! List sessions:
//! ```bash
//! sensor-monitor sessions --dir data
//! ```

use chrono::Local;
use clap::{Args, Parser, Subcommand};
use sensor_monitor::config::{Settings, DEFAULT_CONFIG_PATH};
use sensor_monitor::hardware::simulated::{LoggingActuators, SimulatedAdc, SimulatedEcho};
use sensor_monitor::hardware::{AdcPotentiometer, EchoRangefinder};
use sensor_monitor::session::{list_sessions, read_session};
use sensor_monitor::{logging, AppResult, Mode, MonitorError, MonitorSession, Scheduler};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "sensor-monitor")]
#[command(about = "Potentiometer and ultrasonic monitor with session recording", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sampling loop until interrupted
    Run(RunArgs),

    /// List recorded session files with their row counts
    Sessions {
        /// Session directory (defaults to storage.output_dir)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },

    /// Load and validate a configuration file
    CheckConfig {
        /// Configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Operating mode: MS, RDM or ORD
    #[arg(long)]
    mode: Option<Mode>,

    /// Session directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Stop after this many base ticks
    #[arg(long)]
    ticks: Option<u64>,
}

impl RunArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(mode) = self.mode {
            settings.mode = mode;
        }
        if let Some(dir) = &self.output_dir {
            settings.storage.output_dir = dir.clone();
        }
        if let Some(level) = &self.log_level {
            settings.log_level = level.clone();
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => run_monitor(args).await,
        Commands::Sessions { dir, config } => show_sessions(dir, config),
        Commands::CheckConfig { config } => check_config(config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Fatal error");
            eprintln!("error: {}", e);
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

async fn run_monitor(args: RunArgs) -> AppResult<()> {
    let mut settings = Settings::load_from(&args.config)?;
    args.apply(&mut settings);
    settings.validate()?;
    logging::init_from_settings(&settings).map_err(MonitorError::Config)?;

    info!(
        mode = %settings.mode,
        config = %args.config.display(),
        "Starting sensor monitor with simulated hardware"
    );

    let divisor = settings.calibration.ultrasonic_divisor;
    let potentiometer = Arc::new(AdcPotentiometer::new(SimulatedAdc::default()));
    let rangefinder = Arc::new(EchoRangefinder::new(SimulatedEcho::new(divisor), divisor));
    let actuators = Arc::new(LoggingActuators::from_settings(&settings));

    let session = MonitorSession::open(&settings, actuators, Local::now())?;
    let mut scheduler = Scheduler::new(session, potentiometer, rangefinder, &settings.timing);

    let summary = match args.ticks {
        Some(ticks) => scheduler.run_ticks(ticks).await?,
        None => scheduler.run_until(shutdown_signal()).await?,
    };

    if let Some(session) = &summary.session {
        info!(path = %session.path.display(), rows = session.rows, "Session saved");
    }
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

fn show_sessions(dir: Option<PathBuf>, config: PathBuf) -> AppResult<()> {
    let dir = match dir {
        Some(dir) => dir,
        None => Settings::load_from(&config)?.storage.output_dir,
    };

    let sessions = list_sessions(&dir)?;
    if sessions.is_empty() {
        println!("No sessions in {}", dir.display());
        return Ok(());
    }

    for path in sessions {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match read_session(&path) {
            Ok(rows) => println!("{}\t{} rows", name, rows.len()),
            Err(e) => println!("{}\tunreadable ({})", name, e),
        }
    }
    Ok(())
}

fn check_config(config: PathBuf) -> AppResult<()> {
    let settings = Settings::load_from(&config)?;
    settings.validate()?;

    let rendered =
        toml::to_string_pretty(&settings).map_err(|e| MonitorError::Config(e.to_string()))?;
    println!("# {} is valid", config.display());
    println!("{}", rendered);
    Ok(())
}
