use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tire_swing_core::{
    HeadlessWorld, RenderWorld, RiderEvent, Scheduler, Stage, SwingConfig, SwingController,
    SwingError, TickOutcome, TickReport,
};
use tracing_subscriber::EnvFilter;

fn main() -> tire_swing_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            config,
            dismount_at,
            max_ticks,
            trace,
        } => run_simulation(config.as_deref(), dismount_at, max_ticks, trace.as_deref()),
        Commands::DefaultConfig { output } => write_default_config(output.as_deref()),
        Commands::CheckConfig { config } => check_config(&config),
    }
}

fn load_config(path: Option<&Path>) -> tire_swing_core::Result<SwingConfig> {
    match path {
        Some(path) => {
            tracing::info!(?path, "loading swing configuration");
            SwingConfig::from_path(path)
        }
        None => Ok(SwingConfig::default()),
    }
}

fn run_simulation(
    config: Option<&Path>,
    dismount_at: u64,
    max_ticks: u64,
    trace: Option<&Path>,
) -> tire_swing_core::Result<()> {
    let config = load_config(config)?;
    let controller = SwingController::new(config)?;
    let mut stage = Stage::new(controller, HeadlessWorld::new());
    let mut scheduler = Scheduler::new();
    stage.spawn()?;

    let rider = stage.world.spawn_actor(stage.controller.location());
    let target = stage
        .controller
        .interaction()
        .ok_or(SwingError::NotSpawned)?;
    stage.handle(RiderEvent::Interact { rider, target }, &mut scheduler)?;
    tracing::info!(%rider, dismount_at, max_ticks, "running headless ride");

    let mut reports: Vec<TickReport> = Vec::new();
    while scheduler.current_tick() < max_ticks && !scheduler.is_idle() {
        if scheduler.current_tick() == dismount_at {
            if let Some(pivot) = stage.controller.pivot() {
                stage.world.detach(pivot, rider)?;
            }
            stage.handle(RiderEvent::Dismount { rider }, &mut scheduler)?;
        }
        scheduler.tick(&mut stage);
        if let Some(report) = stage.controller.last_report() {
            reports.push(report);
        }
    }

    summarise(&reports);

    if let Some(path) = trace {
        let json = serde_json::to_string_pretty(&reports)?;
        std::fs::write(path, json)?;
        tracing::info!(?path, ticks = reports.len(), "wrote tick trace");
    }

    stage.shutdown();
    Ok(())
}

fn summarise(reports: &[TickReport]) {
    let peak = reports
        .iter()
        .map(|report| report.state.angle.abs())
        .fold(0.0_f64, f64::max);

    match reports.last() {
        Some(last) if last.outcome == TickOutcome::Settled => tracing::info!(
            ticks = reports.len(),
            peak_degrees = peak.to_degrees(),
            "swing settled"
        ),
        Some(last) if last.outcome == TickOutcome::Aborted => {
            tracing::warn!(ticks = reports.len(), "swing aborted")
        }
        Some(last) => tracing::info!(
            ticks = reports.len(),
            phase = ?last.phase,
            angle_degrees = last.state.angle.to_degrees(),
            peak_degrees = peak.to_degrees(),
            "tick budget exhausted while still swinging"
        ),
        None => tracing::warn!("the swing never ticked"),
    }
}

fn write_default_config(output: Option<&Path>) -> tire_swing_core::Result<()> {
    let json = SwingConfig::default().to_json_pretty()?;
    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            tracing::info!(?path, "wrote default configuration");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn check_config(path: &Path) -> tire_swing_core::Result<()> {
    let config = SwingConfig::from_path(path)?;
    tracing::info!(
        world = %config.world,
        rotational = config.models.rotational.len(),
        rope = config.models.rope.len(),
        still = config.models.still.len(),
        radius = config.fulcrum.radius,
        "configuration is valid"
    );
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless driver for the tire swing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Spawn the swing, put a rider on it and run until it comes to rest.
    Simulate {
        /// Swing configuration; the built-in swing is used when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Tick at which the rider gets off.
        #[arg(long, default_value_t = 40)]
        dismount_at: u64,
        /// Upper bound on simulated ticks.
        #[arg(long, default_value_t = 2_000)]
        max_ticks: u64,
        /// Write every tick report to this file as JSON.
        #[arg(long)]
        trace: Option<PathBuf>,
    },
    /// Print the built-in configuration, or write it to a file.
    DefaultConfig {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Load a configuration file and report whether it is usable.
    CheckConfig {
        config: PathBuf,
    },
}
