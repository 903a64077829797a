mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pylon_camera::PylonCamera;
use std::path::PathBuf;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "pylon-cam", about = "Basler Pylon camera parameter tool")]
struct Cli {
    /// Camera model profile to simulate (see `models`)
    #[arg(short, long, global = true)]
    model: Option<String>,
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List embedded camera model profiles
    Models,
    /// Apply startup settings (user set, trigger, auto limits, packet timing)
    Startup,
    /// Set exposure time in microseconds
    Exposure {
        microseconds: f64,
    },
    /// Set gain as a fraction of the camera's gain range (0.0 - 1.0)
    Gain {
        fraction: f64,
    },
    /// Set gamma
    Gamma {
        value: f64,
    },
    /// Set auto target brightness (0 - 255)
    Brightness {
        value: f64,
    },
    /// Program the exposure sequencer, one set per exposure time in seconds
    Sequencer {
        #[arg(required = true)]
        seconds: Vec<f64>,
    },
    /// Print current camera parameters as JSON
    Info,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(model) = cli.model {
        config.model = model;
    }
    tracing::debug!(
        model = %config.model,
        mtu_size = config.startup.mtu_size,
        inter_package_delay = config.startup.inter_package_delay,
        "configuration loaded"
    );

    if let Commands::Models = cli.command {
        for profile in pylon_hw::profiles::list_profiles() {
            println!(
                "{:<16} {}",
                profile.device.model_name, profile.device.transport
            );
        }
        return Ok(());
    }

    let device = pylon_hw::profiles::sim_device(&config.model)
        .with_context(|| format!("cannot open camera model {}", config.model))?;
    let mut camera = pylon_camera::connect(device)?;

    match cli.command {
        // Listed above without opening a camera.
        Commands::Models => {}
        Commands::Startup => {
            camera.apply_startup_settings(&config.startup)?;
            println!("Startup settings applied ({})", camera.type_name());
        }
        Commands::Exposure { microseconds } => {
            let reached = camera.set_exposure(microseconds)?;
            println!("Exposure: {reached} us");
        }
        Commands::Gain { fraction } => {
            let reached = camera.set_gain(fraction)?;
            println!("Gain: {reached:.4} of range");
        }
        Commands::Gamma { value } => {
            let reached = camera.set_gamma(value)?;
            println!("Gamma: {reached}");
        }
        Commands::Brightness { value } => {
            let reached = camera.set_auto_target_brightness(value)?;
            println!("Auto target brightness: {reached:.1}");
        }
        Commands::Sequencer { seconds } => {
            let reached = camera.setup_sequencer(&seconds)?;
            for (index, (requested, got)) in seconds.iter().zip(&reached).enumerate() {
                println!("set {index}: requested {requested} s, exposure {got} s");
            }
        }
        Commands::Info => {
            let info = info_json(camera.as_mut());
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    Ok(())
}

/// Snapshot of the camera's parameters. Nodes the model lacks are `null`.
fn info_json(camera: &mut dyn PylonCamera) -> serde_json::Value {
    let device = camera.info().clone();
    serde_json::json!({
        "family": camera.type_name(),
        "model": device.model_name,
        "vendor": device.vendor_name,
        "serial": device.serial_number,
        "exposure_us": camera.current_exposure().ok(),
        "gain": camera.current_gain().ok(),
        "gamma": camera.current_gamma().ok(),
        "frame_rate": camera.current_frame_rate().ok(),
    })
}
