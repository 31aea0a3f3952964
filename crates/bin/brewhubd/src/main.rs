//! # brewhubd — brew rig daemon
//!
//! Composition root that wires the device adapters together and runs the
//! controller.
//!
//! ## Responsibilities
//! - Parse the daemon configuration (config file, env vars)
//! - Load the rig document, generating the dummy rig on first run
//! - Set up the fan-out device log (stdout + results file)
//! - Register device kinds (virtual always, GPIO unless in dummy mode)
//! - Build and start the controller
//! - Handle graceful shutdown (SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no control logic belongs here.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use brewhub_adapter_gpio::{SysfsGpio, W1Bus};
use brewhub_app::controller::Controller;
use brewhub_app::equipment::register_equipment;
use brewhub_app::logger::{LogLevel, Logger};
use brewhub_app::ports::{GpioDriver, OneWireBus};
use brewhub_app::registry::DeviceRegistry;
use brewhub_domain::config::RigConfig;

mod config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::Config::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.logging.filter))
        .init();

    let rig = load_or_create_rig(&config.controller.config_path)?;
    tracing::info!(rig = %rig.name, dummy = config.controller.dummy, "starting");

    let logger = Logger::new();
    logger.set_debug(config.logging.debug);
    logger
        .add_sink("stdout", LogLevel::ALL, Box::new(std::io::stdout()))
        .await;
    let results = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.logging.results_file)?;
    logger
        .add_sink("results", LogLevel::RESULTS, Box::new(results))
        .await;

    let mut registry = DeviceRegistry::new();
    register_equipment(&mut registry);
    brewhub_adapter_virtual::register(&mut registry);
    if !config.controller.dummy {
        let gpio: Arc<dyn GpioDriver> = Arc::new(SysfsGpio::default());
        let bus: Arc<dyn OneWireBus> = Arc::new(W1Bus::default());
        brewhub_adapter_gpio::register(&mut registry, gpio, bus);
    }

    let cancel = CancellationToken::new();
    let handle = Controller::build(&rig, &registry, logger.clone()).start(cancel.clone());

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    handle.shutdown();
    // Give the device tasks a beat to switch everything off and log it.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    logger.sync().await;
    Ok(())
}

/// Load the rig document. On first run, write the generated dummy rig so
/// the operator has a working file to edit.
fn load_or_create_rig(path: &str) -> anyhow::Result<RigConfig> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            let rig = RigConfig::default_dummy();
            std::fs::write(path, toml::to_string_pretty(&rig)?)?;
            tracing::info!("no rig document at {path}, wrote the dummy rig");
            Ok(rig)
        }
        Err(err) => Err(err.into()),
    }
}
