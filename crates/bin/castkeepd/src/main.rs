//! # castkeepd — castkeep daemon
//!
//! Composition root that wires all adapters together and runs the
//! scheduler and HTTP surface.
//!
//! ## Responsibilities
//! - Parse configuration (TOML file, env vars) and fail fast on bad plans
//! - Construct the catt transport and the statestream state store
//! - Construct the controller and scheduler, injecting adapters via ports
//! - Build the axum router, injecting the controller and settings
//! - Bind to a TCP port and serve
//! - Handle graceful shutdown (SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;
use std::time::Duration;

use castkeep_adapter_catt::CattTransport;
use castkeep_adapter_http_axum::state::AppState;
use castkeep_adapter_mqtt::{StatestreamBridge, StatestreamStore};
use castkeep_app::controller::CastController;
use castkeep_app::event_bus::StateChangeBus;
use castkeep_app::scheduler::{Scheduler, SchedulerOptions};
use castkeep_app::settings::{RuntimeSettings, Settings};

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    let filter = tracing_subscriber::EnvFilter::try_new(&config.logging.filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let plan = config.casting_plan()?;
    tracing::info!(
        devices = plan.devices.len(),
        triggers = plan.triggers.len(),
        "casting plan loaded"
    );

    let settings = Arc::new(RuntimeSettings::new(Settings {
        cast_interval: Duration::from_secs(config.casting.interval_secs),
        global_gate: plan.global_gate.clone(),
    }));

    let transport = CattTransport::new()
        .with_binary(&config.catt.binary)
        .with_timeout(Duration::from_secs(config.catt.timeout_secs));

    let bus = StateChangeBus::new(256);
    let store = StatestreamStore::new();
    if config.mqtt.enabled {
        let bridge = StatestreamBridge::new(config.mqtt_config(), store.clone(), bus.clone());
        tokio::spawn(async move {
            if let Err(err) = bridge.run().await {
                tracing::error!(error = %err, "statestream bridge failed");
            }
        });
    } else {
        tracing::info!("mqtt disabled — entity gates default open and triggers stay inert");
    }

    let controller = Arc::new(CastController::new(
        transport,
        store,
        plan.devices,
        plan.triggers,
        Arc::clone(&settings),
    ));

    let scheduler = Scheduler::with_options(
        Arc::clone(&controller),
        Arc::clone(&settings),
        SchedulerOptions {
            worker_limit: config.casting.worker_limit,
            device_timeout: Duration::from_secs(config.casting.device_timeout_secs),
        },
    );
    let events = bus.subscribe();
    tokio::spawn(async move { scheduler.run(events).await });

    let app = castkeep_adapter_http_axum::router::build(AppState::new(controller, settings));
    let bind_addr = config.bind_addr();
    tracing::info!(%bind_addr, "castkeepd listening");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(err) => tracing::error!(error = %err, "failed to listen for shutdown signal"),
    }
}
