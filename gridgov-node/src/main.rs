use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;

use gridgov_common::{
    config::GovernanceConfig,
    genesis::GenesisState,
    utils::{time::ManualClock, ParticipantId},
};
use gridgov_node::{
    build_runtime,
    cli::{Args, Command},
    runtime::{
        dispatch_driver::DispatchDriver,
        script::{run_scenario, Scenario},
    },
    setup::ensure_config,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Arguments
    let args = Args::parse();

    // 2. Panic hook
    std::panic::set_hook(Box::new(|info| {
        let msg = match info.payload().downcast_ref::<&'static str>() {
            Some(s) => *s,
            None => match info.payload().downcast_ref::<String>() {
                Some(s) => &s[..],
                None => "Box<Any>",
            },
        };
        let location = match info.location() {
            Some(l) => format!("at {}:{}:{}", l.file(), l.line(), l.column()),
            None => "unknown location".to_string(),
        };
        let err_msg = format!("CRASH: {} {}\n", msg, location);
        eprintln!("{}", err_msg);
        let _ = std::fs::write("panic.log", err_msg);
    }));

    // 3. Logging (the node name picks the audit log file)
    let node_name = GovernanceConfig::load_from_file(&args.config)
        .map(|c| c.node_name)
        .unwrap_or_else(|_| GovernanceConfig::default().node_name);
    let log_filename = format!("logs/audit-{}.log", node_name);
    let file_appender = tracing_appender::rolling::never(".", log_filename);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let governance_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_filter(tracing_subscriber::filter::filter_fn(|metadata| {
            metadata.target() == "governance"
        }));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gridgov_node=debug".into()),
        )
        .with_filter(tracing_subscriber::filter::filter_fn(|metadata| {
            metadata.target() != "governance"
        }));

    tracing_subscriber::registry()
        .with(governance_layer)
        .with(stdout_layer)
        .init();

    info!("--- STARTING GRIDGOV NODE ---");
    info!("Config: {}", args.config.display());

    // 4. Config
    let config = match ensure_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Config bootstrap failed: {}", e);
            return Err(e.into());
        }
    };

    match args.command {
        Command::Init => {
            config.save_to_file(&args.config)?;
            info!("✅ Config ready at {}", args.config.display());
        }
        Command::Status => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Command::Run { scenario } => {
            let genesis = match &args.genesis {
                Some(path) => {
                    info!("🏛️ Loading Genesis from {}", path.display());
                    GenesisState::load_from_file(path)?
                }
                None => {
                    info!("⚠️ No genesis given. Deploying with authority '{}'", args.authority);
                    GenesisState::new(ParticipantId::from(args.authority.as_str()))
                }
            };

            let scenario = Scenario::load_from_file(&scenario)?;
            let clock = Arc::new(ManualClock::new(scenario.start_time));

            let env = match build_runtime(config, &genesis, clock.clone()) {
                Ok(env) => env,
                Err(e) => {
                    error!("Failed to start governance runtime: {}", e);
                    return Err(e.into());
                }
            };

            let dispatcher = DispatchDriver::spawn(env.subscribe());
            let report = run_scenario(&env, &clock, &scenario).await;

            for failure in report.failures() {
                warn!(step = failure.index, op = failure.op, "Step rejected: {}", failure.detail);
            }
            println!("{}", serde_json::to_string_pretty(&report)?);

            env.export_audit().await;
            drop(env);

            let summary = dispatcher.await?;
            info!(
                deliveries = summary.deliveries.len(),
                tallies = summary.tallies.len(),
                "🏁 Scenario finished"
            );
        }
    }

    Ok(())
}
