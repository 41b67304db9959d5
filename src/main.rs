use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tunnel_netsettings::engine::{
    CommandHandler, DryRunTunnel, FileRoutingEngine, Reconciler, RoutingEngine,
    SharedFileNotifier,
};
use tunnel_netsettings::{compute_settings, output, TunnelOptions};

/// Compute and (dry-run) apply tunnel network settings.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Tunnel options JSON file
    #[arg(long, env = "TUNNEL_OPTIONS")]
    options: Option<PathBuf>,

    /// Routing-engine running-info JSON file
    #[arg(long, env = "TUNNEL_FACTS")]
    facts: PathBuf,

    /// Directory shared with the host for error reporting
    #[arg(long, env = "TUNNEL_STATE_DIR", default_value = ".")]
    state_dir: PathBuf,

    /// Keep running and re-check the facts file every N seconds
    #[arg(long)]
    watch: Option<u64>,

    /// Run one host command, e.g. '{"command":"last_settings"}'
    #[arg(long)]
    command: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    dotenv::dotenv().ok();
    log4rs::init_file("log4rs.yml", Default::default())?;
    log::info!("#Start main()");

    let args = Args::parse();
    let options = match &args.options {
        Some(path) => TunnelOptions::load(path)?,
        None => TunnelOptions::default(),
    };

    let engine = Arc::new(FileRoutingEngine::new(&args.facts));
    let tunnel = Arc::new(DryRunTunnel::new(3));
    let notifier = Arc::new(SharedFileNotifier::new(&args.state_dir));
    let reconciler = Reconciler::spawn(engine.clone(), tunnel, notifier, options.clone());

    if let Err(e) = reconciler.reassert().await {
        log::error!("Initial reassert failed: {e}");
    }
    print_current(&engine, &options, &reconciler).await;

    if let Some(request) = &args.command {
        let handler = CommandHandler::new(
            reconciler.clone(),
            engine.clone(),
            options.log_file.as_ref().map(PathBuf::from),
        );
        println!("{}", handler.handle_json(request).await);
    }

    if let Some(secs) = args.watch {
        let mut interval = tokio::time::interval(Duration::from_secs(secs.max(1)));
        let mut seen = engine.modified();
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let modified = engine.modified();
                    if modified != seen {
                        seen = modified;
                        log::info!("Facts file changed");
                        reconciler.facts_changed();
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    log::info!("Ctrl+C received, shutting down");
                    break;
                }
            }
        }
        print_current(&engine, &options, &reconciler).await;
    }

    reconciler.shutdown();
    reconciler.closed().await;
    Ok(())
}

async fn print_current(
    engine: &FileRoutingEngine,
    options: &TunnelOptions,
    reconciler: &Reconciler,
) {
    let facts = engine.running_info().unwrap_or_default();
    match compute_settings(&facts, options) {
        Ok(settings) => {
            let applied = reconciler.last_snapshot().await.ok().flatten();
            output::print_settings(&settings, applied.as_ref());
        }
        Err(e) => log::warn!("No desired settings to show: {e}"),
    }
}
