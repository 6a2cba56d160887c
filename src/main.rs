use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sightline_gateway::api::ApiServer;
use sightline_gateway::Config;

/// Sightline - local gateway pairing camera frames with voice queries
#[derive(Parser)]
#[command(name = "sightline", version, about)]
struct Cli {
    /// Port to listen on
    #[arg(long, env = "SIGHTLINE_PORT")]
    port: Option<u16>,

    /// Path to a TOML configuration file
    #[arg(short, long, env = "SIGHTLINE_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for frame files and audio spools
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,sightline_gateway=info",
        1 => "info,sightline_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    tracing::info!(
        port = config.port,
        data_dir = %config.data_dir.display(),
        frame_capacity = config.frame_capacity,
        reasoning_model = %config.reasoning.model,
        "starting sightline gateway"
    );

    let server = ApiServer::new(&config)?;
    server.run().await?;

    Ok(())
}
