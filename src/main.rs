use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};

use nntp_server::types::Port;
use nntp_server::{create_default_config, load_config, logging, Config, Server};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Override the configured listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the configured worker thread count (0 = one per CPU core)
    #[arg(short, long)]
    workers: Option<usize>,
}

fn main() -> Result<()> {
    logging::init_dual_logging();

    let args = Args::parse();

    // Load configuration, writing a commented default on first start
    let mut config = if std::path::Path::new(&args.config).exists() {
        match load_config(&args.config) {
            Ok(config) => config,
            Err(e) => {
                error!(
                    "Failed to load existing config file '{}': {}",
                    args.config, e
                );
                error!("Please check your config file syntax and try again");
                return Err(e);
            }
        }
    } else {
        warn!(
            "Config file '{}' not found, creating default config",
            args.config
        );
        let config = create_default_config(&args.config)?;
        info!("Created default config file: {}", args.config);
        config
    };

    if let Some(port) = args.port {
        config.server.port = Port::new(port)?;
    }
    if let Some(workers) = args.workers {
        config.server.workers = workers;
    }

    let num_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    let worker_threads = match config.server.workers {
        0 => num_cpus,
        n => n,
    };

    // Use different runtime based on thread count
    if worker_threads == 1 {
        info!("Starting NNTP server with single-threaded runtime");
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        rt.block_on(run_server(config))
    } else {
        info!(
            "Starting NNTP server with {} worker threads (detected {} CPUs)",
            worker_threads, num_cpus
        );
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(worker_threads)
            .enable_all()
            .build()?;
        rt.block_on(run_server(config))
    }
}

async fn run_server(config: Config) -> Result<()> {
    let server = Server::new(config).await?;
    server.run().await
}
