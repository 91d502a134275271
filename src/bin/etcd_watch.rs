//! Watches a key (or a directory, when the key ends in `/`) and prints every
//! update until Ctrl+C.
use std::path::PathBuf;

use clap::Parser;
use etcd2_client::ClientConfig;
use etcd2_client::EtcdClient;
use etcd2_client::Result;
use etcd2_client::WatchUpdate;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "etcd-watch")]
#[command(version)]
#[command(about = "Print every change to an etcd key or directory", long_about = None)]
struct Args {
    /// Key to watch; a trailing `/` watches the whole directory
    key: String,

    /// Host of the first node to contact
    #[arg(long)]
    host: Option<String>,

    /// Port of the first node to contact
    #[arg(long)]
    port: Option<u16>,

    /// Extra configuration file applied on top of CONFIG_PATH and env vars
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    init_observability();
    let args = Args::parse();

    let mut config = ClientConfig::new()?;
    if let Some(path) = &args.config {
        config = config.with_override_config(&path.to_string_lossy())?;
    }
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let client = EtcdClient::builder().set_config(config).build().await?;
    let shutdown = CancellationToken::new();
    let watch = client.watch_with_cancellation(&args.key, print_updates, &shutdown);
    info!("Watching {}. Waiting for CTRL+C signal...", watch.key());

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl+C detected."),
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
        shutdown.cancel();
    });

    match watch.join().await {
        Err(e) if !e.is_cancelled() => error!("watch ended: {}", e),
        _ => info!("Shutdown completed"),
    }

    println!("Exiting program.");
    Ok(())
}

fn print_updates(updates: Vec<WatchUpdate>) {
    for update in updates {
        if update.exists {
            println!("SET    {}", update.node);
        } else {
            println!("DELETE {}", update.node);
        }
    }
}

fn init_observability() {
    let base_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(base_subscriber).init();
}
