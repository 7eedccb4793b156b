use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use genmix::config::AppConfig;
use genmix::upstream::HttpDataSource;
use genmix::{process, router, AppState};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Regional generation-mix aggregation service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the charting client and the /data endpoint
    Serve(ServeArgs),
    /// Aggregate a saved upstream payload and print the response JSON
    Process(ProcessArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Address to listen on (overrides BIND_ADDR)
    #[arg(long)]
    bind: Option<SocketAddr>,
    /// Directory holding the built client (overrides STATIC_DIR)
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ProcessArgs {
    /// JSON file with `columns` and `data` as returned by the upstream API
    input: PathBuf,
    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Process(args) => {
            let rendered = process::render_file(&args.input, args.pretty)?;
            println!("{rendered}");
            Ok(())
        }
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let mut config = AppConfig::from_env()?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(static_dir) = args.static_dir {
        config.static_dir = static_dir;
    }

    let api_key = config.upstream.require_api_key()?;
    let source = HttpDataSource::new(&config.upstream, api_key)
        .context("failed to build upstream client")?;
    let app_state = Arc::new(AppState::new(Arc::new(source), &config.static_dir));

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(
        static_dir = %config.static_dir.display(),
        upstream = %config.upstream.base_url,
        "listening on {}",
        listener.local_addr()?
    );
    axum::serve(listener, router(app_state).into_make_service()).await?;

    Ok(())
}
