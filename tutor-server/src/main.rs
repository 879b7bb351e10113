use clap::Parser;
use clap_derive::Parser;
use config::ServerEnv;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use tutor_server::{AppState, start_server_on};

const DEFAULT_LOG_FILTER: &str = "info,tutor_server=debug,tutor_core=debug";

#[derive(Parser, Debug)]
#[command(author, version, about = "Math Buddy tutoring backend", long_about = None)]
struct Args {
    /// Interface to bind; overrides HOST
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on; overrides PORT
    #[arg(long, short)]
    port: Option<u16>,
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_env_file();
    let args = Args::parse();
    init_logging();

    let env = ServerEnv::from_env();
    let host = args.host.unwrap_or_else(|| env.host.clone());
    let port = args.port.unwrap_or(env.port);

    let state = Arc::new(AppState::from_env(&env)?);
    let handle = start_server_on(&host, port, state).await?;
    info!("Math Buddy server listening on {}", handle.url());

    tokio::signal::ctrl_c().await?;
    handle.shutdown().await
}
