//! `vdt serve` command - run the HTTP API

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::cli::commands::load_engine;
use crate::cli::CliError;
use crate::server;

#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Bind host
    #[arg(long, default_value = "127.0.0.1", env = "VDT_HOST")]
    pub host: String,

    /// Bind port
    #[arg(long, default_value_t = 8080, env = "VDT_PORT")]
    pub port: u16,
}

pub fn run(args: ServeArgs, dir: Option<&Path>) -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let engine = Arc::new(load_engine(dir)?);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .map_err(|e| CliError::Io(format!("invalid bind address: {e}")))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Io(format!("failed to start runtime: {e}")))?;

    runtime
        .block_on(server::serve(engine, addr))
        .map_err(|e| CliError::Io(format!("server error: {e}")))
}
