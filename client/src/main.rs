//! Command-line todo client with optimistic updates and a simulated session.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io::{self, Write};

use clap::Parser;
use ortho_config::OrthoConfig;
use todo_client::config::ClientSettings;
use todo_client::inbound::cli::{CliArgs, ClientApp};
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> io::Result<()> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(error) => error.exit(),
    };
    init_tracing();
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main(args))
}

fn init_tracing() {
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .json()
        .try_init()
    {
        warn!(error = %error, "tracing init failed");
    }
}

async fn async_main(args: CliArgs) -> io::Result<()> {
    let settings = ClientSettings::load_from_iter([OsString::from("todo-client")])
        .map_err(|error| io::Error::other(format!("load configuration: {error}")))?;
    let app = ClientApp::build(&settings).map_err(io::Error::other)?;
    let lines = app.run(args.command).await.map_err(io::Error::other)?;

    let mut stdout = io::stdout().lock();
    for line in lines {
        writeln!(stdout, "{line}")?;
    }
    Ok(())
}
