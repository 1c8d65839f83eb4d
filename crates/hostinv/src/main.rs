//! hostinv CLI
//!
//! Host inventory kept in etcd: create, modify and remove hosts, and list
//! them through a filter expression in one of eight output formats.

use clap::Parser;
use color_eyre::Result;
use hostinv_format::FormatterRegistry;
use hostinv_store::EtcdStore;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod config;

use cli::Cli;
use config::{Config, LogConfig, LogFormat};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let config_path = config::locate(cli.config.as_deref());
    let mut config = Config::load_from(config_path.as_deref())?;
    config.apply(&cli.overrides())?;

    init_tracing(cli.verbose, &config.log);
    match &config_path {
        Some(path) => debug!(path = %path.display(), "configuration loaded"),
        None => debug!("no config file found, using defaults"),
    }

    let registry = FormatterRegistry::default();
    let store = config.store;
    let output = commands::run(cli.command, &registry, &config.output.format, || {
        debug!(endpoint = %store.endpoint, prefix = %store.prefix, "opening store");
        Ok(EtcdStore::new(&store.endpoint, store.prefix.clone(), store.timeout())?)
    })
    .await?;

    print!("{output}");
    Ok(())
}

/// Logs go to stderr; `RUST_LOG` beats `-v`, which beats the config file
fn init_tracing(verbose: u8, log: &LogConfig) {
    let level = match verbose {
        0 => log.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    match log.format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}
