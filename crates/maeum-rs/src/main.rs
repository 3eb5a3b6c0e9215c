//! Maeum HTTP server.

use anyhow::Context;
use clap::Parser;
use log::{debug, info, warn};
use maeum_rs::config::{LayeredConfigOptions, MaeumConfig};
use maeum_rs::core::AppContext;
use maeum_rs::init_logging;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Command-line options for the server.
#[derive(Debug, Parser)]
#[command(name = "maeum", version, about = "Empathetic Korean voice and text chatbot server")]
struct Cli {
    /// Extra maeum.json5 layer applied after the discovered ones (repeatable)
    #[arg(long = "config")]
    config: Vec<PathBuf>,
    /// Bind host override
    #[arg(long)]
    host: Option<String>,
    /// Bind port override
    #[arg(long)]
    port: Option<u16>,
}

impl Cli {
    fn apply(&self, config: &mut MaeumConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<MaeumConfig> {
    let cwd = std::env::current_dir().context("failed to resolve current working directory")?;
    let options = cli
        .config
        .iter()
        .fold(LayeredConfigOptions::new(&cwd), |options, path| {
            options.with_runtime_path(path)
        });
    let layered =
        MaeumConfig::load_layered_with_options(options).context("failed to load layered config")?;
    debug!("layered config loaded (layers={})", layered.layers.len());
    let mut config = layered.config;
    cli.apply(&mut config);
    Ok(config)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => warn!("failed to listen for shutdown signal (err={})", err),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    info!(
        "starting maeum (runtime_configs={}, host_set={}, port_set={})",
        cli.config.len(),
        cli.host.is_some(),
        cli.port.is_some()
    );

    let config = load_config(&cli)?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "invalid bind address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    let context = AppContext::build(config).context("failed to build application context")?;
    let memory = context.chat().memory_status();
    if memory.enabled {
        info!(
            "memory backend ready (service={}, project_id={:?}, location={:?}, data_store_id={:?})",
            memory.service, memory.project_id, memory.location, memory.data_store_id
        );
    } else {
        warn!(
            "memory backend disabled (reason={})",
            memory.disabled_reason.as_deref().unwrap_or("unknown")
        );
    }

    maeum_rs::server::serve(Arc::new(context), addr, shutdown_signal())
        .await
        .context("http server failed")?;
    info!("maeum stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::Parser;
    use maeum_rs::config::MaeumConfig;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn config_flag_repeats_and_overrides_apply() {
        let cli = Cli::try_parse_from([
            "maeum",
            "--config",
            "a.json5",
            "--config",
            "b.json5",
            "--host",
            "127.0.0.1",
            "--port",
            "9000",
        ])
        .expect("parse");
        assert_eq!(
            cli.config,
            vec![PathBuf::from("a.json5"), PathBuf::from("b.json5")]
        );

        let mut config = MaeumConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn no_flags_keep_config_values() {
        let cli = Cli::try_parse_from(["maeum"]).expect("parse");
        let mut config = MaeumConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn invalid_port_is_rejected() {
        assert!(Cli::try_parse_from(["maeum", "--port", "70000"]).is_err());
    }
}
