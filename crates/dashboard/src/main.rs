use anyhow::Result;
use clap::Parser;
use dashboard::{DashboardConfig, Overrides};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "service-dashboard")]
#[command(about = "Serve a page linking to services registered in Consul", long_about = None)]
#[command(version)]
struct Args {
    /// Configuration file (YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Sets the HTTP address to listen on
    #[arg(long, env = "HTTP_ADDR")]
    http_addr: Option<String>,

    /// Consul agent HTTP address
    #[arg(long, env = "CONSUL_HTTP_ADDR")]
    consul_addr: Option<String>,

    /// Consul ACL token
    #[arg(long, env = "CONSUL_HTTP_TOKEN", hide_env_values = true)]
    consul_token: Option<String>,

    /// Consul datacenter to query
    #[arg(long, env = "CONSUL_DATACENTER")]
    datacenter: Option<String>,
}

fn main() -> Result<()> {
    dashboard::logging::init();

    let config = load_config(Args::parse())?;

    // reqwest and axum need a tokio reactor
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(dashboard::run(config))
}

/// File (or defaults) first, then flags and environment on top
fn load_config(args: Args) -> Result<DashboardConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            DashboardConfig::from_file(path)?
        }
        None => DashboardConfig::default(),
    };
    config.apply(Overrides {
        listen_addr: args.http_addr,
        consul_addr: args.consul_addr,
        consul_token: args.consul_token,
        datacenter: args.datacenter,
    });
    Ok(config)
}
