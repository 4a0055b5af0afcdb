mod commands;
mod pipeline;

use clap::Parser;
use std::process::ExitCode;
use wpforge_build::RenderOptions;

#[derive(Parser)]
#[command(name = "wpforge", about = "Provision a customized WordPress container deployment")]
#[command(version)]
struct Cli {
    /// Stop after rendering; do not build the custom image
    #[arg(long)]
    alternate: bool,
    /// Enable WordPress multisite (adds rewrite rules and multisite constants)
    #[arg(long)]
    multisite: bool,
    /// Use subdomains for multisite sites (requires --multisite)
    #[arg(long)]
    subdomain: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(e) => {
            if std::env::var_os("RUST_LOG").is_some() {
                eprintln!("Ignoring invalid RUST_LOG ({e}); logging at info");
            }
            tracing_subscriber::EnvFilter::new("info")
        }
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    if cli.subdomain && !cli.multisite {
        tracing::warn!("--subdomain has no effect without --multisite");
    }

    let options = RenderOptions {
        multisite: cli.multisite,
        subdomain: cli.subdomain,
    };

    commands::provision(cli.alternate, options).await
}
