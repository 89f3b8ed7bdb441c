use clap::Parser;
use localns_core::{LOCALNS_CONFIG_VAR, LOCALNS_LOG_VAR};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

use commands::Commands;

#[derive(Parser, Debug)]
#[command(name = "localns")]
#[command(about = "Serve a local directory tree as a read-only, signed name space", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON configuration file (defaults to $LOCALNS_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Local directory to serve
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Owner of the name space
    #[arg(long, global = true)]
    owner: Option<String>,

    /// Act as this user instead of the owner
    #[arg(long = "as", value_name = "USER", global = true)]
    as_user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = cli
        .config
        .or_else(|| std::env::var_os(LOCALNS_CONFIG_VAR).map(PathBuf::from));
    let globals = commands::Globals {
        config,
        root: cli.root,
        owner: cli.owner,
        as_user: cli.as_user,
    };
    cli.command.execute(&globals, &mut std::io::stdout().lock())
}

// LOCALNS_LOG wins over RUST_LOG; logs go to stderr so stdout stays JSON.
fn init_logging() {
    let directives = std::env::var(LOCALNS_LOG_VAR)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .with(filter)
        .init();
}
