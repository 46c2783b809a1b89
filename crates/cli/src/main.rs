mod commands;
mod config;
mod progress;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "flystore",
    version,
    about = "File operations over local disk and object storage"
)]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    match cli.command {
        commands::Command::Init(args) => commands::init::run(args, config).await,
        commands::Command::Ls(args) => commands::list::run(args, config).await,
        commands::Command::Cat(args) => commands::cat::run(args, config).await,
        commands::Command::Put(args) => commands::put::run(args, config).await,
        commands::Command::Rm(args) => commands::remove::run(args, config).await,
        commands::Command::Mkdir(args) => commands::mkdir::run(args, config).await,
        commands::Command::Cp(args) => commands::transfer::copy(args, config).await,
        commands::Command::Mv(args) => commands::transfer::rename(args, config).await,
        commands::Command::Stat(args) => commands::stat::run(args, config).await,
        commands::Command::Visibility(args) => commands::visibility::run(args, config).await,
    }
}
