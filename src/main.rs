use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use stackdown::directory::{Fixture, InMemoryDirectory};
use stackdown::logging::init_logging;
use stackdown::progress::StdioSink;
use stackdown::{Config, TeardownCoordinator};

#[derive(Parser)]
#[command(name = "stackdown")]
#[command(about = "Tear down stacks and wait for their tasks to finish", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(short, long, global = true, help = "Enable debug logging")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Remove one or more stacks
    #[command(visible_aliases = ["remove", "down"])]
    Rm {
        #[arg(required = true, num_args = 1.., value_name = "STACK")]
        stacks: Vec<String>,

        #[arg(
            short,
            long,
            default_value_t = true,
            num_args = 0..=1,
            require_equals = true,
            default_missing_value = "true",
            action = ArgAction::Set,
            overrides_with = "no_detach",
            help = "Exit immediately instead of waiting for the stack tasks to converge"
        )]
        detach: bool,

        #[arg(long, overrides_with = "detach", help = "Wait for the stack tasks to converge")]
        no_detach: bool,

        #[arg(long, help = "Config file (TOML)")]
        config: Option<PathBuf>,

        #[arg(long, help = "Cluster snapshot to operate on (JSON or YAML)")]
        fixture: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Rm {
            stacks,
            detach,
            no_detach,
            config,
            fixture,
        } => remove_stacks(&stacks, detach && !no_detach, config.as_deref(), &fixture).await?,
    }

    Ok(())
}

async fn remove_stacks(
    stacks: &[String],
    detach: bool,
    config_path: Option<&std::path::Path>,
    fixture_path: &std::path::Path,
) -> Result<()> {
    let config = Config::load(config_path)?;
    let fixture = Fixture::load(fixture_path)?;
    let directory = Arc::new(InMemoryDirectory::from_fixture(fixture, config.api_version));

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling teardown");
            on_interrupt.cancel();
        }
    });

    let coordinator = TeardownCoordinator::new(
        directory.clone(),
        directory,
        Arc::new(StdioSink),
        config.wait_policy(),
    );
    coordinator.remove(stacks, detach, &cancel).await?;

    Ok(())
}
