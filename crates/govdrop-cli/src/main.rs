//! govdrop CLI
//!
//! Command-line interface for governance-snapshot tallies and airdrops.

mod config;
mod loader;
mod report;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use config::{GovdropConfig, LoggingConfig, DEFAULT_CONFIG_FILE};
use govdrop_core::{assemble_accounts, Dec};
use govdrop_distribution::{parameter_sweep, rank_holders, sweep};
use govdrop_tally::{tally, TallyComparison};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "govdrop")]
#[command(version)]
#[command(about = "Governance snapshot tally and supply-conserving airdrop", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare the proposal tally with the tally computed from <DIR>
    Tally {
        /// Snapshot directory
        dir: PathBuf,
    },

    /// Consolidate the snapshot in <DIR> into <DIR>/accounts.json
    Accounts {
        /// Snapshot directory
        dir: PathBuf,
    },

    /// Convert <DIR>/accounts.json into <DIR>/airdrop.json
    Distribution {
        /// Snapshot directory
        dir: PathBuf,

        /// Comma-separated Yes multipliers to try
        #[arg(long, value_delimiter = ',')]
        yes_multipliers: Vec<Dec>,

        /// Comma-separated No multipliers to try
        #[arg(long, value_delimiter = ',')]
        no_multipliers: Vec<Dec>,

        /// Destination address prefix
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Print the largest allocations of <DIR>/airdrop.json
    Top {
        /// Snapshot directory
        dir: PathBuf,

        /// Number of holders
        #[arg(short = 'n', long, default_value = "20")]
        count: usize,
    },
}

fn init_logging(verbose: bool, logging: &LoggingConfig) {
    let default_level = if verbose { "debug" } else { logging.level.as_str() };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = GovdropConfig::load(&cli.config)?;
    init_logging(cli.verbose, &config.logging);

    match cli.command {
        Commands::Tally { dir } => run_tally(&dir),
        Commands::Accounts { dir } => run_accounts(&dir, &config),
        Commands::Distribution {
            dir,
            yes_multipliers,
            no_multipliers,
            prefix,
        } => run_distribution(&dir, &config, &yes_multipliers, &no_multipliers, prefix),
        Commands::Top { dir, count } => run_top(&dir, count),
    }
}

fn run_tally(dir: &Path) -> anyhow::Result<()> {
    let votes = loader::load_votes(dir)?;
    let validators = loader::load_validators(dir, &votes)?;
    let delegations = loader::load_delegations(dir)?;
    let reported = loader::load_reported_tally(dir)?;
    if reported.is_none() {
        tracing::warn!("No {} in snapshot, skipping comparison", loader::PROPOSAL_FILE);
    }

    let result = tally(&votes, &validators, &delegations);
    let comparison = TallyComparison::new(&result, reported);
    println!("{}", report::tally_report(&comparison));
    Ok(())
}

fn run_accounts(dir: &Path, config: &GovdropConfig) -> anyhow::Result<()> {
    let votes = loader::load_votes(dir)?;
    let validators = loader::load_validators(dir, &votes)?;
    let delegations = loader::load_delegations(dir)?;
    let balances = loader::load_balances(dir, &config.snapshot.denom)?;

    let accounts = assemble_accounts(&votes, &validators, &delegations, &balances)?;
    loader::write_accounts(dir, &accounts)?;
    println!(
        "{} created with {} accounts.",
        dir.join(loader::ACCOUNTS_FILE).display(),
        accounts.len()
    );
    Ok(())
}

fn run_distribution(
    dir: &Path,
    config: &GovdropConfig,
    yes_multipliers: &[Dec],
    no_multipliers: &[Dec],
    prefix: Option<String>,
) -> anyhow::Result<()> {
    let mut base = config.to_parameters().context("invalid distribution parameters")?;
    if let Some(prefix) = prefix {
        base.address_prefix = prefix;
    }
    let sets = parameter_sweep(&base, yes_multipliers, no_multipliers);

    let accounts = loader::load_accounts(dir)?;
    let runs = sweep(&accounts, &sets)?;
    println!("{}", report::distribution_report(&runs));

    // Output files only make sense for a single parameter set
    if let [run] = runs.as_slice() {
        let result = match &run.outcome {
            Ok(result) => result,
            Err(err) => bail!("distribution failed: {}", err),
        };
        if !result.verify_conservation() {
            bail!("distribution does not conserve supply");
        }

        loader::write_airdrop(dir, &result.addresses)?;
        println!("{} created/updated.", dir.join(loader::AIRDROP_FILE).display());

        let detail = dir.join(loader::AIRDROP_DETAIL_FILE);
        report::write_detail_csv(&detail, result)?;
        println!("{} created/updated.", detail.display());
    }
    Ok(())
}

fn run_top(dir: &Path, count: usize) -> anyhow::Result<()> {
    let addresses = loader::load_airdrop(dir)?;
    let supply: Dec = addresses.values().sum();
    let holders = rank_holders(&addresses, &supply, count);
    println!("{}", report::top_holders_report(&holders));
    Ok(())
}
