//! v2rayA lifecycle hook dispatcher.
//!
//! Invoked by v2rayA around its core and transparent-proxy lifecycles to
//! patch the core runtime configuration and install firewall bypass rules.

use anyhow::Result;
use clap::Parser;
use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;

use v2raya_hooks::cli::{split_known_args, Cli, Commands, HookOptions};
use v2raya_hooks::cmd_abstraction::RealCommandExecutor;
use v2raya_hooks::config::CustomConfig;
use v2raya_hooks::hooks::{self, HookKind};

fn main() {
    // The hook protocol reports failures on stdout and exits 1; v2rayA
    // captures the output and surfaces it in its own log.
    if let Err(err) = run() {
        println!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let (argv, unknown) = split_known_args(std::env::args());
    let cli = Cli::parse_from(argv);

    // Setup logging based on verbosity
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    for arg in &unknown {
        warn!("Unknown argument: {}", arg);
    }

    let (kind, args) = match cli.command {
        Commands::Core(args) => (HookKind::Core, args),
        Commands::Transparent(args) => (HookKind::Transparent, args),
    };
    let options = HookOptions::from(args);

    let custom = CustomConfig::load(options.custom_config_path())?;

    hooks::dispatch(kind, &options, &custom, &RealCommandExecutor::new())
}
