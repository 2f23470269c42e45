//! CLI argument parsing with clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fmt;
use std::path::PathBuf;

/// Lifecycle points v2rayA fires hooks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Stage {
    PreStart,
    PreStop,
    PostStart,
    PostStop,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::PreStart => "pre-start",
            Stage::PreStop => "pre-stop",
            Stage::PostStart => "post-start",
            Stage::PostStop => "post-stop",
        })
    }
}

#[derive(Parser)]
#[command(name = "v2raya-hook")]
#[command(author, version, about = "Lifecycle hooks for the v2rayA transparent proxy")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug output)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Which hook role this invocation plays.
///
/// v2rayA historically selected the role through the executable's file
/// name; an explicit subcommand keeps the role out of filesystem state.
#[derive(Subcommand)]
pub enum Commands {
    /// Run as the core hook (patches config.json before the core starts)
    Core(HookArgs),

    /// Run as the transparent-proxy hook (installs firewall bypass rules)
    Transparent(HookArgs),
}

#[derive(Args)]
pub struct HookArgs {
    /// Lifecycle stage the caller is at
    #[arg(long, value_enum)]
    pub stage: Stage,

    /// Transparent proxy flavour reported by the caller
    #[arg(long)]
    pub transparent_type: Option<String>,

    /// Directory holding config.json and custom_config.json
    #[arg(long, default_value = "/etc/v2raya")]
    pub v2raya_confdir: PathBuf,
}

/// Options for a single hook run, built once from the CLI and immutable
/// afterwards.
#[derive(Debug, Clone)]
pub struct HookOptions {
    pub stage: Stage,
    /// Accepted for protocol compatibility; no handler branches on it yet.
    pub transparent_type: Option<String>,
    pub confdir: PathBuf,
}

impl HookOptions {
    /// Path of the core runtime configuration.
    pub fn core_config_path(&self) -> PathBuf {
        self.confdir.join("config.json")
    }

    /// Path of the operator's custom configuration.
    pub fn custom_config_path(&self) -> PathBuf {
        self.confdir.join("custom_config.json")
    }
}

impl From<HookArgs> for HookOptions {
    fn from(args: HookArgs) -> Self {
        Self {
            stage: args.stage,
            transparent_type: args.transparent_type,
            confdir: args.v2raya_confdir,
        }
    }
}

/// Option keys this binary understands.
const KNOWN_KEYS: &[&str] = &["--stage", "--transparent-type", "--v2raya-confdir"];

/// Flags handled by clap itself.
const KNOWN_FLAGS: &[&str] = &[
    "--quiet",
    "--verbose",
    "--help",
    "--version",
    "-q",
    "-v",
    "-h",
    "-V",
];

/// Split argv into tokens clap should see and unrecognized option tokens.
///
/// v2rayA passes hooks a fixed set of `--key=value` tokens and may grow new
/// ones over time; unknown keys must be reported and ignored, never fatal.
pub fn split_known_args<I>(argv: I) -> (Vec<String>, Vec<String>)
where
    I: IntoIterator<Item = String>,
{
    let mut kept = Vec::new();
    let mut unknown = Vec::new();

    for (i, token) in argv.into_iter().enumerate() {
        if i == 0 || !token.starts_with('-') {
            // Program name, subcommand, or an option value.
            kept.push(token);
            continue;
        }

        let key = token.split_once('=').map_or(token.as_str(), |(key, _)| key);
        if KNOWN_KEYS.contains(&key) || KNOWN_FLAGS.contains(&key) {
            kept.push(token);
        } else {
            unknown.push(token);
        }
    }

    (kept, unknown)
}
