//! Command execution abstraction for testability.
//!
//! Trait-based wrapper over `std::process::Command` so unit tests can mock
//! the nft invocations without touching the host firewall.

use anyhow::Result;
use std::process::{Command, Stdio};

#[cfg(test)]
use mockall::automock;

/// Output from command execution
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Standard output from the command
    pub stdout: String,
    /// Standard error from the command
    pub stderr: String,
    /// Whether the command succeeded (exit code 0)
    pub success: bool,
    /// The exit code, if available
    pub code: Option<i32>,
}

/// Trait for command execution, allowing dependency injection for testing.
#[cfg_attr(test, automock)]
pub trait CommandExecutor: Send + Sync {
    /// Execute a command with the given arguments.
    fn execute(&self, cmd: &str, args: &[String]) -> Result<CommandOutput>;
}

/// Real implementation of CommandExecutor that runs actual system commands.
#[derive(Debug, Clone, Default)]
pub struct RealCommandExecutor;

impl RealCommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for RealCommandExecutor {
    fn execute(&self, cmd: &str, args: &[String]) -> Result<CommandOutput> {
        let output = Command::new(cmd)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        })
    }
}

/// Helper function to convert a slice of &str to Vec<String>.
///
/// mockall has issues with lifetimes in `&[&str]`, so the trait signature
/// takes `&[String]` instead.
pub fn args_to_strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

/// Run a command and return its trimmed stdout.
///
/// A command that cannot be started or exits non-zero is an error; the
/// caller propagates it and the whole invocation aborts. There is no retry
/// and no partial-result path.
pub fn run_checked<E: CommandExecutor + ?Sized>(
    executor: &E,
    cmd: &str,
    args: &[&str],
) -> Result<String> {
    let output = executor.execute(cmd, &args_to_strings(args))?;
    if !output.success {
        anyhow::bail!(
            "{} {} failed: {}",
            cmd,
            args.join(" "),
            output.stderr.trim()
        );
    }
    Ok(output.stdout.trim().to_string())
}
