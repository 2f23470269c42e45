//! Hook handlers and the stage dispatcher.

pub mod core;
pub mod transparent;

use anyhow::Result;
use std::fmt;
use tracing::debug;

use crate::cli::{HookOptions, Stage};
use crate::cmd_abstraction::CommandExecutor;
use crate::config::CustomConfig;

/// Which hook role this invocation plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    /// Wraps the v2ray core lifecycle
    Core,
    /// Wraps the transparent-proxy firewall lifecycle
    Transparent,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HookKind::Core => "core",
            HookKind::Transparent => "transparent",
        })
    }
}

/// Route a (role, stage) pair to its handler.
///
/// Exactly two pairs do anything; every other combination is a successful
/// no-op so v2rayA can call every stage unconditionally.
pub fn dispatch<E: CommandExecutor>(
    kind: HookKind,
    options: &HookOptions,
    custom: &CustomConfig,
    executor: &E,
) -> Result<()> {
    match (kind, options.stage) {
        (HookKind::Core, Stage::PreStart) => core::run(options, custom),
        (HookKind::Transparent, Stage::PostStart) => transparent::run(options, custom, executor),
        (kind, stage) => {
            debug!("{} hook has nothing to do at {}", kind, stage);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd_abstraction::MockCommandExecutor;
    use std::path::PathBuf;

    fn options(stage: Stage) -> HookOptions {
        HookOptions {
            stage,
            transparent_type: None,
            confdir: PathBuf::from("/nonexistent-confdir"),
        }
    }

    #[test]
    fn test_dispatch_noop_pairs_run_nothing() {
        // A strict mock with no expectations panics on any command, and the
        // confdir does not exist, so a handler invocation could not succeed.
        let mock = MockCommandExecutor::new();
        let custom = CustomConfig::default();

        let noop_pairs = [
            (HookKind::Core, Stage::PreStop),
            (HookKind::Core, Stage::PostStart),
            (HookKind::Core, Stage::PostStop),
            (HookKind::Transparent, Stage::PreStart),
            (HookKind::Transparent, Stage::PreStop),
            (HookKind::Transparent, Stage::PostStop),
        ];
        for (kind, stage) in noop_pairs {
            assert!(
                dispatch(kind, &options(stage), &custom, &mock).is_ok(),
                "{kind} at {stage} should be a no-op"
            );
        }
    }

    #[test]
    fn test_dispatch_core_pre_start_reaches_handler() {
        let mock = MockCommandExecutor::new();
        let custom = CustomConfig::default();

        // The core handler fails on the missing config.json, proving it ran.
        let err = dispatch(HookKind::Core, &options(Stage::PreStart), &custom, &mock).unwrap_err();
        assert!(err.to_string().contains("config.json"));
    }

    #[test]
    fn test_dispatch_transparent_post_start_reaches_handler() {
        let mut mock = MockCommandExecutor::new();
        mock.expect_execute()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("nft unavailable")));
        let custom = CustomConfig::default();

        let err = dispatch(
            HookKind::Transparent,
            &options(Stage::PostStart),
            &custom,
            &mock,
        )
        .unwrap_err();
        assert!(err.to_string().contains("nft unavailable"));
    }

    #[test]
    fn test_hook_kind_display() {
        assert_eq!(HookKind::Core.to_string(), "core");
        assert_eq!(HookKind::Transparent.to_string(), "transparent");
    }
}
