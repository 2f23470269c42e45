//! # v2rayA lifecycle hooks
//!
//! Hook dispatcher run by v2rayA around its core and transparent-proxy
//! lifecycles. The core hook rewrites the proxy core's `config.json` for
//! fake-DNS interception before the core starts; the transparent hook
//! inserts firewall bypass rules into the `inet v2raya tp_rule` chain once
//! interception is up. Every other (role, stage) combination is a
//! successful no-op.
//!
//! Two constraints shape the code:
//!
//! - every failure is fatal. The process reports the error on stdout and
//!   exits 1, leaving retry policy to v2rayA;
//! - hook invocations are not coordinated with each other. The caller must
//!   serialize them; concurrent invocations may interleave file writes and
//!   rule insertions.
//!
//! Firewall insertions are independent `nft` calls. When one fails the
//! earlier ones stay installed; the rule comment marker keeps the next
//! invocation from doubling them up.
//!
//! ## Modules
//!
//! - [`cli`] - Command-line interface definitions
//! - [`cmd_abstraction`] - Mockable external-command execution
//! - [`config`] - Operator custom configuration
//! - [`document`] - JSON document reading and writing
//! - [`error`] - Error types
//! - [`hooks`] - Stage dispatch and the two hook handlers

pub mod cli;
pub mod cmd_abstraction;
pub mod config;
pub mod document;
pub mod error;
pub mod hooks;

pub use cli::{Cli, Commands, HookOptions, Stage};
pub use config::CustomConfig;
pub use hooks::HookKind;
