//! Error types for the hook dispatcher.

use thiserror::Error;

/// Validation failures in the operator's custom configuration.
///
/// Uids and ports are spliced into nft command lines, so anything outside
/// a strict numeric/identifier shape is refused before dispatch.
#[derive(Error, Debug)]
pub enum HookError {
    #[error("invalid uid '{0}' in bypass_users (expected a numeric uid or user name)")]
    InvalidUid(String),

    #[error("invalid port specifier '{0}' in common_ports (expected a port or lo-hi range)")]
    InvalidPort(String),
}
