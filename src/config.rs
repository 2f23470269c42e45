//! Operator custom configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::Path;

use crate::error::HookError;

/// Operator-authored settings, read once per invocation and never written.
///
/// Lives next to the core runtime config as `custom_config.json`. Every
/// field is optional; absent fields fall back to empty lists.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CustomConfig {
    /// Domains that must keep resolving through real DNS instead of fakedns
    pub fake_dns_exclude_domains: Vec<String>,

    /// Socket-owner uids whose traffic skips interception
    #[serde(deserialize_with = "strings_or_numbers")]
    pub bypass_users: Vec<String>,

    /// Destination ports considered ordinary traffic; everything else
    /// returns early out of the interception chain
    #[serde(deserialize_with = "strings_or_numbers")]
    pub common_ports: Vec<String>,
}

impl CustomConfig {
    /// Load and validate the custom configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read custom config: {}", path.display()))?;
        let config: CustomConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse custom config: {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Reject values that could not safely appear inside an nft rule.
    pub fn validate(&self) -> Result<(), HookError> {
        for user in &self.bypass_users {
            if !is_valid_uid(user) {
                return Err(HookError::InvalidUid(user.clone()));
            }
        }
        for port in &self.common_ports {
            if !is_valid_port_spec(port) {
                return Err(HookError::InvalidPort(port.clone()));
            }
        }
        Ok(())
    }
}

/// A uid token is either a numeric uid or a conservative user name.
fn is_valid_uid(value: &str) -> bool {
    if value.is_empty() || value.len() > 32 {
        return false;
    }
    if value.bytes().all(|b| b.is_ascii_digit()) {
        return true;
    }

    // Same shape useradd accepts: stricter first byte, then word characters.
    let mut bytes = value.bytes();
    matches!(bytes.next(), Some(b) if b.is_ascii_lowercase() || b == b'_')
        && bytes.all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-')
}

/// A port specifier is a single port or an ordered `lo-hi` range.
fn is_valid_port_spec(value: &str) -> bool {
    match value.split_once('-') {
        Some((lo, hi)) => match (parse_port(lo), parse_port(hi)) {
            (Some(lo), Some(hi)) => lo <= hi,
            _ => false,
        },
        None => parse_port(value).is_some(),
    }
}

fn parse_port(value: &str) -> Option<u16> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Accept both JSON strings and JSON numbers.
///
/// The legacy hook spliced raw JSON values into the rule text, so existing
/// operator configs carry uids and ports in either form.
fn strings_or_numbers<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|value| match value {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(serde::de::Error::custom(format!(
                "expected string or number, got {other}"
            ))),
        })
        .collect()
}
