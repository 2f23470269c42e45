//! Core hook: patches the v2ray core runtime config before the core starts.

use anyhow::{anyhow, Context, Result};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::cli::HookOptions;
use crate::config::CustomConfig;
use crate::document;

/// Read `config.json`, apply the fake-DNS edits and write it back.
///
/// All edits land on the in-memory document before the single write, so a
/// failure part-way leaves the on-disk file untouched.
pub fn run(options: &HookOptions, custom: &CustomConfig) -> Result<()> {
    let config_path = options.core_config_path();
    let mut doc = document::read(&config_path)?;

    patch(&mut doc, custom)
        .with_context(|| format!("Failed to patch {}", config_path.display()))?;

    document::write(&config_path, &doc)?;
    info!("Patched core config at {}", config_path.display());

    println!("v2rayA core hook {} finished", options.stage);
    Ok(())
}

/// Apply the fake-DNS edits to the core config document.
///
/// The fakedns server entry must be prepended after the per-server
/// `domains` overwrite, otherwise the new entry would receive an exclude
/// list of its own.
pub fn patch(doc: &mut Value, custom: &CustomConfig) -> Result<()> {
    mark_transparent_inbounds(doc)?;

    let dns = ensure_object(doc, "dns")?;

    if !dns.get("servers").is_some_and(Value::is_array) {
        // No server list: the fakedns entry becomes the sole server.
        dns.insert("servers".to_string(), Value::Array(Vec::new()));
    }
    let servers = dns
        .get_mut("servers")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| anyhow!("dns.servers is not an array"))?;
    for server in servers.iter_mut() {
        // Plain-string server addresses carry no domain list to overwrite.
        if let Some(entry) = server.as_object_mut() {
            entry.insert(
                "domains".to_string(),
                json!(custom.fake_dns_exclude_domains),
            );
        }
    }
    servers.insert(0, json!({ "address": "fakedns" }));

    dns.insert("domainMatcher".to_string(), json!("mph"));

    ensure_object(doc, "routing")?.insert("domainStrategy".to_string(), json!("IpIfNonMatch"));

    Ok(())
}

/// Append "fakedns" to `sniffing.destOverride` on every transparent inbound.
fn mark_transparent_inbounds(doc: &mut Value) -> Result<()> {
    let inbounds = doc
        .get_mut("inbounds")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| anyhow!("core config has no inbounds array"))?;

    for inbound in inbounds.iter_mut() {
        let transparent = inbound
            .get("tag")
            .and_then(Value::as_str)
            .is_some_and(|tag| tag.contains("transparent"));
        if !transparent {
            continue;
        }

        let dest_override = inbound
            .pointer_mut("/sniffing/destOverride")
            .and_then(Value::as_array_mut)
            .ok_or_else(|| anyhow!("transparent inbound has no sniffing.destOverride list"))?;
        dest_override.push(json!("fakedns"));
    }

    Ok(())
}

/// Fetch a top-level object field, creating it when absent.
fn ensure_object<'a>(doc: &'a mut Value, key: &str) -> Result<&'a mut Map<String, Value>> {
    let root = doc
        .as_object_mut()
        .ok_or_else(|| anyhow!("core config is not a JSON object"))?;
    root.entry(key)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| anyhow!("core config field '{}' is not an object", key))
}
