//! Transparent hook: installs firewall bypass rules after interception is up.
//!
//! Inserts return-early rules into the nftables chain v2rayA creates for
//! transparent interception. Insertions are independent `nft` invocations;
//! a failure part-way leaves the earlier rules installed. The rule comment
//! marker makes a re-run skip insertion instead of duplicating the set.

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::HookOptions;
use crate::cmd_abstraction::{run_checked, CommandExecutor};
use crate::config::CustomConfig;

const TABLE_FAMILY: &str = "inet";
const TABLE_NAME: &str = "v2raya";
const CHAIN_NAME: &str = "tp_rule";

/// Marker comment distinguishing rules owned by this hook.
pub const RULE_COMMENT: &str = "v2raya-hook-bypass";

/// Insert the bypass rules, if the v2rayA ruleset exists and lacks them.
pub fn run<E: CommandExecutor>(
    options: &HookOptions,
    custom: &CustomConfig,
    executor: &E,
) -> Result<()> {
    let tables = run_checked(executor, "nft", &["list", "tables"])?;

    if tables.contains(TABLE_NAME) {
        if bypass_rules_present(executor)? {
            debug!(
                "{} {} {} already carries the bypass rules, nothing to insert",
                TABLE_FAMILY, TABLE_NAME, CHAIN_NAME
            );
        } else {
            insert_bypass_rules(executor, custom)?;
        }
    } else {
        // The firewall subsystem may not have created its ruleset yet; an
        // expected race at early post-start, not an error.
        debug!("table {} not present, skipping bypass rules", TABLE_NAME);
    }

    println!("v2rayA transparent hook {} finished", options.stage);
    Ok(())
}

/// Check the interception chain for rules tagged with our comment marker.
fn bypass_rules_present<E: CommandExecutor>(executor: &E) -> Result<bool> {
    let listing = run_checked(
        executor,
        "nft",
        &["list", "chain", TABLE_FAMILY, TABLE_NAME, CHAIN_NAME],
    )?;
    Ok(listing.contains(RULE_COMMENT))
}

fn insert_bypass_rules<E: CommandExecutor>(executor: &E, custom: &CustomConfig) -> Result<()> {
    let mut inserted = 0;

    if custom.bypass_users.is_empty() {
        debug!("bypass_users is empty, skipping the uid rule");
    } else {
        let users = anonymous_set(&custom.bypass_users);
        insert_rule(executor, &["meta", "skuid", &users, "return"])?;
        inserted += 1;
    }

    if custom.common_ports.is_empty() {
        debug!("common_ports is empty, skipping the port rules");
    } else {
        let ports = anonymous_set(&custom.common_ports);
        insert_rule(executor, &["tcp", "dport", "!=", &ports, "return"])?;
        insert_rule(executor, &["udp", "dport", "!=", &ports, "return"])?;
        inserted += 2;
    }

    info!(
        "Inserted {} bypass rules into {} {} {}",
        inserted, TABLE_FAMILY, TABLE_NAME, CHAIN_NAME
    );
    Ok(())
}

/// Insert one rule at the head of the chain, tagged with the marker comment.
fn insert_rule<E: CommandExecutor>(executor: &E, rule: &[&str]) -> Result<()> {
    let mut args = vec!["insert", "rule", TABLE_FAMILY, TABLE_NAME, CHAIN_NAME];
    args.extend_from_slice(rule);
    args.extend_from_slice(&["comment", RULE_COMMENT]);
    run_checked(executor, "nft", &args)?;
    Ok(())
}

/// Format values as an nft anonymous set: `{ a, b, c }`.
fn anonymous_set(values: &[String]) -> String {
    format!("{{ {} }}", values.join(", "))
}
