//! Config command - direct store maintenance.

use anyhow::{Result, bail};
use clap::{Args, Subcommand};

use jdsync_config::{keys, mask_secret};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the value stored under a key
    Get {
        /// Store key (e.g. ql_url, ql_client_id, ql_client_secret)
        key: String,

        /// Print secrets in clear
        #[arg(long)]
        reveal: bool,
    },

    /// Store a value under a key
    Set {
        /// Store key (e.g. ql_url, ql_client_id, ql_client_secret)
        key: String,

        /// Value to store
        value: String,
    },

    /// Force the next sync past the interval check
    Bypass,

    /// Show the store file path
    Path,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Get { key, reveal } => cmd_get(ctx, &key, reveal),
        ConfigCommand::Set { key, value } => cmd_set(ctx, &key, &value),
        ConfigCommand::Bypass => cmd_bypass(ctx),
        ConfigCommand::Path => {
            println!("{}", ctx.store_path.display());
            Ok(())
        }
    }
}

fn cmd_get(ctx: &Context, key: &str, reveal: bool) -> Result<()> {
    let store = ctx.sync_store();
    let value = store.inner().read(key)?;

    let shown = match value {
        Some(v) if key == keys::CLIENT_SECRET && !reveal => Some(mask_secret(&v)),
        other => other,
    };

    if ctx.json_output {
        println!("{}", serde_json::json!({ "key": key, "value": shown }));
    } else {
        match shown {
            Some(v) => println!("{}", v),
            None => bail!("{} is not set", key),
        }
    }
    Ok(())
}

fn cmd_set(ctx: &Context, key: &str, value: &str) -> Result<()> {
    check_value(key, value)?;
    ctx.sync_store().inner().write(key, value)?;
    tracing::info!(key, "Store value updated");
    println!("Set {}", key);
    Ok(())
}

fn cmd_bypass(ctx: &Context) -> Result<()> {
    ctx.sync_store().set_bypass()?;
    println!("Next sync will skip the interval check");
    Ok(())
}

/// Reject values the sync engine would refuse or silently replace.
fn check_value(key: &str, value: &str) -> Result<()> {
    match key {
        keys::PANEL_URL if !value.starts_with("http://") && !value.starts_with("https://") => {
            bail!("{} must start with http:// or https://", key)
        }
        keys::UPDATE_INTERVAL if value.trim().parse::<u64>().is_err() => {
            bail!("{} must be a whole number of seconds", key)
        }
        keys::BYPASS_CHECK if value != "true" && value != "false" => {
            bail!("{} must be true or false", key)
        }
        _ => Ok(()),
    }
}
