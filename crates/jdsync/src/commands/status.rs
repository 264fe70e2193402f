//! Status command - shows stored settings and sync state.

use anyhow::Result;
use chrono::{DateTime, Local};
use clap::Args;
use console::{Style, style};
use serde::Serialize;

use jdsync_config::{PanelSettings, mask_secret};

use super::Context;

/// Arguments for the status command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Also show the cached sync state of this account
    #[arg(short, long)]
    pub account: Option<String>,
}

/// Status for JSON output.
#[derive(Debug, Serialize)]
struct StatusOutput {
    store: String,
    panel_url: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    update_interval_secs: u64,
    bypass: bool,
    complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    problem: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    account: Option<AccountOutput>,
}

#[derive(Debug, Serialize)]
struct AccountOutput {
    account: String,
    cookie: Option<String>,
    last_update: Option<String>,
}

/// Run the status command.
pub async fn run(args: StatusArgs, ctx: &Context) -> Result<()> {
    let store = ctx.sync_store();
    let settings = store.load_config()?;
    let bypass = store.bypass_enabled()?;
    let problem = settings.validate().err().map(|e| e.to_string());

    let account = match args.account {
        Some(account) => {
            let entry = store.cache_entry(&account)?;
            Some(AccountOutput {
                cookie: entry.last_cookie_value.as_deref().map(mask_secret),
                last_update: format_epoch_ms(entry.last_update_epoch_ms),
                account,
            })
        }
        None => None,
    };

    let output = StatusOutput {
        store: ctx.store_path.display().to_string(),
        panel_url: settings.panel_url.clone(),
        client_id: settings.client_id.as_deref().map(mask_secret),
        client_secret: settings.client_secret.as_deref().map(mask_secret),
        update_interval_secs: settings.update_interval_secs,
        bypass,
        complete: problem.is_none(),
        problem,
        account,
    };

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_status(&output, &settings);
    }

    Ok(())
}

fn print_status(output: &StatusOutput, settings: &PanelSettings) {
    let green = Style::new().green();
    let red = Style::new().red();
    let dim = Style::new().dim();
    let unset = || dim.apply_to("(not set)").to_string();

    println!();
    println!("{}", style("jdsync Status").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();

    if output.complete {
        println!("  {} {}", dim.apply_to("Config:"), green.apply_to("● complete"));
    } else {
        println!("  {} {}", dim.apply_to("Config:"), red.apply_to("● incomplete"));
        if let Some(problem) = &output.problem {
            println!("  {} {}", dim.apply_to("Problem:"), problem);
        }
    }
    println!(
        "  {} {}",
        dim.apply_to("Panel:"),
        settings.panel_url.clone().unwrap_or_else(unset)
    );
    println!(
        "  {} {}",
        dim.apply_to("Client ID:"),
        output.client_id.clone().unwrap_or_else(unset)
    );
    println!(
        "  {} {}",
        dim.apply_to("Secret:"),
        output.client_secret.clone().unwrap_or_else(unset)
    );
    println!(
        "  {} {}s",
        dim.apply_to("Interval:"),
        output.update_interval_secs
    );
    println!(
        "  {} {}",
        dim.apply_to("Bypass:"),
        if output.bypass { "armed" } else { "off" }
    );
    println!("  {} {}", dim.apply_to("Store:"), output.store);

    if let Some(account) = &output.account {
        println!();
        println!("{}", dim.apply_to("─".repeat(40)));
        println!();
        println!("  {} {}", dim.apply_to("Account:"), account.account);
        println!(
            "  {} {}",
            dim.apply_to("Cookie:"),
            account.cookie.clone().unwrap_or_else(unset)
        );
        println!(
            "  {} {}",
            dim.apply_to("Synced:"),
            account.last_update.clone().unwrap_or_else(|| "never".to_string())
        );
    }

    if !output.complete {
        println!();
        println!(
            "  {}",
            dim.apply_to("Set values with: jdsync config set <key> <value>")
        );
    }
    println!();
}

fn format_epoch_ms(ms: i64) -> Option<String> {
    if ms <= 0 {
        return None;
    }
    DateTime::from_timestamp_millis(ms)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_epoch_ms() {
        assert_eq!(format_epoch_ms(0), None);
        assert!(format_epoch_ms(1_700_000_000_000).is_some_and(|s| s.starts_with("2023-11-1")));
    }
}
