//! Sync command - feed one intercepted request to the sync engine.
//!
//! The request headers arrive as a JSON object on stdin (or from a file).
//! Whatever happens to the sync, the command exits successfully once the
//! outcome is reported; only unreadable input is an error.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use clap::Args;
use console::Style;
use serde::Serialize;
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tracing::info;

use jdsync_domain::{
    MemoryNotifier, Notification, Notifier, SharedNotifier, SyncOutcome, SyncService, header_value,
};

use super::Context;

/// User-Agent prefix of the mobile client whose requests carry the cookie.
pub const DEFAULT_UA_PREFIX: &str = "JD4iPhone";

/// Arguments for the sync command.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Read request headers from this JSON file instead of stdin
    #[arg(long)]
    pub headers: Option<PathBuf>,

    /// Only handle requests whose User-Agent starts with this prefix
    #[arg(long, default_value = DEFAULT_UA_PREFIX)]
    pub ua_prefix: String,

    /// Handle requests from any client
    #[arg(long)]
    pub any_client: bool,
}

/// Sync result for JSON output.
#[derive(Debug, Serialize)]
struct SyncOutput {
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    notifications: Vec<Notification>,
}

/// Prints notifications to stdout as they are sent.
#[derive(Debug, Default)]
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, title: &str, subtitle: &str, body: &str) {
        let bold = Style::new().bold();
        let dim = Style::new().dim();

        println!();
        println!("{} {}", bold.apply_to(title), dim.apply_to(subtitle));
        for line in body.lines() {
            println!("  {}", line);
        }
    }
}

/// Run the sync command.
pub async fn run(args: SyncArgs, ctx: &Context) -> Result<()> {
    let raw = read_input(args.headers.as_ref()).await?;
    let headers = parse_headers(&raw)?;

    if !args.any_client && !is_target_client(&headers, &args.ua_prefix) {
        info!(prefix = %args.ua_prefix, "Request not from target client, skipping");
        if ctx.json_output {
            print_json(&SyncOutput {
                outcome: "skipped",
                account: None,
                plan: None,
                reason: Some("client filtered".to_string()),
                notifications: Vec::new(),
            })?;
        }
        return Ok(());
    }

    let recorder = Arc::new(MemoryNotifier::new());
    let notifier: SharedNotifier = if ctx.json_output {
        recorder.clone()
    } else {
        Arc::new(ConsoleNotifier)
    };

    let service = SyncService::new(
        ctx.sync_store(),
        Arc::new(ctx.panel_client()?),
        notifier,
    );
    let outcome = service.handle_request(&headers).await;

    if ctx.json_output {
        print_json(&summarize(&outcome, recorder.take()))?;
    } else if ctx.verbose {
        let dim = Style::new().dim();
        match &outcome {
            SyncOutcome::Done(report) => println!(
                "{} {} ({})",
                dim.apply_to("Synced:"),
                report.account_id,
                report.plan()
            ),
            SyncOutcome::Aborted(reason) => println!("{} {}", dim.apply_to("Stopped:"), reason),
        }
    }

    Ok(())
}

async fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read headers from {}", path.display())),
        None => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("failed to read headers from stdin")?;
            Ok(raw)
        }
    }
}

/// Parse a JSON object of header name to value.
///
/// Non-string scalar values are kept in their JSON text form; nested values
/// are rejected.
fn parse_headers(raw: &str) -> Result<HashMap<String, String>> {
    let value: Value = serde_json::from_str(raw).context("headers are not valid JSON")?;
    let Value::Object(map) = value else {
        bail!("headers must be a JSON object");
    };

    map.into_iter()
        .map(|(name, value)| match value {
            Value::String(s) => Ok((name, s)),
            Value::Number(_) | Value::Bool(_) => Ok((name, value.to_string())),
            Value::Null => Ok((name, String::new())),
            Value::Array(_) | Value::Object(_) => {
                bail!("header '{}' must be a string", name)
            }
        })
        .collect()
}

fn is_target_client(headers: &HashMap<String, String>, prefix: &str) -> bool {
    header_value(headers, "User-Agent").is_some_and(|ua| ua.starts_with(prefix))
}

fn summarize(outcome: &SyncOutcome, notifications: Vec<Notification>) -> SyncOutput {
    match outcome {
        SyncOutcome::Done(report) => SyncOutput {
            outcome: "done",
            account: Some(report.account_id.clone()),
            plan: Some(report.plan().to_string()),
            reason: None,
            notifications,
        },
        SyncOutcome::Aborted(reason) => SyncOutput {
            outcome: "aborted",
            account: None,
            plan: None,
            reason: Some(reason.to_string()),
            notifications,
        },
    }
}

fn print_json(output: &SyncOutput) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(())
}
