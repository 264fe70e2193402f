//! Check command - validates settings and tests the panel connection.

use anyhow::{Result, bail};
use clap::Args;
use console::Style;
use serde::Serialize;

use jdsync_client::PanelApi;

use super::Context;

/// Arguments for the check command.
#[derive(Args, Debug)]
pub struct CheckArgs {}

#[derive(Debug, Serialize)]
struct CheckOutput {
    ok: bool,
    panel_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Run the check command.
pub async fn run(_args: CheckArgs, ctx: &Context) -> Result<()> {
    let settings = ctx.sync_store().load_config()?;

    let result = match settings.validate() {
        Ok(config) => {
            let client = ctx.panel_client()?;
            client
                .check_connection(&config)
                .await
                .map(|()| config.panel_url)
                .map_err(|e| e.to_string())
        }
        Err(e) => Err(e.to_string()),
    };

    if ctx.json_output {
        let output = CheckOutput {
            ok: result.is_ok(),
            panel_url: result.as_ref().ok().cloned().or(settings.panel_url.clone()),
            error: result.as_ref().err().cloned(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        let dim = Style::new().dim();
        match &result {
            Ok(url) => {
                println!(
                    "{} {}",
                    Style::new().green().apply_to("● connected"),
                    dim.apply_to(url)
                );
            }
            Err(e) => {
                println!("{} {}", Style::new().red().apply_to("● failed"), e);
            }
        }
    }

    match result {
        Ok(_) => Ok(()),
        Err(e) => bail!("panel check failed: {}", e),
    }
}
