use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    ControllerOptions, HttpPredictionClient, QueryListController, DEFAULT_PREDICT_URL,
};
use shared::domain::RecordLookup;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod console;
mod events;

use config::{load_settings, Settings, DEFAULT_CONFIG_PATH};
use console::{Console, Flow, Output};

#[derive(Parser, Debug)]
#[command(about = "Submit text to a prediction service and manage the results")]
struct Args {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[arg(long)]
    predict_url: Option<String>,
    #[arg(long)]
    service_root: Option<String>,
    #[arg(long)]
    lookup: Option<RecordLookup>,
    #[arg(long)]
    log_filter: Option<String>,
}

impl Args {
    fn apply(self, mut settings: Settings) -> Settings {
        if let Some(v) = self.predict_url {
            settings.predict_url = Some(v);
        }
        if let Some(v) = self.service_root {
            settings.service_root = Some(v);
        }
        if let Some(v) = self.lookup {
            settings.record_lookup = v;
        }
        if let Some(v) = self.log_filter {
            settings.log_filter = v;
        }
        settings
    }
}

async fn build_client(settings: &Settings) -> Result<HttpPredictionClient> {
    if let Some(url) = &settings.predict_url {
        return HttpPredictionClient::new(url)
            .with_context(|| format!("invalid predict url '{url}'"));
    }

    if let Some(root) = &settings.service_root {
        match HttpPredictionClient::discover(root).await {
            Ok((client, _links)) => return Ok(client),
            Err(err) => warn!(root = %root, error = %err, "discovery failed, using default endpoint"),
        }
    }

    HttpPredictionClient::new(DEFAULT_PREDICT_URL).context("invalid default predict url")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = load_settings(&args.config);
    let settings = args.apply(settings);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let client = build_client(&settings).await?;
    info!(
        predict_url = %client.predict_url(),
        lookup = %settings.record_lookup,
        "query console starting"
    );

    let controller = QueryListController::new(
        Arc::new(client.clone()),
        ControllerOptions {
            lookup: settings.record_lookup,
        },
    );
    let out: Output = Arc::new(Mutex::new(std::io::stdout()));
    let mut console = Console::new(controller, Some(client), out);

    println!("{}", commands::HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        if console.handle_line(&line).await? == Flow::Quit {
            break;
        }
    }

    console.shutdown().await;
    Ok(())
}
