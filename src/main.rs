use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::error;

mod config;
use config::ForgehookConfig;

mod server;
use server::{Event, EventSender};

#[derive(Parser)]
#[command(version)]
struct Opts {
    /// Configuration file for forgehook
    #[arg(short, long)]
    config: PathBuf,
}

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let opts = Opts::parse();
    let config_file = File::open(&opts.config)
        .with_context(|| format!("couldn't open {}:", opts.config.display()))?;
    let config: ForgehookConfig = serde_yaml::from_reader(BufReader::new(config_file))
        .context("couldn't parse config file")?;

    let (sender, receiver) = unbounded_channel();
    tokio::spawn(emit(receiver));

    let rocket = server::rocket(config, EventSender(sender));
    // rocket::Error panics when dropped unhandled, keep only its message
    rocket
        .launch()
        .await
        .map(|_| ())
        .map_err(|err| anyhow::anyhow!(err.to_string()))
}

/// Writes every accepted event to stdout, one JSON document per line.
async fn emit(mut receiver: UnboundedReceiver<Event>) {
    while let Some(event) = receiver.recv().await {
        let line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(e) => {
                error!("couldn't serialize {} event: {}", event.event.kind(), e);
                continue;
            }
        };

        let mut stdout = io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", line).and_then(|_| stdout.flush()) {
            error!("couldn't write event: {}", e);
        }
    }
}
