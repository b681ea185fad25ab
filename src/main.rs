//! CLI for illchi
//!
//! Subcommands:
//! - `listen`: connect as the configured peer and print every message
//! - `send`: deliver a single message to another peer

use std::time::Duration;

use clap::Parser;
use futures_util::StreamExt;
use illchi::config::{Settings, load_config};
use illchi::peer::encode_query;
use illchi::utils::logging;
use illchi::{Client, ClientError, Messages, Payload, Peer, SendOptions};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "illchi", about = "Client for the illchi message relay")]
enum Command {
    /// Connect to the broker and print messages until the connection ends
    Listen {
        /// Connect as this `broker/id` instead of the configured peer
        #[arg(long = "as")]
        peer: Option<String>,
        /// Use ws:// instead of wss://
        #[arg(long)]
        insecure: bool,
        /// Extra `key=value` parameter for the broker (repeatable)
        #[arg(long = "query", value_parser = parse_pair)]
        query: Vec<(String, String)>,
    },
    /// Deliver one message to a peer without connecting
    Send {
        /// Target peer as `broker/id`
        target: String,
        /// Message text
        data: String,
        /// Use http:// instead of https://
        #[arg(long)]
        insecure: bool,
        /// Request timeout in milliseconds, overrides the configured one
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Extra `key=value` parameter for the broker (repeatable)
        #[arg(long = "query", value_parser = parse_pair)]
        query: Vec<(String, String)>,
    },
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cmd = Command::parse();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            logging::init("info");
            error!("Failed to load configuration: {}", e);
            std::process::exit(2);
        }
    };
    logging::init(&config.log.level);

    let result = match cmd {
        Command::Listen {
            peer,
            insecure,
            query,
        } => run_listen(&config, peer, insecure, query).await,
        Command::Send {
            target,
            data,
            insecure,
            timeout_ms,
            query,
        } => run_send(&config, &target, data, insecure, timeout_ms, query).await,
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run_listen(
    config: &Settings,
    peer: Option<String>,
    insecure: bool,
    query: Vec<(String, String)>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut me = match peer {
        Some(text) => Peer::parse(&text),
        None => config.peer.peer(),
    };
    if insecure {
        me = me.insecure();
    }

    let client = Client::connect_as(me.clone(), encode_query(query).as_deref()).await?;
    info!("Connected as {me}");

    tokio::select! {
        res = print_messages(client.messages()) => res?,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Closing connection.");
            client.close();
            client.closed().await;
        }
    }

    info!("Connection closed");
    Ok(())
}

async fn print_messages(mut messages: Messages) -> Result<(), ClientError> {
    while let Some(message) = messages.next().await {
        match message? {
            Payload::Text(text) => println!("{text}"),
            Payload::Binary(bytes) => println!("<{} bytes>", bytes.len()),
        }
    }
    Ok(())
}

async fn run_send(
    config: &Settings,
    target: &str,
    data: String,
    insecure: bool,
    timeout_ms: Option<u64>,
    query: Vec<(String, String)>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut target = Peer::parse(target);
    if insecure {
        target = target.insecure();
    }

    let mut options = SendOptions::default();
    let timeout = match timeout_ms {
        Some(0) => None,
        Some(ms) => Some(Duration::from_millis(ms)),
        None => config.send.timeout(),
    };
    if let Some(timeout) = timeout {
        options = options.timeout(timeout);
    }
    if let Some(query) = encode_query(query) {
        options = options.query(query);
    }

    Client::send(&target, data, options).await?;
    info!("Delivered to {target}");
    Ok(())
}
