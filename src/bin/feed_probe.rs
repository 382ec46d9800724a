// Connects to the configured feed for the addresses given on the command
// line and logs each normalized transaction. Nothing is stored.
//
//   cargo run --bin feed_probe -- 0xabc... [0xdef...] [--limit N]

use futures::StreamExt;
use wallet_watch_service::{config::Config, feed, validation::validate_eth_address};
use tracing::{error, info, Level};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Setup tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let mut addresses = Vec::new();
    let mut limit: Option<usize> = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--limit" {
            limit = args.next().and_then(|v| v.parse().ok());
            continue;
        }
        addresses.push(validate_eth_address(&arg)?);
    }

    if addresses.is_empty() {
        return Err("usage: feed_probe <address>... [--limit N]".into());
    }

    let config = Config::from_env();
    let client = feed::build_feed_client(&config)?;

    info!("Subscribing to {} feed for {} addresses", client.provider(), addresses.len());
    let mut stream = client.subscribe(&addresses).await?;

    let mut seen = 0usize;
    loop {
        let next = tokio::select! {
            next = stream.next() => next,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        };

        match next {
            Some(Ok(tx)) => {
                seen += 1;
                info!(
                    "#{} {} from {} to {} value {}",
                    seen,
                    tx.hash,
                    tx.from,
                    tx.to.as_deref().unwrap_or("-"),
                    tx.value.as_deref().unwrap_or("-")
                );
                if limit.is_some_and(|limit| seen >= limit) {
                    break;
                }
            }
            Some(Err(e)) => {
                error!("Feed error: {}", e);
                return Err(e.into());
            }
            None => {
                info!("Feed closed the stream");
                break;
            }
        }
    }

    info!("Received {} transactions", seen);
    Ok(())
}
