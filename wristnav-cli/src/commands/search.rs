//! Search command - run one search against fixture collaborators.
//!
//! Plays the watch's part: every outbound message is printed and
//! acknowledged. When the route is tracked and a position track is given,
//! the samples are replayed so CURRENT updates can be observed.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use wristnav::bridge::{Bridge, SearchReport, TrackingDecision};
use wristnav::codec::{decode_status, OutboundMessage};
use wristnav::tracker::{PositionBroadcaster, PositionSample};
use wristnav::transport::{ChannelSink, Delivery, DEFAULT_DELIVERY_CHANNEL_CAPACITY};

use crate::error::CliError;
use crate::fixture::{load_positions, JsonRouteLookup};
use crate::runner::CliRunner;

/// Arguments for the search command.
pub struct SearchArgs {
    pub input: String,
    pub route: PathBuf,
    pub positions: Option<PathBuf>,
    pub interval_ms: u64,
    pub json: bool,
}

/// Run the search command.
pub fn run(runner: &CliRunner, args: SearchArgs) -> Result<(), CliError> {
    runner.log_startup("search");

    if args.input.is_empty() {
        return Err(CliError::InvalidInput(
            "search input must start with a route type digit, e.g. \"1Brockhofweg 9\"".to_string(),
        ));
    }

    let lookup = Arc::new(JsonRouteLookup::load(&args.route)?);
    let samples = match &args.positions {
        Some(path) => load_positions(path)?,
        None => Vec::new(),
    };

    // Set up signal handler for the replay
    let shutdown = CancellationToken::new();
    let shutdown_handler = shutdown.clone();
    ctrlc::set_handler(move || {
        println!();
        println!("Received shutdown signal, stopping...");
        shutdown_handler.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let config = runner.config().clone();
    runner.runtime().block_on(async move {
        let (sink, deliveries) = ChannelSink::new(DEFAULT_DELIVERY_CHANNEL_CAPACITY);
        let watch = spawn_watch(deliveries, args.json);

        let positions = Arc::new(PositionBroadcaster::new());
        let bridge = Bridge::builder(Arc::new(sink), lookup, positions.clone())
            .config(&config)
            .build();

        let report = bridge
            .handle_search(&args.input)
            .await
            .map_err(|e| CliError::InvalidInput(e.to_string()))?;
        print_report(&report);

        if report.tracking == TrackingDecision::Started && !samples.is_empty() {
            replay(
                &positions,
                &samples,
                Duration::from_millis(args.interval_ms),
                &shutdown,
            )
            .await;
        }

        bridge.shutdown();
        drop(bridge);

        let received = watch.await.unwrap_or(0);
        println!();
        println!("Messages received by watch: {}", received);
        Ok::<(), CliError>(())
    })
}

/// Acknowledge and print deliveries until the sink goes away.
fn spawn_watch(mut deliveries: mpsc::Receiver<Delivery>, json: bool) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut count = 0;
        while let Some(delivery) = deliveries.recv().await {
            let message = delivery.accept();
            count += 1;
            if json {
                println!("{}", message.to_json());
            } else {
                println!("<- {}", describe(&message));
            }
        }
        count
    })
}

/// Human-readable form of a message, with status values unpacked.
fn describe(message: &OutboundMessage) -> String {
    match message {
        OutboundMessage::Status { value } => match decode_status(*value) {
            Ok((code, number)) => format!("{} [{} for request {}]", message, code, number),
            Err(e) => format!("{} [{}]", message, e),
        },
        other => other.to_string(),
    }
}

async fn replay(
    positions: &PositionBroadcaster,
    samples: &[PositionSample],
    interval: Duration,
    shutdown: &CancellationToken,
) {
    println!();
    println!("Replaying {} position samples...", samples.len());

    for sample in samples {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
        debug!(
            latitude = sample.latitude,
            longitude = sample.longitude,
            accuracy = sample.accuracy,
            "Replaying sample"
        );
        positions.publish(*sample);
    }

    // Let the last update reach the watch
    tokio::select! {
        _ = shutdown.cancelled() => {}
        _ = tokio::time::sleep(interval) => {}
    }
}

fn print_report(report: &SearchReport) {
    println!();
    println!("Request:   {}", report.message_number);
    println!("Mode:      {}", report.route_type);
    println!("Address:   {}", report.address);
    println!("Transfer:  {:?}", report.outcome);
    println!("Tracking:  {:?}", report.tracking);
}

#[cfg(test)]
mod tests {
    use super::*;
    use wristnav::codec::StatusCode;

    #[test]
    fn test_describe_status_unpacks_value() {
        let text = describe(&OutboundMessage::status(StatusCode::RouteNotFound, 42));
        assert!(text.contains("SUCCESS=421"), "{}", text);
        assert!(text.contains("for request 42"), "{}", text);
    }

    #[test]
    fn test_describe_unknown_status_code() {
        let text = describe(&OutboundMessage::Status { value: 19 });
        assert!(text.starts_with("status SUCCESS=19 ["), "{}", text);
    }

    #[test]
    fn test_describe_other_messages() {
        assert_eq!(
            describe(&OutboundMessage::current_step(3)),
            "current_step CURRENT=3"
        );
    }
}
