//! Message transport to the watch.
//!
//! Delivery of a single message is opaque to the bridge: a send either gets
//! acknowledged or fails. The [`MessageSink`] trait captures exactly that, and
//! [`ChannelSink`] provides an in-process implementation where the receiving
//! side acknowledges each [`Delivery`] explicitly.
//!
//! # Architecture
//!
//! ```text
//! Bridge ── send(msg) ──► ChannelSink ──► mpsc ──► Delivery { message, ack }
//!    ▲                                                    │
//!    └──────────────── oneshot ack / nack ◄──────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use wristnav::transport::{ChannelSink, MessageSink};
//!
//! let (sink, mut deliveries) = ChannelSink::new(16);
//! tokio::spawn(async move {
//!     while let Some(delivery) = deliveries.recv().await {
//!         println!("watch got {}", delivery.message());
//!         delivery.ack();
//!     }
//! });
//! sink.send(OutboundMessage::current_step(3)).await?;
//! ```

use std::sync::Arc;

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::codec::OutboundMessage;

/// Default channel capacity for pending deliveries.
pub const DEFAULT_DELIVERY_CHANNEL_CAPACITY: usize = 64;

/// Errors reported by the transport for a single send.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The watch (or the channel to it) rejected the message.
    #[error("Message rejected: {0}")]
    Rejected(String),

    /// The transport has shut down.
    #[error("Transport channel is closed")]
    Closed,

    /// The receiver dropped the delivery without answering.
    #[error("Delivery dropped without acknowledgement")]
    Unacknowledged,
}

/// Asynchronous, acknowledgement-based message send.
pub trait MessageSink: Send + Sync {
    /// Send one message and wait for its acknowledgement.
    fn send(&self, message: OutboundMessage) -> BoxFuture<'_, Result<(), TransportError>>;
}

impl<T> MessageSink for Arc<T>
where
    T: MessageSink + ?Sized,
{
    fn send(&self, message: OutboundMessage) -> BoxFuture<'_, Result<(), TransportError>> {
        (**self).send(message)
    }
}

/// A message waiting for the receiver's verdict.
#[derive(Debug)]
pub struct Delivery {
    message: OutboundMessage,
    ack_tx: oneshot::Sender<Result<(), TransportError>>,
}

impl Delivery {
    /// The message being delivered.
    pub fn message(&self) -> &OutboundMessage {
        &self.message
    }

    /// Acknowledge successful delivery.
    pub fn ack(self) {
        let _ = self.ack_tx.send(Ok(()));
    }

    /// Report a failed delivery.
    pub fn nack(self, reason: impl Into<String>) {
        let _ = self.ack_tx.send(Err(TransportError::Rejected(reason.into())));
    }

    /// Take the message, acknowledging it.
    pub fn accept(self) -> OutboundMessage {
        let _ = self.ack_tx.send(Ok(()));
        self.message
    }
}

/// In-process transport backed by a Tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    delivery_tx: mpsc::Sender<Delivery>,
}

impl ChannelSink {
    /// Create a sink and the receiver that must acknowledge its deliveries.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Delivery>) {
        let (delivery_tx, delivery_rx) = mpsc::channel(capacity.max(1));
        (Self { delivery_tx }, delivery_rx)
    }
}

impl MessageSink for ChannelSink {
    fn send(&self, message: OutboundMessage) -> BoxFuture<'_, Result<(), TransportError>> {
        Box::pin(async move {
            let (ack_tx, ack_rx) = oneshot::channel();
            self.delivery_tx
                .send(Delivery { message, ack_tx })
                .await
                .map_err(|_| TransportError::Closed)?;
            ack_rx.await.map_err(|_| TransportError::Unacknowledged)?
        })
    }
}
