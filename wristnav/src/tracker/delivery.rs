//! Current-step update delivery with a single retry.

use tracing::{debug, warn};

use crate::codec::OutboundMessage;
use crate::transport::MessageSink;

/// Result of delivering a current-step update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDelivery {
    /// Delivered on the first attempt.
    Delivered,
    /// First attempt failed, the retry succeeded.
    DeliveredOnRetry,
    /// Both attempts failed; the update was dropped.
    Dropped,
}

impl StepDelivery {
    /// Check if the watch received the update.
    pub fn is_delivered(&self) -> bool {
        !matches!(self, StepDelivery::Dropped)
    }
}

/// Send a CURRENT update, retrying exactly once on failure.
///
/// Dropped updates are not queued: the next sample that advances the step
/// sends a newer index anyway.
pub async fn send_current_step(sink: &dyn MessageSink, step: u32) -> StepDelivery {
    match sink.send(OutboundMessage::current_step(step)).await {
        Ok(()) => {
            debug!(step, "Current step sent");
            return StepDelivery::Delivered;
        }
        Err(e) => debug!(step, error = %e, "Current step send failed, retrying once"),
    }

    match sink.send(OutboundMessage::current_step(step)).await {
        Ok(()) => {
            debug!(step, "Current step sent on retry");
            StepDelivery::DeliveredOnRetry
        }
        Err(e) => {
            warn!(step, error = %e, "Transmission of current step failed");
            StepDelivery::Dropped
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;
    use futures::future::BoxFuture;
    use parking_lot::Mutex;

    /// Sink failing its first `failures` sends.
    struct FlakySink {
        failures: usize,
        attempts: Mutex<Vec<OutboundMessage>>,
    }

    impl FlakySink {
        fn new(failures: usize) -> Self {
            Self {
                failures,
                attempts: Mutex::new(Vec::new()),
            }
        }
    }

    impl MessageSink for FlakySink {
        fn send(&self, message: OutboundMessage) -> BoxFuture<'_, Result<(), TransportError>> {
            Box::pin(async move {
                let mut attempts = self.attempts.lock();
                attempts.push(message);
                if attempts.len() <= self.failures {
                    Err(TransportError::Rejected("busy".into()))
                } else {
                    Ok(())
                }
            })
        }
    }

    #[tokio::test]
    async fn test_first_attempt_succeeds() {
        let sink = FlakySink::new(0);
        assert_eq!(send_current_step(&sink, 4).await, StepDelivery::Delivered);
        assert_eq!(sink.attempts.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_retry_succeeds() {
        let sink = FlakySink::new(1);
        assert_eq!(
            send_current_step(&sink, 4).await,
            StepDelivery::DeliveredOnRetry
        );
        let attempts = sink.attempts.lock();
        assert_eq!(attempts.len(), 2);
        assert!(attempts
            .iter()
            .all(|m| *m == OutboundMessage::current_step(4)));
    }

    #[tokio::test]
    async fn test_index_is_sent_unchanged() {
        let sink = FlakySink::new(0);
        send_current_step(&sink, u32::MAX).await;
        assert_eq!(
            *sink.attempts.lock(),
            vec![OutboundMessage::current_step(u32::MAX)]
        );
    }

    #[tokio::test]
    async fn test_retry_only_once() {
        let sink = FlakySink::new(5);
        let result = send_current_step(&sink, 4).await;
        assert_eq!(result, StepDelivery::Dropped);
        assert!(!result.is_delivered());
        assert_eq!(sink.attempts.lock().len(), 2);
    }
}
