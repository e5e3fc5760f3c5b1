//! Chunked route transfer to the watch.
//!
//! A route does not fit into one message, so it is delivered as a strictly
//! ordered handshake. Each message waits for its acknowledgement before the
//! next one is sent; there is no pipelining and no retry.
//!
//! # State Machine
//!
//! ```text
//! start --[steps > 40]--------------------------------> Terminal(TooManySteps)
//! start --[lookup failed]-----------------------------> Terminal(RouteNotFound)
//! start --[otherwise]--> Overview --ack--> Step(0) --ack--> ... Step(N-1) --ack--> Terminal(Success)
//!
//! any stage --send failed--> aborted (nothing further is sent)
//! ```
//!
//! A failed send is logged and ends the transfer silently: the watch sees a
//! prefix of the sequence and is expected to time out. Only the two
//! precondition failures produce a non-success status.
//!
//! # Example
//!
//! ```ignore
//! use wristnav::transfer::{TransferSequencer, TransmissionSession};
//!
//! let sequencer = TransferSequencer::new(sink);
//! let session = TransmissionSession::found(message_number, &route);
//! match sequencer.transmit(&session).await {
//!     TransferOutcome::Completed { steps_sent } => println!("{} steps", steps_sent),
//!     other => println!("transfer ended: {:?}", other),
//! }
//! ```

mod session;

pub use session::TransmissionSession;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::codec::{StatusCode, MAX_STEP_COUNT};
use crate::transport::{MessageSink, TransportError};

/// Position within the transfer handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStage {
    /// Distance, time and icon string.
    Overview,
    /// Step item at the given index.
    Step(usize),
    /// The terminal status message.
    Terminal(StatusCode),
}

impl TransferStage {
    /// First stage for a session.
    fn initial(session: &TransmissionSession) -> Self {
        if session.step_list().len() > MAX_STEP_COUNT {
            TransferStage::Terminal(StatusCode::TooManySteps)
        } else if !session.is_route_found() {
            TransferStage::Terminal(StatusCode::RouteNotFound)
        } else {
            TransferStage::Overview
        }
    }

    /// Stage following an acknowledged send.
    ///
    /// The terminal stage is its own successor; callers stop there.
    fn next(self, step_count: usize) -> Self {
        match self {
            TransferStage::Overview if step_count > 0 => TransferStage::Step(0),
            TransferStage::Step(index) if index + 1 < step_count => TransferStage::Step(index + 1),
            TransferStage::Overview | TransferStage::Step(_) => {
                TransferStage::Terminal(StatusCode::Success)
            }
            TransferStage::Terminal(code) => TransferStage::Terminal(code),
        }
    }
}

impl fmt::Display for TransferStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferStage::Overview => write!(f, "overview"),
            TransferStage::Step(index) => write!(f, "step {}", index),
            TransferStage::Terminal(code) => write!(f, "terminal status {}", code),
        }
    }
}

/// How a transfer ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Every message was delivered, ending with a success status.
    Completed {
        /// Number of step items delivered.
        steps_sent: usize,
    },

    /// Only a non-success terminal status was sent (and delivered).
    Rejected(StatusCode),

    /// A send failed; nothing after `stage` was sent.
    Aborted {
        /// Stage whose send failed.
        stage: TransferStage,
        /// Transport failure.
        error: TransportError,
    },
}

impl TransferOutcome {
    /// Check if the watch received the full route.
    pub fn is_completed(&self) -> bool {
        matches!(self, TransferOutcome::Completed { .. })
    }
}

/// Drives the transfer handshake for one session at a time.
///
/// Sessions are not serialized against each other: two `transmit` calls may
/// interleave their messages on the same sink.
#[derive(Clone)]
pub struct TransferSequencer {
    sink: Arc<dyn MessageSink>,
}

impl TransferSequencer {
    /// Create a sequencer sending through `sink`.
    pub fn new(sink: Arc<dyn MessageSink>) -> Self {
        Self { sink }
    }

    /// Deliver a session to the watch.
    ///
    /// Never returns an error: failures are logged and reported through the
    /// returned [`TransferOutcome`].
    pub async fn transmit(&self, session: &TransmissionSession) -> TransferOutcome {
        let message_number = session.message_number();
        let step_count = session.step_count();
        let mut stage = TransferStage::initial(session);

        debug!(message_number, step_count, first_stage = %stage, "Starting route transfer");

        loop {
            let message = session.message_for(stage);

            if let Err(error) = self.sink.send(message).await {
                match stage {
                    TransferStage::Step(index) => warn!(
                        message_number,
                        index,
                        error = %error,
                        "Transfer failed at step item"
                    ),
                    _ => warn!(
                        message_number,
                        stage = %stage,
                        error = %error,
                        "Transfer failed"
                    ),
                }
                return TransferOutcome::Aborted { stage, error };
            }

            match stage {
                TransferStage::Overview => debug!(message_number, "Overview delivered"),
                TransferStage::Step(index) => debug!(message_number, index, "Step item delivered"),
                TransferStage::Terminal(code) => {
                    info!(
                        message_number,
                        code = code.as_u64(),
                        status = code.as_str(),
                        "Transfer completed"
                    );
                    return if code.is_success() {
                        TransferOutcome::Completed {
                            steps_sent: step_count,
                        }
                    } else {
                        TransferOutcome::Rejected(code)
                    };
                }
            }

            stage = stage.next(step_count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_status, OutboundMessage, MAX_STEP_TEXT_LEN};
    use crate::route::RouteResult;
    use futures::future::BoxFuture;
    use std::sync::Mutex;

    /// Sink recording every attempted send, failing the nth attempt if asked.
    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<OutboundMessage>>,
        fail_at: Option<usize>,
    }

    impl RecordingSink {
        fn failing_at(attempt: usize) -> Self {
            Self {
                fail_at: Some(attempt),
                ..Default::default()
            }
        }

        fn sent(&self) -> Vec<OutboundMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl MessageSink for RecordingSink {
        fn send(&self, message: OutboundMessage) -> BoxFuture<'_, Result<(), TransportError>> {
            Box::pin(async move {
                let mut sent = self.sent.lock().unwrap();
                let attempt = sent.len();
                sent.push(message);
                if self.fail_at == Some(attempt) {
                    Err(TransportError::Rejected("injected".into()))
                } else {
                    Ok(())
                }
            })
        }
    }

    fn make_route(steps: usize) -> RouteResult {
        RouteResult {
            distance: 1500,
            time: 420,
            step_list: (0..steps).map(|i| format!("Step {}", i)).collect(),
            step_icons: "b".repeat(steps.min(20)),
            step_positions: Vec::new(),
        }
    }

    fn status_of(message: &OutboundMessage) -> (StatusCode, u32) {
        match message {
            OutboundMessage::Status { value } => decode_status(*value).unwrap(),
            other => panic!("expected status, got {other:?}"),
        }
    }

    async fn run(sink: Arc<RecordingSink>, session: TransmissionSession) -> TransferOutcome {
        TransferSequencer::new(sink).transmit(&session).await
    }

    #[tokio::test]
    async fn test_successful_transfer_order() {
        let sink = Arc::new(RecordingSink::default());
        let outcome = run(sink.clone(), TransmissionSession::found(4, &make_route(3))).await;

        assert_eq!(outcome, TransferOutcome::Completed { steps_sent: 3 });
        let sent = sink.sent();
        assert_eq!(sent.len(), 5);
        assert_eq!(sent[0], OutboundMessage::overview(1500, 420, "bbb"));
        for i in 0..3 {
            assert_eq!(sent[i + 1], OutboundMessage::step_item(&format!("Step {}", i)));
        }
        assert_eq!(status_of(&sent[4]), (StatusCode::Success, 4));
    }

    #[tokio::test]
    async fn test_too_many_steps_sends_only_status() {
        let sink = Arc::new(RecordingSink::default());
        let outcome = run(
            sink.clone(),
            TransmissionSession::found(2, &make_route(MAX_STEP_COUNT + 1)),
        )
        .await;

        assert_eq!(outcome, TransferOutcome::Rejected(StatusCode::TooManySteps));
        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(status_of(&sent[0]), (StatusCode::TooManySteps, 2));
    }

    #[tokio::test]
    async fn test_exactly_max_steps_is_allowed() {
        let sink = Arc::new(RecordingSink::default());
        let outcome = run(
            sink.clone(),
            TransmissionSession::found(0, &make_route(MAX_STEP_COUNT)),
        )
        .await;

        assert_eq!(
            outcome,
            TransferOutcome::Completed {
                steps_sent: MAX_STEP_COUNT
            }
        );
        assert_eq!(sink.sent().len(), MAX_STEP_COUNT + 2);
    }

    #[tokio::test]
    async fn test_route_not_found_sends_only_status() {
        let sink = Arc::new(RecordingSink::default());
        let outcome = run(sink.clone(), TransmissionSession::not_found(9)).await;

        assert_eq!(outcome, TransferOutcome::Rejected(StatusCode::RouteNotFound));
        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(status_of(&sent[0]), (StatusCode::RouteNotFound, 9));
    }

    #[tokio::test]
    async fn test_overview_failure_sends_nothing_else() {
        let sink = Arc::new(RecordingSink::failing_at(0));
        let outcome = run(sink.clone(), TransmissionSession::found(1, &make_route(3))).await;

        assert!(matches!(
            outcome,
            TransferOutcome::Aborted {
                stage: TransferStage::Overview,
                ..
            }
        ));
        assert_eq!(sink.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_step_failure_aborts_without_status() {
        // attempts: 0 overview, 1 step 0, 2 step 1
        let sink = Arc::new(RecordingSink::failing_at(2));
        let outcome = run(sink.clone(), TransmissionSession::found(1, &make_route(4))).await;

        assert!(matches!(
            outcome,
            TransferOutcome::Aborted {
                stage: TransferStage::Step(1),
                ..
            }
        ));
        let sent = sink.sent();
        assert_eq!(sent.len(), 3);
        assert!(sent.iter().all(|m| !m.is_terminal()));
    }

    #[tokio::test]
    async fn test_terminal_status_failure_is_reported() {
        let sink = Arc::new(RecordingSink::failing_at(3));
        let outcome = run(sink.clone(), TransmissionSession::found(1, &make_route(2))).await;

        assert!(matches!(
            outcome,
            TransferOutcome::Aborted {
                stage: TransferStage::Terminal(StatusCode::Success),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_empty_step_list_goes_straight_to_success() {
        let sink = Arc::new(RecordingSink::default());
        let outcome = run(sink.clone(), TransmissionSession::found(0, &make_route(0))).await;

        assert_eq!(outcome, TransferOutcome::Completed { steps_sent: 0 });
        let sent = sink.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(status_of(&sent[1]), (StatusCode::Success, 0));
    }

    #[tokio::test]
    async fn test_long_steps_are_truncated() {
        let mut route = make_route(1);
        route.step_list[0] = "z".repeat(400);
        let sink = Arc::new(RecordingSink::default());
        run(sink.clone(), TransmissionSession::found(0, &route)).await;

        match &sink.sent()[1] {
            OutboundMessage::StepItem { text } => assert_eq!(text.len(), MAX_STEP_TEXT_LEN),
            other => panic!("expected step item, got {other:?}"),
        }
    }

    #[test]
    fn test_stage_progression() {
        assert_eq!(TransferStage::Overview.next(2), TransferStage::Step(0));
        assert_eq!(TransferStage::Step(0).next(2), TransferStage::Step(1));
        assert_eq!(
            TransferStage::Step(1).next(2),
            TransferStage::Terminal(StatusCode::Success)
        );
        assert_eq!(
            TransferStage::Overview.next(0),
            TransferStage::Terminal(StatusCode::Success)
        );
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_step_items_sent_in_order(steps in 0usize..=MAX_STEP_COUNT, number in 0u32..1000) {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .build()
                    .unwrap();
                let sink = Arc::new(RecordingSink::default());
                let outcome = runtime.block_on(run(
                    sink.clone(),
                    TransmissionSession::found(number, &make_route(steps)),
                ));

                prop_assert_eq!(outcome, TransferOutcome::Completed { steps_sent: steps });
                let sent = sink.sent();
                prop_assert_eq!(sent.len(), steps + 2);
                for (i, message) in sent[1..=steps].iter().enumerate() {
                    let expected = OutboundMessage::step_item(&format!("Step {}", i));
                    prop_assert_eq!(message, &expected);
                }
                prop_assert_eq!(status_of(&sent[steps + 1]), (StatusCode::Success, number));
            }

            #[test]
            fn test_oversized_routes_send_single_status(extra in 1usize..60, number in 0u32..1000) {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .build()
                    .unwrap();
                let sink = Arc::new(RecordingSink::default());
                runtime.block_on(run(
                    sink.clone(),
                    TransmissionSession::found(number, &make_route(MAX_STEP_COUNT + extra)),
                ));

                let sent = sink.sent();
                prop_assert_eq!(sent.len(), 1);
                prop_assert_eq!(status_of(&sent[0]), (StatusCode::TooManySteps, number));
            }
        }
    }
}
