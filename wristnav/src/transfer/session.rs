//! Per-request transfer state.

use crate::codec::{MessageNumber, OutboundMessage, MAX_STEP_COUNT};
use crate::route::RouteResult;

use super::TransferStage;

/// Everything needed to deliver one route to the watch.
///
/// Created per accepted search request and dropped once the transfer ends.
#[derive(Debug, Clone, PartialEq)]
pub struct TransmissionSession {
    message_number: MessageNumber,
    route_found: bool,
    distance: u32,
    time: u32,
    step_list: Vec<String>,
    step_icons: String,
}

impl TransmissionSession {
    /// Session for a route the backend found.
    pub fn found(message_number: MessageNumber, route: &RouteResult) -> Self {
        Self {
            message_number,
            route_found: true,
            distance: route.distance,
            time: route.time,
            step_list: route.step_list.clone(),
            step_icons: route.step_icons.clone(),
        }
    }

    /// Session for a failed lookup.
    pub fn not_found(message_number: MessageNumber) -> Self {
        Self {
            message_number,
            route_found: false,
            distance: 0,
            time: 0,
            step_list: Vec::new(),
            step_icons: String::new(),
        }
    }

    /// The request's message number.
    pub fn message_number(&self) -> MessageNumber {
        self.message_number
    }

    /// Whether the lookup produced a route.
    pub fn is_route_found(&self) -> bool {
        self.route_found
    }

    /// Step instructions as returned by the backend.
    pub fn step_list(&self) -> &[String] {
        &self.step_list
    }

    /// Number of step items the transfer sends.
    pub fn step_count(&self) -> usize {
        self.step_list.len().min(MAX_STEP_COUNT)
    }

    /// Build the message for a stage.
    pub(crate) fn message_for(&self, stage: TransferStage) -> OutboundMessage {
        match stage {
            TransferStage::Overview => {
                OutboundMessage::overview(self.distance, self.time, self.step_icons.as_str())
            }
            TransferStage::Step(index) => OutboundMessage::step_item(&self.step_list[index]),
            TransferStage::Terminal(code) => OutboundMessage::status(code, self.message_number),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::StatusCode;

    fn route(steps: usize) -> RouteResult {
        RouteResult {
            distance: 10,
            time: 20,
            step_list: vec!["go".to_string(); steps],
            step_icons: "b".repeat(steps),
            step_positions: Vec::new(),
        }
    }

    #[test]
    fn test_step_count_is_capped() {
        let session = TransmissionSession::found(0, &route(55));
        assert_eq!(session.step_list().len(), 55);
        assert_eq!(session.step_count(), MAX_STEP_COUNT);
    }

    #[test]
    fn test_not_found_session() {
        let session = TransmissionSession::not_found(3);
        assert!(!session.is_route_found());
        assert_eq!(session.step_count(), 0);
        assert_eq!(session.message_number(), 3);
    }

    #[test]
    fn test_message_for_stages() {
        let session = TransmissionSession::found(6, &route(2));
        assert_eq!(
            session.message_for(TransferStage::Overview),
            OutboundMessage::overview(10, 20, "bb")
        );
        assert_eq!(
            session.message_for(TransferStage::Step(1)),
            OutboundMessage::step_item("go")
        );
        assert_eq!(
            session.message_for(TransferStage::Terminal(StatusCode::Success)),
            OutboundMessage::Status { value: 60 }
        );
    }
}
