//! Message field keys and the logical messages exchanged with the watch.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{encode_status, truncate_step_text, MessageNumber, StatusCode};

/// Field names shared with the watch app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageKey {
    /// Inbound search request: `{type digit}{address}`.
    Search,
    /// Route distance.
    Distance,
    /// Route duration.
    Time,
    /// One icon character per step.
    InstructionIcons,
    /// A single step instruction.
    InstructionList,
    /// Live current-step index.
    Current,
    /// Packed terminal status.
    Success,
}

impl MessageKey {
    /// Field name as the watch app declares it.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKey::Search => "SEARCH",
            MessageKey::Distance => "DISTANCE",
            MessageKey::Time => "TIME",
            MessageKey::InstructionIcons => "INSTRUCTION_ICONS",
            MessageKey::InstructionList => "INSTRUCTION_LIST",
            MessageKey::Current => "CURRENT",
            MessageKey::Success => "SUCCESS",
        }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageValue {
    /// Integer field.
    Int(i64),
    /// Unsigned integer field too wide for `Int`.
    Unsigned(u64),
    /// String field.
    Text(String),
}

impl fmt::Display for MessageValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageValue::Int(v) => write!(f, "{}", v),
            MessageValue::Unsigned(v) => write!(f, "{}", v),
            MessageValue::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// A message received from the watch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InboundMessage {
    fields: BTreeMap<String, MessageValue>,
}

impl InboundMessage {
    /// Create an empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a message carrying only a SEARCH field.
    pub fn search(text: impl Into<String>) -> Self {
        Self::new().with_field(MessageKey::Search.as_str(), MessageValue::Text(text.into()))
    }

    /// Add a field.
    pub fn with_field(mut self, key: impl Into<String>, value: MessageValue) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Look up a field by name.
    pub fn get(&self, key: &str) -> Option<&MessageValue> {
        self.fields.get(key)
    }

    /// The SEARCH text, if present and non-empty.
    pub fn search_text(&self) -> Option<&str> {
        match self.get(MessageKey::Search.as_str()) {
            Some(MessageValue::Text(text)) if !text.is_empty() => Some(text),
            _ => None,
        }
    }
}

/// A logical message sent to the watch.
///
/// Each variant is delivered as one atomic send.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    /// Route summary: DISTANCE, TIME and INSTRUCTION_ICONS together.
    Overview {
        distance: u32,
        time: u32,
        icons: String,
    },
    /// One INSTRUCTION_LIST entry.
    StepItem { text: String },
    /// CURRENT step index while tracking.
    CurrentStep { index: u32 },
    /// Packed SUCCESS value ending a request.
    Status { value: u64 },
}

impl OutboundMessage {
    /// Build the overview message.
    pub fn overview(distance: u32, time: u32, icons: impl Into<String>) -> Self {
        OutboundMessage::Overview {
            distance,
            time,
            icons: icons.into(),
        }
    }

    /// Build a step item, truncating the instruction to the protocol limit.
    pub fn step_item(text: &str) -> Self {
        OutboundMessage::StepItem {
            text: truncate_step_text(text).to_string(),
        }
    }

    /// Build a current-step update.
    pub fn current_step(index: u32) -> Self {
        OutboundMessage::CurrentStep { index }
    }

    /// Build the terminal status message for a request.
    pub fn status(code: StatusCode, message_number: MessageNumber) -> Self {
        OutboundMessage::Status {
            value: encode_status(code, message_number),
        }
    }

    /// Short name of the message kind for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMessage::Overview { .. } => "overview",
            OutboundMessage::StepItem { .. } => "step_item",
            OutboundMessage::CurrentStep { .. } => "current_step",
            OutboundMessage::Status { .. } => "status",
        }
    }

    /// Check if this message ends a request.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OutboundMessage::Status { .. })
    }

    /// The wire fields of this message.
    pub fn fields(&self) -> Vec<(MessageKey, MessageValue)> {
        match self {
            OutboundMessage::Overview {
                distance,
                time,
                icons,
            } => vec![
                (MessageKey::Distance, MessageValue::Int(i64::from(*distance))),
                (MessageKey::Time, MessageValue::Int(i64::from(*time))),
                (MessageKey::InstructionIcons, MessageValue::Text(icons.clone())),
            ],
            OutboundMessage::StepItem { text } => {
                vec![(MessageKey::InstructionList, MessageValue::Text(text.clone()))]
            }
            OutboundMessage::CurrentStep { index } => {
                vec![(MessageKey::Current, MessageValue::Int(i64::from(*index)))]
            }
            OutboundMessage::Status { value } => vec![(
                MessageKey::Success,
                MessageValue::Unsigned(*value),
            )],
        }
    }

    /// The message as a JSON dictionary keyed by field name.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .fields()
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    MessageValue::Int(v) => serde_json::Value::from(v),
                    MessageValue::Unsigned(v) => serde_json::Value::from(v),
                    MessageValue::Text(s) => serde_json::Value::from(s),
                };
                (key.as_str().to_string(), value)
            })
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

impl fmt::Display for OutboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())?;
        for (key, value) in self.fields() {
            write!(f, " {}={}", key, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::MAX_STEP_TEXT_LEN;

    #[test]
    fn test_overview_fields() {
        let msg = OutboundMessage::overview(1200, 300, "abh");
        let fields = msg.fields();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0], (MessageKey::Distance, MessageValue::Int(1200)));
        assert_eq!(fields[1], (MessageKey::Time, MessageValue::Int(300)));
        assert_eq!(
            fields[2],
            (MessageKey::InstructionIcons, MessageValue::Text("abh".into()))
        );
    }

    #[test]
    fn test_step_item_is_truncated() {
        let msg = OutboundMessage::step_item(&"w".repeat(500));
        match msg {
            OutboundMessage::StepItem { text } => assert_eq!(text.len(), MAX_STEP_TEXT_LEN),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_status_message_packs_value() {
        let msg = OutboundMessage::status(StatusCode::RouteNotFound, 4);
        assert_eq!(msg, OutboundMessage::Status { value: 41 });
        assert!(msg.is_terminal());
    }

    #[test]
    fn test_status_field_keeps_full_value() {
        let top = encode_status(StatusCode::NoCurrentPositionFound, MessageNumber::MAX);
        let msg = OutboundMessage::status(StatusCode::NoCurrentPositionFound, MessageNumber::MAX);

        assert_eq!(
            msg.fields(),
            vec![(MessageKey::Success, MessageValue::Unsigned(top))]
        );
        assert_eq!(msg.to_json(), serde_json::json!({ "SUCCESS": 42_949_672_953u64 }));

        let huge = OutboundMessage::Status { value: u64::MAX };
        assert_eq!(huge.to_json(), serde_json::json!({ "SUCCESS": u64::MAX }));
    }

    #[test]
    fn test_to_json_uses_field_names() {
        let json = OutboundMessage::current_step(5).to_json();
        assert_eq!(json, serde_json::json!({ "CURRENT": 5 }));
    }

    #[test]
    fn test_display() {
        let msg = OutboundMessage::step_item("Turn left");
        assert_eq!(msg.to_string(), "step_item INSTRUCTION_LIST=\"Turn left\"");
    }

    #[test]
    fn test_inbound_search_text() {
        let msg = InboundMessage::search("1Brockhofweg 9");
        assert_eq!(msg.search_text(), Some("1Brockhofweg 9"));
    }

    #[test]
    fn test_inbound_search_missing_or_empty() {
        assert_eq!(InboundMessage::new().search_text(), None);
        assert_eq!(InboundMessage::search("").search_text(), None);

        let numeric = InboundMessage::new().with_field("SEARCH", MessageValue::Int(3));
        assert_eq!(numeric.search_text(), None);
    }

    #[test]
    fn test_inbound_from_json() {
        let msg: InboundMessage =
            serde_json::from_str(r#"{"SEARCH": "3Home", "OTHER": 1}"#).unwrap();
        assert_eq!(msg.search_text(), Some("3Home"));
        assert_eq!(msg.get("OTHER"), Some(&MessageValue::Int(1)));
    }
}
