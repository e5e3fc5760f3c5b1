//! Wire codec for the watch protocol.
//!
//! Translates domain values into the small set of message fields the watch
//! understands and back. Everything here is pure: no I/O, no logging.
//!
//! # Protocol Limits
//!
//! ```text
//! Overview ── DISTANCE, TIME, INSTRUCTION_ICONS   (one message)
//! Step[i]  ── INSTRUCTION_LIST                     (≤ 40 messages, ≤ 128 chars each)
//! Status   ── SUCCESS = code + message_number * 10 (terminal)
//! Current  ── CURRENT                              (live tracking only)
//! ```
//!
//! # Example
//!
//! ```
//! use wristnav::codec::{decode_status, encode_status, StatusCode};
//!
//! let value = encode_status(StatusCode::TooManySteps, 7);
//! assert_eq!(value, 72);
//! assert_eq!(decode_status(value).unwrap(), (StatusCode::TooManySteps, 7));
//! ```

mod icon;
mod message;
mod status;

pub use icon::{decode_icons, encode_icons, StepIcon};
pub use message::{InboundMessage, MessageKey, MessageValue, OutboundMessage};
pub use status::{decode_status, encode_status, StatusCode};

use thiserror::Error;

/// Maximum number of step items a single transfer may carry.
pub const MAX_STEP_COUNT: usize = 40;

/// Maximum characters per step item; longer instructions are truncated.
pub const MAX_STEP_TEXT_LEN: usize = 128;

/// Multiplier separating the status code from the message number.
///
/// Must stay larger than the highest defined [`StatusCode`].
pub const STATUS_PADDING: u64 = 10;

/// Width of the icon string the watch renders (one character per step).
pub const ICON_STRING_WIDTH: usize = 20;

/// Identifier attached to every accepted search request.
pub type MessageNumber = u32;

/// Errors raised when decoding wire values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The status field carried a code outside the defined set.
    #[error("Unknown status code: {0}")]
    UnknownStatusCode(u64),

    /// The status field carried a message number that does not fit.
    #[error("Message number out of range in status value {0}")]
    MessageNumberOverflow(u64),

    /// The icon string contained a character with no icon mapping.
    #[error("Unknown icon character {0:?} at position {1}")]
    UnknownIcon(char, usize),
}

/// Returns the first [`MAX_STEP_TEXT_LEN`] characters of a step instruction.
///
/// Counts characters, not bytes, so multi-byte text is never split.
pub fn truncate_step_text(text: &str) -> &str {
    match text.char_indices().nth(MAX_STEP_TEXT_LEN) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
