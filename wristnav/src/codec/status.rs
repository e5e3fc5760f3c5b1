//! Terminal status codes and their packed wire encoding.

use std::fmt;

use super::{CodecError, MessageNumber, STATUS_PADDING};

/// Terminal status of a search request.
///
/// The numeric values are part of the wire protocol and must not change.
/// New codes must stay below [`STATUS_PADDING`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StatusCode {
    /// Route transferred completely.
    Success = 0,
    /// The routing backend found no route.
    RouteNotFound = 1,
    /// The route has more steps than the watch can hold.
    TooManySteps = 2,
    /// The phone could not determine its current position.
    NoCurrentPositionFound = 3,
}

// The receiver splits the packed value with `% STATUS_PADDING`.
const _: () = assert!(STATUS_PADDING > StatusCode::NoCurrentPositionFound as u64);

impl StatusCode {
    /// All defined codes in ascending order.
    pub const ALL: [StatusCode; 4] = [
        StatusCode::Success,
        StatusCode::RouteNotFound,
        StatusCode::TooManySteps,
        StatusCode::NoCurrentPositionFound,
    ];

    /// Numeric wire value.
    pub fn as_u64(self) -> u64 {
        self as u64
    }

    /// Look up a code by its numeric wire value.
    pub fn from_u64(value: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|code| code.as_u64() == value)
    }

    /// Check if this code reports a complete transfer.
    pub fn is_success(self) -> bool {
        self == StatusCode::Success
    }

    /// Short name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            StatusCode::Success => "success",
            StatusCode::RouteNotFound => "route_not_found",
            StatusCode::TooManySteps => "too_many_steps",
            StatusCode::NoCurrentPositionFound => "no_current_position",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_str(), self.as_u64())
    }
}

/// Pack a status code and message number into the SUCCESS field value.
///
/// The result is `code + message_number * STATUS_PADDING`, so the watch can
/// recover both halves with a remainder and an integer division.
#[inline]
pub fn encode_status(code: StatusCode, message_number: MessageNumber) -> u64 {
    code.as_u64() + u64::from(message_number) * STATUS_PADDING
}

/// Split a SUCCESS field value back into its status code and message number.
///
/// # Errors
///
/// Returns [`CodecError::UnknownStatusCode`] when the remainder is not a
/// defined code, and [`CodecError::MessageNumberOverflow`] when the quotient
/// does not fit a [`MessageNumber`].
pub fn decode_status(value: u64) -> Result<(StatusCode, MessageNumber), CodecError> {
    let code = StatusCode::from_u64(value % STATUS_PADDING)
        .ok_or(CodecError::UnknownStatusCode(value % STATUS_PADDING))?;
    let message_number = MessageNumber::try_from(value / STATUS_PADDING)
        .map_err(|_| CodecError::MessageNumberOverflow(value))?;
    Ok((code, message_number))
}
