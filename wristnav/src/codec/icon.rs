//! Step icon characters.
//!
//! The watch renders one icon per step from a single string where each
//! character selects an icon. Padding the string to the display width is the
//! routing backend's job; the codec maps characters only.

use super::CodecError;

/// Icon shown next to a step instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepIcon {
    /// Route type marker (car, bike, train, walk).
    Type,
    /// Continue straight.
    Forward,
    /// Turn right.
    Right,
    /// Turn left.
    Left,
    /// U-turn to the right.
    UTurnRight,
    /// U-turn to the left.
    UTurnLeft,
    /// Point-of-interest marker.
    Attr,
    /// Arrival at the destination.
    Final,
}

impl StepIcon {
    /// All icons in wire order (`'a'` through `'h'`).
    pub const ALL: [StepIcon; 8] = [
        StepIcon::Type,
        StepIcon::Forward,
        StepIcon::Right,
        StepIcon::Left,
        StepIcon::UTurnRight,
        StepIcon::UTurnLeft,
        StepIcon::Attr,
        StepIcon::Final,
    ];

    /// Wire character for this icon.
    pub fn to_char(self) -> char {
        match self {
            StepIcon::Type => 'a',
            StepIcon::Forward => 'b',
            StepIcon::Right => 'c',
            StepIcon::Left => 'd',
            StepIcon::UTurnRight => 'e',
            StepIcon::UTurnLeft => 'f',
            StepIcon::Attr => 'g',
            StepIcon::Final => 'h',
        }
    }

    /// Icon for a wire character, if it has one.
    pub fn from_char(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|icon| icon.to_char() == c)
    }
}

/// Build the INSTRUCTION_ICONS string for a sequence of icons.
pub fn encode_icons(icons: &[StepIcon]) -> String {
    icons.iter().map(|icon| icon.to_char()).collect()
}

/// Parse an INSTRUCTION_ICONS string.
///
/// # Errors
///
/// Returns [`CodecError::UnknownIcon`] for the first unmapped character.
pub fn decode_icons(icons: &str) -> Result<Vec<StepIcon>, CodecError> {
    icons
        .chars()
        .enumerate()
        .map(|(pos, c)| StepIcon::from_char(c).ok_or(CodecError::UnknownIcon(c, pos)))
        .collect()
}
