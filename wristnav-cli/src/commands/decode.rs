//! Decode-status command - unpack a SUCCESS field value.

use wristnav::codec::{decode_status, STATUS_PADDING};

use crate::error::CliError;

/// Run the decode-status command.
pub fn run(value: u64) -> Result<(), CliError> {
    println!("{}", describe(value)?);
    Ok(())
}

fn describe(value: u64) -> Result<String, CliError> {
    let (code, message_number) = decode_status(value).map_err(|e| {
        CliError::InvalidInput(format!(
            "{} (value {} = code {} + request {} * {})",
            e,
            value,
            value % STATUS_PADDING,
            value / STATUS_PADDING,
            STATUS_PADDING
        ))
    })?;
    Ok(format!("code: {}\nrequest: {}", code, message_number))
}
