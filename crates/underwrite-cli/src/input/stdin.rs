use serde_json::Value;
use std::io::{self, Read};

use super::CliResult;

/// Read JSON from stdin when data is being piped. None on a TTY, so
/// flag-only invocations still get a useful error from the caller.
pub fn read_stdin() -> CliResult<Option<Value>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    Ok(Some(serde_json::from_str(trimmed)?))
}
