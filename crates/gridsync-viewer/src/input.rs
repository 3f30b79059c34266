//! Parsing of operator input lines into injection commands.
//!
//! One command per line: `x y z state`, whitespace separated. Blank lines
//! and lines starting with `#` are skipped.

use std::str::FromStr;

use gridsync_types::Command;

use crate::error::ViewerError;

/// Parse one input line. Returns `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<Command>, ViewerError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let fields: Vec<&str> = trimmed.split_whitespace().collect();
    let [x, y, z, state] = fields.as_slice() else {
        return Err(ViewerError::BadLine(trimmed.to_owned()));
    };

    let command = Command::inject_state(
        field("x", x)?,
        field("y", y)?,
        field("z", z)?,
        field("state", state)?,
    )?;
    Ok(Some(command))
}

fn field<T: FromStr>(name: &'static str, raw: &str) -> Result<T, ViewerError> {
    raw.parse().or(Err(ViewerError::BadField {
        field: name,
        value: raw.to_owned(),
    }))
}
