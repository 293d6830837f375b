//! Tagged text form
//!
//! The human-readable rendering of tagged output: one `... key value` line
//! per field, records separated by blank lines.
//!
//! ```text
//! ... code0 822483067
//! ... fmt0 Access for user '%user%' has not been enabled by 'p4 protect'.
//! ... user bob
//!
//! ... depotFile //depot/main/a.c
//! ... rev 4
//! ```

use crate::error::{P4Error, Result};
use super::Row;

const FIELD_PREFIX: &str = "... ";

/// Parse tagged text into rows
///
/// A line that does not start with `... ` continues the previous field's
/// value (multi-line descriptions).
pub fn parse_ztag(text: &str) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    let mut current = Row::new();
    let mut last_key: Option<String> = None;

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');

        if line.trim().is_empty() {
            if !current.is_empty() {
                rows.push(std::mem::take(&mut current));
            }
            last_key = None;
            continue;
        }

        if let Some(field) = line.strip_prefix(FIELD_PREFIX) {
            let (key, value) = match field.split_once(' ') {
                Some((key, value)) => (key, value),
                None => (field, ""),
            };
            if key.is_empty() {
                return Err(P4Error::Protocol(format!(
                    "Line {}: empty field name",
                    line_no + 1
                )));
            }
            current.insert(key, value);
            last_key = Some(key.to_string());
            continue;
        }

        // Continuation line
        match &last_key {
            Some(key) => {
                let previous = current.get_str(key).unwrap_or("").to_string();
                current.insert(key.clone(), format!("{}\n{}", previous, line));
            }
            None => {
                return Err(P4Error::Protocol(format!(
                    "Line {}: expected '{}' field line",
                    line_no + 1,
                    FIELD_PREFIX.trim_end()
                )))
            }
        }
    }

    if !current.is_empty() {
        rows.push(current);
    }
    Ok(rows)
}

/// Render rows as tagged text
pub fn format_ztag(rows: &[Row]) -> String {
    let mut out = String::new();
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for (key, value) in row.iter() {
            out.push_str(FIELD_PREFIX);
            out.push_str(key);
            out.push(' ');
            out.push_str(&value.to_text_lossy());
            out.push('\n');
        }
    }
    out
}
