//! Message decoding
//!
//! Scans a row for the `code<N>`/`fmt<N>` convention and builds messages.
//! A row without `code0` is pure data and decodes to `None`.

use super::code::{CodeParts, RawCode};
use super::message::{ServerMessage, SingleMessage};
use super::row::indexed_key;
use super::Row;

/// Key prefix of message codes
pub const CODE: &str = "code";

/// Key prefix of message formats
pub const FMT: &str = "fmt";

/// Turns rows into server messages
///
/// The processor is generic over this trait so alternative decoders (or
/// instrumented ones) can be plugged in.
pub trait MessageDecoder {
    /// Decode the messages of a single row
    fn decode(&self, row: &Row) -> Option<ServerMessage>;

    /// Aggregate the messages of every row into one composite
    fn decode_across_rows(&self, rows: &[Row]) -> Option<ServerMessage> {
        rows.iter()
            .filter_map(|row| self.decode(row))
            .reduce(ServerMessage::merge)
    }

    /// One composite per message-carrying row, in row order
    fn decode_each_row(&self, rows: &[Row]) -> Vec<ServerMessage> {
        rows.iter().filter_map(|row| self.decode(row)).collect()
    }
}

impl<D: MessageDecoder + ?Sized> MessageDecoder for &D {
    fn decode(&self, row: &Row) -> Option<ServerMessage> {
        (**self).decode(row)
    }
}

/// The standard tagged-output decoder
#[derive(Debug, Clone, Copy, Default)]
pub struct TaggedDecoder;

impl TaggedDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode every message of a row, without aggregating
    pub fn decode_messages(&self, row: &Row) -> Vec<SingleMessage> {
        row.indexed(CODE)
            .map_while(|(index, value)| {
                let code = value.as_str().filter(|s| !s.trim().is_empty())?;
                Some(decode_single(row, index, code))
            })
            .collect()
    }
}

impl MessageDecoder for TaggedDecoder {
    fn decode(&self, row: &Row) -> Option<ServerMessage> {
        ServerMessage::new(self.decode_messages(row))
    }
}

fn decode_single(row: &Row, index: usize, code: &str) -> SingleMessage {
    let (raw_code, parts) = match RawCode::parse(code) {
        Ok(raw) => (raw, raw.decompose()),
        Err(e) => {
            tracing::warn!("Unparsable message code at index {}: {}", index, e);
            (RawCode::new(0), CodeParts::unparsable())
        }
    };

    let format = row
        .get(&indexed_key(FMT, index))
        .map(|v| v.to_text_lossy().into_owned())
        .unwrap_or_default();

    tracing::trace!(index, code = raw_code.value(), severity = %parts.severity, "Decoded message");

    SingleMessage::from_row(raw_code, parts, &format, row, index)
}

/// Decode a row with the standard decoder
pub fn decode(row: &Row) -> Option<ServerMessage> {
    TaggedDecoder.decode(row)
}

/// Aggregate all rows with the standard decoder
pub fn decode_across_rows(rows: &[Row]) -> Option<ServerMessage> {
    TaggedDecoder.decode_across_rows(rows)
}
