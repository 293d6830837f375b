//! Capture codec
//!
//! Encoding and decoding of captured tagged rows, used to record a
//! command's output once and replay it through the processor later.
//!
//! ## Frame Format
//! ```text
//! ┌──────────┬──────────┬──────────┬─────────────────────────────┐
//! │ Kind (1) │ Len (4)  │ CRC (4)  │     Payload (bincode Row)   │
//! └──────────┴──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Frame Kinds
//! - 0x01: ROW - Payload: one serialized row
//!
//! A capture is a plain concatenation of frames; end of stream ends it.

use std::io::{ErrorKind, Read, Write};

use crate::error::{P4Error, Result};
use super::Row;

/// Header size: 1 byte kind + 4 bytes length + 4 bytes CRC
pub const HEADER_SIZE: usize = 9;

/// Default maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

/// Frame kind of a row frame
pub const FRAME_ROW: u8 = 0x01;

// =============================================================================
// Row Encoding/Decoding
// =============================================================================

/// Encode a row as one frame
pub fn encode_row(row: &Row) -> Result<Vec<u8>> {
    let payload = bincode::serialize(row).map_err(|e| P4Error::Serialization(e.to_string()))?;
    let crc = crc32fast::hash(&payload);

    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.push(FRAME_ROW);
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(&crc.to_be_bytes());
    frame.extend_from_slice(&payload);

    Ok(frame)
}

/// Decode one frame from the front of `bytes`
///
/// Returns the row and the number of bytes consumed
pub fn decode_row(bytes: &[u8], max_payload: u32) -> Result<(Row, usize)> {
    if bytes.len() < HEADER_SIZE {
        return Err(P4Error::Protocol(format!(
            "Incomplete frame header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let (payload_len, crc) = parse_header(&bytes[..HEADER_SIZE], max_payload)?;

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(P4Error::Protocol(format!(
            "Incomplete frame payload: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    let row = decode_payload(&bytes[HEADER_SIZE..total_len], crc)?;
    Ok((row, total_len))
}

/// Decode every frame of an in-memory capture
pub fn decode_rows(mut bytes: &[u8], max_payload: u32) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    while !bytes.is_empty() {
        let (row, consumed) = decode_row(bytes, max_payload)?;
        rows.push(row);
        bytes = &bytes[consumed..];
    }
    Ok(rows)
}

/// Validate a header, returning payload length and expected CRC
fn parse_header(header: &[u8], max_payload: u32) -> Result<(usize, u32)> {
    let kind = header[0];
    if kind != FRAME_ROW {
        return Err(P4Error::Protocol(format!(
            "Unknown frame kind: 0x{:02x}",
            kind
        )));
    }

    let payload_len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);
    if payload_len > max_payload {
        return Err(P4Error::Protocol(format!(
            "Frame payload too large: {} bytes (max {})",
            payload_len, max_payload
        )));
    }

    let crc = u32::from_be_bytes([header[5], header[6], header[7], header[8]]);
    Ok((payload_len as usize, crc))
}

fn decode_payload(payload: &[u8], expected_crc: u32) -> Result<Row> {
    let actual = crc32fast::hash(payload);
    if actual != expected_crc {
        return Err(P4Error::Protocol(format!(
            "Frame checksum mismatch: expected 0x{:08x}, got 0x{:08x}",
            expected_crc, actual
        )));
    }
    bincode::deserialize(payload).map_err(|e| P4Error::Serialization(e.to_string()))
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read the next row from a stream
///
/// Returns `None` on a clean end of stream (no partial header)
pub fn read_row<R: Read>(reader: &mut R, max_payload: u32) -> Result<Option<Row>> {
    let mut header = [0u8; HEADER_SIZE];

    // Distinguish clean EOF from a truncated header
    let mut filled = 0;
    while filled < HEADER_SIZE {
        match reader.read(&mut header[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => {
                return Err(P4Error::Protocol(format!(
                    "Truncated frame header: got {} of {} bytes",
                    filled, HEADER_SIZE
                )))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }

    let (payload_len, crc) = parse_header(&header, max_payload)?;

    let mut payload = vec![0u8; payload_len];
    reader.read_exact(&mut payload).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            P4Error::Protocol(format!("Truncated frame payload: expected {} bytes", payload_len))
        } else {
            e.into()
        }
    })?;

    decode_payload(&payload, crc).map(Some)
}

/// Write a row to a stream
pub fn write_row<W: Write>(writer: &mut W, row: &Row) -> Result<()> {
    let bytes = encode_row(row)?;
    writer.write_all(&bytes)?;
    Ok(())
}

/// Read a whole capture
pub fn read_capture<R: Read>(reader: &mut R, max_payload: u32) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    while let Some(row) = read_row(reader, max_payload)? {
        rows.push(row);
    }
    Ok(rows)
}

/// Write a whole capture and flush
pub fn write_capture<W: Write>(writer: &mut W, rows: &[Row]) -> Result<()> {
    for row in rows {
        write_row(writer, row)?;
    }
    writer.flush()?;
    Ok(())
}
