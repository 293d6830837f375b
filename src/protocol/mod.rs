//! Protocol Module
//!
//! Defines the tagged-output data model and message decoding.
//!
//! ## Tagged Output
//!
//! A command's output is a sequence of rows; each row is an ordered
//! key/value map. Two key conventions are reserved:
//!
//! ```text
//! ┌────────────────────┬──────────────────────────────────────────┐
//! │ code<N> / fmt<N>   │ message N of the row (N = 0, 1, 2, ...)  │
//! │ <name><N>          │ member N of a repeated data field        │
//! └────────────────────┴──────────────────────────────────────────┘
//! ```
//!
//! Indices start at 0 and are contiguous: the first missing index ends the
//! sequence.
//!
//! ### Example (access failure)
//! ```text
//! code0 = 822483067
//! fmt0  = Access for user '%user%' has not been enabled by 'p4 protect'.
//! user  = bob
//! ```

mod code;
mod codec;
mod decoder;
mod message;
mod render;
mod row;
mod ztag;

pub use code::{CodeParts, GenericCode, RawCode, Severity, Subsystem};
pub use codec::{
    decode_row, decode_rows, encode_row, read_capture, read_row, write_capture, write_row,
    HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
pub use decoder::{decode, decode_across_rows, MessageDecoder, TaggedDecoder, CODE, FMT};
pub use message::{ServerMessage, SingleMessage};
pub use render::{placeholder_names, render};
pub use row::{indexed_key, IndexedField, Row, Value};
pub use ztag::{format_ztag, parse_ztag};
