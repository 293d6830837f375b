//! # p4tagged
//!
//! Result processing for Perforce tagged command output:
//! - Decoding of the per-row `code<N>`/`fmt<N>` message sequences
//! - Severity classification and authentication failure detection
//! - Result policies turning rows into values or classified errors
//! - Binary capture of rows for offline replay
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Command Transport                          │
//! │            (rows, or a ConnectionError)                      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Result Processor                           │
//! │      (first-error-wins / collect-all / single-scalar)        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Decoder   │          │ Classifier  │
//!   │ (per row)   │          │ (auth rules)│
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │  Dispatch   │
//!                           │ (Ok / Err)  │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod classify;
pub mod dispatch;
pub mod engine;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ConnectionError, ErrorKind, P4Error, Result};
pub use config::Config;
pub use classify::{classify, detect, AuthFailureKind, AuthRules, Classification, Classify};
pub use dispatch::{dispatch, Dispatcher};
pub use engine::{ResultPolicy, ResultProcessor, RowResult};
pub use network::{CommandTransport, ReplayTransport, Session};
pub use protocol::{Row, ServerMessage, SingleMessage, Value};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of p4tagged
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
