//! Engine Module
//!
//! The result processor that turns a command's rows into a typed result or
//! a classified error.
//!
//! ## Responsibilities
//! - Decode each row's messages
//! - Classify them and raise errors through the dispatcher
//! - Apply the command's result policy
//!
//! ## Per-Invocation Flow
//! ```text
//! Dispatched → RowsReceived → PerRowDecode (loop) → Classified ─┬─► Propagate (Err)
//!                                                               └─► Emit (Ok)
//! ```
//!
//! The processor holds no mutable state; one instance can serve any number
//! of threads at once.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::classify::Classify;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::{P4Error, Result};
use crate::protocol::{MessageDecoder, Row, ServerMessage, TaggedDecoder};

// =============================================================================
// Policies and Result Types
// =============================================================================

/// How a command's rows become its result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultPolicy {
    /// Abort on the first Error/Fatal row
    FirstErrorWins,

    /// Keep every row; error rows become error results
    CollectAll,

    /// First Info message is the result
    SingleScalar,
}

impl ResultPolicy {
    pub fn name(self) -> &'static str {
        match self {
            ResultPolicy::FirstErrorWins => "first-error",
            ResultPolicy::CollectAll => "collect-all",
            ResultPolicy::SingleScalar => "scalar",
        }
    }
}

impl fmt::Display for ResultPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResultPolicy {
    type Err = P4Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "first-error" => Ok(ResultPolicy::FirstErrorWins),
            "collect-all" => Ok(ResultPolicy::CollectAll),
            "scalar" => Ok(ResultPolicy::SingleScalar),
            _ => Err(P4Error::InvalidArgument(format!(
                "Unknown result policy: {}",
                s
            ))),
        }
    }
}

/// Status of one collected row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpStatus {
    /// Pure data, or data with a sub-Info message
    Valid,

    /// Carries an Info or Warning message
    Info,

    /// Carries an Error/Fatal message
    Error,
}

/// One result of a collect-all run
#[derive(Debug, Clone, PartialEq)]
pub enum RowResult<T> {
    /// A populated result, with the row's message if it had one
    Valid {
        value: T,
        message: Option<ServerMessage>,
    },

    /// The row reported a failure
    Failed(ServerMessage),
}

impl<T> RowResult<T> {
    pub fn status(&self) -> OpStatus {
        match self {
            RowResult::Failed(_) => OpStatus::Error,
            RowResult::Valid {
                message: Some(message),
                ..
            } if message.is_info_or_error() => OpStatus::Info,
            RowResult::Valid { .. } => OpStatus::Valid,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            RowResult::Valid { value, .. } => Some(value),
            RowResult::Failed(_) => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            RowResult::Valid { value, .. } => Some(value),
            RowResult::Failed(_) => None,
        }
    }

    pub fn message(&self) -> Option<&ServerMessage> {
        match self {
            RowResult::Valid { message, .. } => message.as_ref(),
            RowResult::Failed(message) => Some(message),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RowResult::Failed(_))
    }
}

/// Suppresses repeated rows in a collect-all run
pub trait DedupPolicy {
    /// Identity of a row; `None` means never deduplicated
    fn key(&self, row: &Row) -> Option<String>;
}

/// Keep every row
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDedup;

impl DedupPolicy for NoDedup {
    fn key(&self, _row: &Row) -> Option<String> {
        None
    }
}

/// Keep the first row for each value of one field
#[derive(Debug, Clone)]
pub struct DedupByField(pub String);

impl DedupByField {
    pub fn new(field: impl Into<String>) -> Self {
        Self(field.into())
    }
}

impl DedupPolicy for DedupByField {
    fn key(&self, row: &Row) -> Option<String> {
        row.get(&self.0).map(|v| v.to_text_lossy().into_owned())
    }
}

/// Uniform output of [`ResultProcessor::process`]
#[derive(Debug, Clone, PartialEq)]
pub enum Processed {
    Rows(Vec<Row>),
    Collected(Vec<RowResult<Row>>),
    Scalar(String),
}

// =============================================================================
// Result Processor
// =============================================================================

/// Applies decoding, classification and a result policy to command rows
#[derive(Debug, Clone)]
pub struct ResultProcessor<D = TaggedDecoder> {
    config: Config,
    decoder: D,
}

impl ResultProcessor<TaggedDecoder> {
    /// Create a processor with the standard decoder
    pub fn new(config: Config) -> Self {
        Self::with_decoder(config, TaggedDecoder)
    }
}

impl Default for ResultProcessor<TaggedDecoder> {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl<D: MessageDecoder> ResultProcessor<D> {
    /// Create a processor around a specific decoder
    pub fn with_decoder(config: Config, decoder: D) -> Self {
        Self { config, decoder }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    pub fn dispatcher(&self) -> Dispatcher<'_> {
        Dispatcher::new(&self.config.auth_rules)
    }

    pub fn decode(&self, row: &Row) -> Option<ServerMessage> {
        self.decoder.decode(row)
    }

    /// Decode every row into one composite
    pub fn decode_across_rows(&self, rows: &[Row]) -> Option<ServerMessage> {
        self.decoder.decode_across_rows(rows)
    }

    /// Uniform entry point selecting a policy at runtime
    pub fn process(&self, policy: ResultPolicy, rows: &[Row]) -> Result<Processed> {
        match policy {
            ResultPolicy::FirstErrorWins => self
                .first_error_wins(rows, |row, _| Some(row.clone()))
                .map(Processed::Rows),
            ResultPolicy::CollectAll => self
                .collect_all(rows, &NoDedup, |row, _| row.clone())
                .map(Processed::Collected),
            ResultPolicy::SingleScalar => self.scalar_info(rows, "").map(Processed::Scalar),
        }
    }

    // =========================================================================
    // First-Error-Wins
    // =========================================================================

    /// Build results row by row, aborting on the first Error/Fatal row
    ///
    /// Rows after the failing one are never decoded. `build` sees every
    /// other row with its (non-error) message and may skip it by returning
    /// `None`.
    pub fn first_error_wins<T, F>(&self, rows: &[Row], mut build: F) -> Result<Vec<T>>
    where
        F: FnMut(&Row, Option<ServerMessage>) -> Option<T>,
    {
        let _span = tracing::debug_span!("process", policy = "first-error", rows = rows.len())
            .entered();

        let dispatcher = self.dispatcher();
        let mut results = Vec::with_capacity(rows.len());

        for (i, row) in rows.iter().enumerate() {
            tracing::trace!(row = i, "Decoding row");
            let message = dispatcher.dispatch_opt(self.decoder.decode(row)).map_err(|e| {
                tracing::debug!(row = i, "Aborting on error row: {}", e);
                e
            })?;

            if let Some(value) = build(row, message) {
                results.push(value);
            }
        }

        Ok(results)
    }

    /// Raise the first error among `rows`, producing nothing otherwise
    pub fn check_rows(&self, rows: &[Row]) -> Result<()> {
        self.first_error_wins(rows, |_, _| None::<()>).map(|_| ())
    }

    // =========================================================================
    // Collect-All
    // =========================================================================

    /// Build one result per row; error rows become [`RowResult::Failed`]
    ///
    /// Authentication failures still raise: they invalidate the whole batch.
    /// `dedup` applies to successful rows only.
    pub fn collect_all<T, F, P>(&self, rows: &[Row], dedup: &P, mut build: F) -> Result<Vec<RowResult<T>>>
    where
        F: FnMut(&Row, Option<&ServerMessage>) -> T,
        P: DedupPolicy + ?Sized,
    {
        let _span = tracing::debug_span!("process", policy = "collect-all", rows = rows.len())
            .entered();

        let dispatcher = self.dispatcher();
        let mut seen = HashSet::new();
        let mut results = Vec::with_capacity(rows.len());

        for (i, row) in rows.iter().enumerate() {
            tracing::trace!(row = i, "Decoding row");
            let message = self.decoder.decode(row);

            if let Some(message) = &message {
                dispatcher.check_file_errors(message)?;
            }

            match message {
                Some(message) if message.in_error() => {
                    tracing::debug!(row = i, "Collected error row: {}", message);
                    results.push(RowResult::Failed(message));
                }
                message => {
                    if let Some(key) = dedup.key(row) {
                        if !seen.insert(key) {
                            tracing::trace!(row = i, "Skipping duplicate row");
                            continue;
                        }
                    }
                    let value = build(row, message.as_ref());
                    results.push(RowResult::Valid { value, message });
                }
            }
        }

        Ok(results)
    }

    // =========================================================================
    // Single-Scalar
    // =========================================================================

    /// Text of the first Info-classified message, or `default`
    ///
    /// Error rows seen before it raise. Scanning stops at the first match.
    pub fn scalar_info(&self, rows: &[Row], default: &str) -> Result<String> {
        let _span =
            tracing::debug_span!("process", policy = "scalar", rows = rows.len()).entered();

        let dispatcher = self.dispatcher();
        for row in rows {
            if let Some(message) = dispatcher.dispatch_opt(self.decoder.decode(row))? {
                if message.is_info() {
                    return Ok(message.all_info_strings(&self.config.info_separator));
                }
            }
        }

        tracing::trace!("No info message; using default");
        Ok(default.to_string())
    }

    /// Value of `field` in the first non-error row carrying it, or `default`
    ///
    /// Error rows seen before it raise.
    pub fn scalar_field(&self, rows: &[Row], field: &str, default: &str) -> Result<String> {
        let _span =
            tracing::debug_span!("process", policy = "scalar", rows = rows.len(), field).entered();

        let dispatcher = self.dispatcher();
        for row in rows {
            dispatcher.dispatch_opt(self.decoder.decode(row))?;
            if let Some(value) = row.get(field) {
                return Ok(value.to_text_lossy().into_owned());
            }
        }

        tracing::trace!("Field not present; using default");
        Ok(default.to_string())
    }

    // =========================================================================
    // Info Strings
    // =========================================================================

    /// All Info texts of all rows, raising on the first error row
    pub fn info_string(&self, rows: &[Row]) -> Result<String> {
        let dispatcher = self.dispatcher();
        let mut parts = Vec::new();

        for row in rows {
            if let Some(message) = self.decoder.decode(row) {
                dispatcher.check(&message)?;
                let info = message.all_info_strings(&self.config.info_separator);
                if !info.trim().is_empty() {
                    parts.push(info);
                }
            }
        }

        Ok(parts.join(&self.config.info_separator))
    }

    /// Aggregate all rows into one message, raise if in error, else its Info texts
    pub fn aggregated_info(&self, rows: &[Row]) -> Result<String> {
        let message = self.dispatcher().dispatch_opt(self.decode_across_rows(rows))?;
        Ok(message
            .map(|m| m.all_info_strings(&self.config.info_separator))
            .unwrap_or_default())
    }
}
