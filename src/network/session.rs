//! Command session
//!
//! Thin delegators over a transport: marshal arguments, run the command,
//! hand the rows to the result processor under the command's policy.
//!
//! Each operation owns its absence policy. Where an operation turns a
//! missing result into a default, that choice is made here, never in the
//! processor.

use crate::config::Config;
use crate::engine::{DedupByField, ResultProcessor, RowResult};
use crate::error::{P4Error, Result};
use crate::protocol::{MessageDecoder, Row, TaggedDecoder};

use super::CommandTransport;

/// Field present in an existing client/label/user spec
const UPDATE_KEY: &str = "Update";

/// Field present in an existing client/label/user spec
const ACCESS_KEY: &str = "Access";

/// Value reported for a counter that has never been set
const COUNTER_DEFAULT: &str = "0";

/// Runs commands through a transport and processes their rows
pub struct Session<T, D = TaggedDecoder> {
    transport: T,
    processor: ResultProcessor<D>,
}

impl<T: CommandTransport> Session<T> {
    /// Create a session with the standard decoder
    pub fn new(transport: T, config: Config) -> Self {
        Self {
            transport,
            processor: ResultProcessor::new(config),
        }
    }
}

impl<T: CommandTransport, D: MessageDecoder> Session<T, D> {
    /// Create a session around an existing processor
    pub fn with_processor(transport: T, processor: ResultProcessor<D>) -> Self {
        Self {
            transport,
            processor,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn processor(&self) -> &ResultProcessor<D> {
        &self.processor
    }

    /// Run a command; connection errors pass through unchanged
    pub fn exec(&self, cmd: &str, args: &[&str]) -> Result<Vec<Row>> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        tracing::debug!(cmd, ?args, "Executing command");
        let rows = self.transport.exec_map_cmd_list(cmd, &args)?;
        tracing::trace!(cmd, rows = rows.len(), "Command returned");
        Ok(rows)
    }

    // =========================================================================
    // Counters
    // =========================================================================

    /// Current value of a counter; `"0"` when the server reports none
    pub fn get_counter(&self, name: &str) -> Result<String> {
        require_non_blank("counter name", name)?;
        let rows = self.exec("counter", &[name])?;
        self.processor.scalar_field(&rows, "value", COUNTER_DEFAULT)
    }

    /// Set a counter; `perforce_counter` allows setting protected counters
    pub fn set_counter(&self, name: &str, value: &str, perforce_counter: bool) -> Result<()> {
        require_non_blank("counter name", name)?;
        require_non_blank("counter value", value)?;

        let mut args = Vec::with_capacity(3);
        if perforce_counter {
            args.push("-f");
        }
        args.extend([name, value]);

        let rows = self.exec("counter", &args)?;
        self.processor.check_rows(&rows)
    }

    /// Delete a counter, returning the server's confirmation text
    pub fn delete_counter(&self, name: &str, perforce_counter: bool) -> Result<String> {
        require_non_blank("counter name", name)?;

        let mut args = vec!["-d"];
        if perforce_counter {
            args.push("-f");
        }
        args.push(name);

        let rows = self.exec("counter", &args)?;
        self.processor.info_string(&rows)
    }

    // =========================================================================
    // Specs
    // =========================================================================

    /// Client spec by name; `None` if the server has no such client
    ///
    /// The server answers `client -o` for unknown names with a default
    /// spec; only an existing spec carries `Update` or `Access`.
    pub fn get_client(&self, name: &str) -> Result<Option<Row>> {
        require_non_blank("client name", name)?;
        let rows = self.exec("client", &["-o", name])?;

        let specs = self
            .processor
            .first_error_wins(&rows, |row, message| message.is_none().then(|| row.clone()))?;

        Ok(specs
            .into_iter()
            .next()
            .filter(|spec| spec.contains_key(UPDATE_KEY) || spec.contains_key(ACCESS_KEY)))
    }

    // =========================================================================
    // Batch Operations
    // =========================================================================

    /// Obliterate files; one result per reported file, errors included
    ///
    /// Without `execute` the server only reports what would be removed.
    pub fn obliterate(&self, paths: &[&str], execute: bool) -> Result<Vec<RowResult<Row>>> {
        if paths.is_empty() {
            return Err(P4Error::InvalidArgument(
                "obliterate requires at least one file path".to_string(),
            ));
        }

        let mut args = Vec::with_capacity(paths.len() + 1);
        if execute {
            args.push("-y");
        }
        args.extend_from_slice(paths);

        let rows = self.exec("obliterate", &args)?;
        self.processor
            .collect_all(&rows, &DedupByField::new("depotFile"), |row, _| row.clone())
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Login status text; empty when the server says nothing
    pub fn login_status(&self) -> Result<String> {
        let rows = self.exec("login", &["-s"])?;
        self.processor.scalar_info(&rows, "")
    }
}

fn require_non_blank(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(P4Error::InvalidArgument(format!("{} must not be blank", what)));
    }
    Ok(())
}
