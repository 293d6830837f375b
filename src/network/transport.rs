//! Transport boundary
//!
//! The transport owns sockets, framing and retries. Towards this crate it
//! is a single call: run a command, get its rows or a connection error.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{ConnectionError, Result};
use crate::protocol::{read_capture, Row};

/// Runs one command against the server
pub trait CommandTransport {
    /// Execute `cmd` with `args` in tagged mode
    fn exec_map_cmd_list(
        &self,
        cmd: &str,
        args: &[String],
    ) -> std::result::Result<Vec<Row>, ConnectionError>;
}

impl<T: CommandTransport + ?Sized> CommandTransport for &T {
    fn exec_map_cmd_list(
        &self,
        cmd: &str,
        args: &[String],
    ) -> std::result::Result<Vec<Row>, ConnectionError> {
        (**self).exec_map_cmd_list(cmd, args)
    }
}

/// A command issued through a [`ReplayTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCommand {
    pub cmd: String,
    pub args: Vec<String>,
}

/// Serves recorded rows instead of talking to a server
///
/// Rows registered for a command name are returned for that command;
/// anything else gets the fallback rows. Every call is logged.
#[derive(Debug, Default)]
pub struct ReplayTransport {
    /// Recorded rows per command name
    by_command: HashMap<String, Vec<Row>>,

    /// Rows for unregistered commands
    fallback: Vec<Row>,

    /// Simulated transport failure
    failure: Option<String>,

    /// Commands issued so far
    issued: Mutex<Vec<IssuedCommand>>,
}

impl ReplayTransport {
    /// Create a transport answering every command with `rows`
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            fallback: rows,
            ..Self::default()
        }
    }

    /// Create a transport whose every call fails with a connection error
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Load a binary capture as the fallback rows
    pub fn open(path: &Path, config: &Config) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let rows = read_capture(&mut reader, config.max_payload_size)?;
        tracing::debug!("Loaded {} captured rows from {}", rows.len(), path.display());
        Ok(Self::new(rows))
    }

    /// Register the rows returned for one command
    pub fn with_command(mut self, cmd: impl Into<String>, rows: Vec<Row>) -> Self {
        self.by_command.insert(cmd.into(), rows);
        self
    }

    /// Commands issued so far, in order
    pub fn issued(&self) -> Vec<IssuedCommand> {
        self.issued.lock().clone()
    }
}

impl CommandTransport for ReplayTransport {
    fn exec_map_cmd_list(
        &self,
        cmd: &str,
        args: &[String],
    ) -> std::result::Result<Vec<Row>, ConnectionError> {
        self.issued.lock().push(IssuedCommand {
            cmd: cmd.to_string(),
            args: args.to_vec(),
        });

        if let Some(message) = &self.failure {
            return Err(ConnectionError::new(message.clone()));
        }

        let rows = self.by_command.get(cmd).unwrap_or(&self.fallback);
        tracing::trace!(cmd, rows = rows.len(), "Replaying rows");
        Ok(rows.clone())
    }
}
