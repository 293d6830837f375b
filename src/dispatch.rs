//! Dispatch
//!
//! Converts a classified server message into either a pass-through value or
//! a terminal error:
//!
//! ```text
//!   Error/Fatal ──► auth rule match? ──yes──► P4Error::Access(kind)
//!                                    └─no───► P4Error::Request
//!   Info/Warning/None ──────────────────────► Ok(message)
//! ```
//!
//! Connection errors never pass through here; they are raised by the
//! transport before any row exists.

use crate::classify::{AuthFailureKind, AuthRules, Classify};
use crate::error::{P4Error, Result};
use crate::protocol::{ServerMessage, Severity};

/// Applies the dispatch rules with one auth rule table
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'a> {
    rules: &'a AuthRules,
}

impl<'a> Dispatcher<'a> {
    pub fn new(rules: &'a AuthRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &'a AuthRules {
        self.rules
    }

    /// Raise Error/Fatal messages; pass anything else through
    pub fn dispatch(&self, message: ServerMessage) -> Result<ServerMessage> {
        if message.in_error() {
            return Err(self.to_error(message));
        }
        Ok(message)
    }

    /// `dispatch` for an optional message
    pub fn dispatch_opt(&self, message: Option<ServerMessage>) -> Result<Option<ServerMessage>> {
        message.map(|m| self.dispatch(m)).transpose()
    }

    /// Raise Error/Fatal messages without taking ownership
    pub fn check(&self, message: &ServerMessage) -> Result<()> {
        if message.in_error() {
            return Err(self.to_error(message.clone()));
        }
        Ok(())
    }

    /// Raise warnings as request errors
    ///
    /// For operations where a warning means the request did nothing.
    pub fn check_warnings(&self, message: &ServerMessage) -> Result<()> {
        if message.is_warning() {
            tracing::debug!("Warning raised as request error: {}", message);
            return Err(P4Error::Request(message.clone()));
        }
        Ok(())
    }

    /// Raise only authentication failures, whatever their severity
    ///
    /// Per-file operations report ordinary failures per item; an auth
    /// failure, though, invalidates the whole batch.
    pub fn check_file_errors(&self, message: &ServerMessage) -> Result<()> {
        match self.rules.detect(message) {
            AuthFailureKind::None => Ok(()),
            kind => {
                tracing::debug!("Auth failure ({}) in per-file result: {}", kind, message);
                Err(P4Error::Access {
                    kind,
                    message: message.clone(),
                })
            }
        }
    }

    /// Raise the Failed-or-worse members of a message, ignoring lower ones
    ///
    /// Only the failing members are carried by the error.
    pub fn check_errors_only(&self, message: ServerMessage) -> Result<ServerMessage> {
        let failing: Vec<_> = message.for_severity(Severity::Failed).cloned().collect();
        match ServerMessage::new(failing) {
            Some(errors) => Err(self.to_error(errors)),
            None => Ok(message),
        }
    }

    /// Classify an error message as access or request failure
    pub fn to_error(&self, message: ServerMessage) -> P4Error {
        match self.rules.detect(&message) {
            AuthFailureKind::None => {
                tracing::debug!(code = %message.code(), "Request error: {}", message);
                P4Error::Request(message)
            }
            kind => {
                tracing::debug!(code = %message.code(), "Access error ({}): {}", kind, message);
                P4Error::Access { kind, message }
            }
        }
    }
}

/// Dispatch with the standard auth rule table
pub fn dispatch(message: ServerMessage) -> Result<ServerMessage> {
    let rules = AuthRules::standard();
    Dispatcher::new(&rules).dispatch(message)
}
