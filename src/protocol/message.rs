//! Server messages
//!
//! A [`SingleMessage`] is one decoded `code<N>`/`fmt<N>` pair. A
//! [`ServerMessage`] is the non-empty, ordered aggregation of one or more of
//! them, exposed to callers as one logical info/error object.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::code::{CodeParts, GenericCode, RawCode, Severity, Subsystem};
use super::render::{placeholder_names, render};
use super::Row;

// =============================================================================
// Single Message
// =============================================================================

/// One decoded message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleMessage {
    raw_code: RawCode,
    parts: CodeParts,
    format: String,
    text: String,
    arguments: Vec<(String, String)>,
    index: usize,
}

impl SingleMessage {
    /// Build the message at `index` of `row` from an already parsed code
    pub fn from_row(raw_code: RawCode, parts: CodeParts, format: &str, row: &Row, index: usize) -> Self {
        let arguments = placeholder_names(format)
            .into_iter()
            .filter_map(|name| {
                row.get(name)
                    .map(|value| (name.to_string(), value.to_text_lossy().into_owned()))
            })
            .collect();

        Self {
            raw_code,
            parts,
            format: format.to_string(),
            text: render(format, row),
            arguments,
            index,
        }
    }

    pub fn raw_code(&self) -> RawCode {
        self.raw_code
    }

    pub fn parts(&self) -> CodeParts {
        self.parts
    }

    pub fn severity(&self) -> Severity {
        self.parts.severity
    }

    pub fn generic(&self) -> GenericCode {
        self.parts.generic
    }

    pub fn subsystem(&self) -> Subsystem {
        self.parts.subsystem
    }

    pub fn unique_code(&self) -> u16 {
        self.parts.unique_code
    }

    pub fn sub_code(&self) -> u16 {
        self.parts.sub_code
    }

    /// Position of this message within its row (`N` of `code<N>`)
    pub fn index(&self) -> usize {
        self.index
    }

    /// Unrendered format string
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Rendered message text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Named arguments referenced by the format, with their row values
    pub fn arguments(&self) -> &[(String, String)] {
        &self.arguments
    }

    pub fn argument(&self, name: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// `generic:subsystem:subcode (unique)`
    pub fn code(&self) -> String {
        self.parts.to_string()
    }

    /// Case-insensitive containment test over format and rendered text
    pub fn has_fragment(&self, fragment: &str) -> bool {
        let needle = fragment.to_lowercase();
        self.format.to_lowercase().contains(&needle) || self.text.to_lowercase().contains(&needle)
    }
}

impl fmt::Display for SingleMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

// =============================================================================
// Composite Message
// =============================================================================

/// Ordered, non-empty aggregation of single messages
///
/// The top message is the first one carrying the highest severity present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMessage {
    messages: Vec<SingleMessage>,
    top: usize,
}

impl ServerMessage {
    /// Aggregate messages; `None` if there are none
    pub fn new(messages: Vec<SingleMessage>) -> Option<Self> {
        if messages.is_empty() {
            return None;
        }

        let mut top = 0;
        for (i, message) in messages.iter().enumerate().skip(1) {
            // Strictly greater: ties keep the earlier message
            if message.severity() > messages[top].severity() {
                top = i;
            }
        }

        Some(Self { messages, top })
    }

    /// Wrap a single message
    pub fn single(message: SingleMessage) -> Self {
        Self {
            messages: vec![message],
            top: 0,
        }
    }

    pub fn top(&self) -> &SingleMessage {
        &self.messages[self.top]
    }

    pub fn all_messages(&self) -> &[SingleMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn into_messages(self) -> Vec<SingleMessage> {
        self.messages
    }

    /// Severity of the top message
    pub fn severity(&self) -> Severity {
        self.top().severity()
    }

    pub fn raw_code(&self) -> RawCode {
        self.top().raw_code()
    }

    pub fn generic(&self) -> GenericCode {
        self.top().generic()
    }

    pub fn subsystem(&self) -> Subsystem {
        self.top().subsystem()
    }

    pub fn unique_code(&self) -> u16 {
        self.top().unique_code()
    }

    pub fn sub_code(&self) -> u16 {
        self.top().sub_code()
    }

    pub fn code(&self) -> String {
        self.top().code()
    }

    /// Rendered text of the top message
    pub fn text(&self) -> &str {
        self.top().text()
    }

    /// Messages at or above `minimum`, in order
    pub fn for_severity(&self, minimum: Severity) -> impl Iterator<Item = &SingleMessage> {
        self.messages.iter().filter(move |m| m.severity() >= minimum)
    }

    /// Messages with exactly `severity`, in order
    pub fn for_exact_severity(&self, severity: Severity) -> impl Iterator<Item = &SingleMessage> {
        self.messages.iter().filter(move |m| m.severity() == severity)
    }

    pub fn has_severity(&self, minimum: Severity) -> bool {
        self.severity() >= minimum
    }

    /// Top severity is exactly Info
    pub fn is_info(&self) -> bool {
        self.severity() == Severity::Info
    }

    /// Top severity is exactly Warning
    pub fn is_warning(&self) -> bool {
        self.severity() == Severity::Warning
    }

    /// Top severity is Failed or worse
    pub fn is_error(&self) -> bool {
        self.has_severity(Severity::Failed)
    }

    pub fn is_info_or_error(&self) -> bool {
        self.has_severity(Severity::Info)
    }

    /// Text of the first Info-severity message, or empty
    pub fn first_info_string(&self) -> &str {
        self.for_exact_severity(Severity::Info)
            .next()
            .map(SingleMessage::text)
            .unwrap_or("")
    }

    /// Texts of all Info-severity messages joined by `separator`
    pub fn all_info_strings(&self, separator: &str) -> String {
        self.for_exact_severity(Severity::Info)
            .map(SingleMessage::text)
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Texts of all Info-severity messages, one per line
    pub fn all_info_text(&self) -> String {
        self.all_info_strings("\n")
    }

    /// True if any member contains `fragment` (case-insensitive)
    pub fn has_fragment(&self, fragment: &str) -> bool {
        self.messages.iter().any(|m| m.has_fragment(fragment))
    }

    /// Named arguments of all members; the first occurrence of a name wins
    pub fn named_arguments(&self) -> BTreeMap<&str, &str> {
        let mut merged = BTreeMap::new();
        for message in &self.messages {
            for (name, value) in message.arguments() {
                merged.entry(name.as_str()).or_insert(value.as_str());
            }
        }
        merged
    }

    /// Combine two composites, keeping order
    pub fn merge(self, other: ServerMessage) -> ServerMessage {
        let top = if other.severity() > self.severity() {
            self.messages.len() + other.top
        } else {
            self.top
        };
        let mut messages = self.messages;
        messages.extend(other.messages);
        ServerMessage { messages, top }
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .messages
            .iter()
            .map(SingleMessage::text)
            .collect::<Vec<_>>()
            .join("\n");
        f.write_str(joined.trim())
    }
}
