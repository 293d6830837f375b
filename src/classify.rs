//! Classification
//!
//! Maps message severity onto a fixed classification scale, and
//! sub-classifies authentication failures by matching message text against
//! an ordered rule table.
//!
//! ## Severity Thresholds
//! ```text
//! None < Info < Warning < Error (= Failed) < Fatal
//! ```
//!
//! ## Auth Failure Detection
//! Rules are tried in table order; the first rule matching any member of a
//! composite decides the kind. Matching is on the server's literal English
//! text, so a localized server will not be recognized.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::protocol::{GenericCode, ServerMessage, Severity, SingleMessage};

// =============================================================================
// Severity Classification
// =============================================================================

/// Classification of a message, derived from its severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Classification {
    None,
    Info,
    Warning,
    Error,
    Fatal,
}

impl Classification {
    /// Error or Fatal
    pub fn is_error(self) -> bool {
        self >= Classification::Error
    }
}

impl From<Severity> for Classification {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Empty => Classification::None,
            Severity::Info => Classification::Info,
            Severity::Warning => Classification::Warning,
            Severity::Failed => Classification::Error,
            Severity::Fatal | Severity::Unknown(_) => Classification::Fatal,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Classification::None => "none",
            Classification::Info => "info",
            Classification::Warning => "warning",
            Classification::Error => "error",
            Classification::Fatal => "fatal",
        };
        f.write_str(s)
    }
}

/// Anything carrying a severity can be classified
pub trait Classify {
    fn severity(&self) -> Severity;

    fn classification(&self) -> Classification {
        Classification::from(self.severity())
    }

    /// Classification is Error or Fatal
    fn in_error(&self) -> bool {
        self.classification().is_error()
    }
}

impl Classify for Severity {
    fn severity(&self) -> Severity {
        *self
    }
}

impl Classify for SingleMessage {
    fn severity(&self) -> Severity {
        SingleMessage::severity(self)
    }
}

/// A composite classifies as its top message
impl Classify for ServerMessage {
    fn severity(&self) -> Severity {
        ServerMessage::severity(self)
    }
}

/// Classify a message or composite
pub fn classify<M: Classify + ?Sized>(message: &M) -> Classification {
    message.classification()
}

// =============================================================================
// Auth Failure Detection
// =============================================================================

/// Why the server refused access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthFailureKind {
    None,
    NotLoggedIn,
    SessionExpired,
    SsoFailure,
    PasswordInvalid,
}

impl fmt::Display for AuthFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuthFailureKind::None => "none",
            AuthFailureKind::NotLoggedIn => "not logged in",
            AuthFailureKind::SessionExpired => "session expired",
            AuthFailureKind::SsoFailure => "single sign-on failure",
            AuthFailureKind::PasswordInvalid => "password invalid",
        };
        f.write_str(s)
    }
}

/// What an auth rule tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMatcher {
    /// Case-insensitive fragment of the format or rendered text
    Fragment(String),

    /// Generic code of any member message
    Generic(GenericCode),
}

impl AuthMatcher {
    fn matches(&self, message: &ServerMessage) -> bool {
        match self {
            AuthMatcher::Fragment(fragment) => message.has_fragment(fragment),
            AuthMatcher::Generic(generic) => {
                message.all_messages().iter().any(|m| m.generic() == *generic)
            }
        }
    }
}

/// One entry of the auth rule table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRule {
    pub matcher: AuthMatcher,
    pub kind: AuthFailureKind,
}

impl AuthRule {
    pub fn fragment(fragment: impl Into<String>, kind: AuthFailureKind) -> Self {
        Self {
            matcher: AuthMatcher::Fragment(fragment.into()),
            kind,
        }
    }

    pub fn generic(generic: GenericCode, kind: AuthFailureKind) -> Self {
        Self {
            matcher: AuthMatcher::Generic(generic),
            kind,
        }
    }
}

/// Ordered, immutable auth rule table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRules {
    rules: Vec<AuthRule>,
}

/// Server texts that signal an authentication failure, in match order
const STANDARD_FRAGMENTS: &[(&str, AuthFailureKind)] = &[
    ("Perforce password (P4PASSWD)", AuthFailureKind::NotLoggedIn),
    ("Access for user", AuthFailureKind::NotLoggedIn),
    ("Your session has expired", AuthFailureKind::SessionExpired),
    ("Your session was logged out", AuthFailureKind::SessionExpired),
    ("Perforce password (%'P4PASSWD'%)", AuthFailureKind::NotLoggedIn),
    ("Single sign-on on client failed", AuthFailureKind::SsoFailure),
    ("Password invalid", AuthFailureKind::PasswordInvalid),
];

static STANDARD_RULES: OnceLock<Arc<AuthRules>> = OnceLock::new();

impl AuthRules {
    pub fn new(rules: Vec<AuthRule>) -> Self {
        Self { rules }
    }

    /// The standard table, built once per process
    pub fn standard() -> Arc<AuthRules> {
        STANDARD_RULES
            .get_or_init(|| {
                Arc::new(AuthRules::new(
                    STANDARD_FRAGMENTS
                        .iter()
                        .map(|(fragment, kind)| AuthRule::fragment(*fragment, *kind))
                        .collect(),
                ))
            })
            .clone()
    }

    pub fn rules(&self) -> &[AuthRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Kind of the first matching rule, or `AuthFailureKind::None`
    pub fn detect(&self, message: &ServerMessage) -> AuthFailureKind {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(message))
            .map(|rule| rule.kind)
            .unwrap_or(AuthFailureKind::None)
    }
}

impl Default for AuthRules {
    fn default() -> Self {
        AuthRules::standard().as_ref().clone()
    }
}

/// Detect with the standard table
pub fn detect(message: &ServerMessage) -> AuthFailureKind {
    AuthRules::standard().detect(message)
}
