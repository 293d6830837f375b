//! Packed message codes
//!
//! Every server message carries a single unsigned 32-bit code. The client
//! only ever decomposes it; codes are produced by the server.
//!
//! ## Layout
//! ```text
//!  31    28 27    24 23            16 15        10 9                0
//! ┌────────┬────────┬────────────────┬────────────┬──────────────────┐
//! │Severity│ ArgCnt │    Generic     │ Subsystem  │     SubCode      │
//! └────────┴────────┴────────────────┴────────────┴──────────────────┘
//!                                    └────────── unique code ────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{P4Error, Result};

// =============================================================================
// Bit Layout
// =============================================================================

const SEVERITY_SHIFT: u32 = 28;
const SEVERITY_MASK: u32 = 0x0F;
const ARG_COUNT_SHIFT: u32 = 24;
const ARG_COUNT_MASK: u32 = 0x0F;
const GENERIC_SHIFT: u32 = 16;
const GENERIC_MASK: u32 = 0xFF;
const SUBSYSTEM_SHIFT: u32 = 10;
const SUBSYSTEM_MASK: u32 = 0x3F;
const SUB_CODE_MASK: u32 = 0x3FF;
const UNIQUE_CODE_MASK: u32 = 0xFFFF;

// =============================================================================
// Severity
// =============================================================================

/// Severity of a message, from the top four bits of its code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Empty,
    Info,
    Warning,
    Failed,
    Fatal,
    /// Values above Fatal; never produced by current servers
    Unknown(u8),
}

impl Severity {
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => Severity::Empty,
            1 => Severity::Info,
            2 => Severity::Warning,
            3 => Severity::Failed,
            4 => Severity::Fatal,
            n => Severity::Unknown(n),
        }
    }

    pub fn level(self) -> u8 {
        match self {
            Severity::Empty => 0,
            Severity::Info => 1,
            Severity::Warning => 2,
            Severity::Failed => 3,
            Severity::Fatal => 4,
            Severity::Unknown(n) => n,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Empty => f.write_str("empty"),
            Severity::Info => f.write_str("info"),
            Severity::Warning => f.write_str("warning"),
            Severity::Failed => f.write_str("failed"),
            Severity::Fatal => f.write_str("fatal"),
            Severity::Unknown(n) => write!(f, "unknown({})", n),
        }
    }
}

// =============================================================================
// Named Generic / Subsystem Codes
// =============================================================================

// Generates a u8 newtype with named constants and a name() lookup.
macro_rules! code_table {
    (
        $(#[$attr:meta])*
        $name:ident { $($konst:ident = $val:expr),* $(,)? }
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(u8);

        impl $name {
            $(pub const $konst: $name = $name($val);)*

            pub fn new(value: u8) -> Self {
                Self(value)
            }

            pub fn value(self) -> u8 {
                self.0
            }

            /// Protocol name of a known code
            pub fn name(self) -> Option<&'static str> {
                match self.0 {
                    $(v if v == $val => Some(stringify!($konst)),)*
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.name() {
                    Some(name) => f.write_str(name),
                    None => write!(f, "{}", self.0),
                }
            }
        }
    };
}

code_table! {
    /// Generic category of a message, independent of subsystem
    GenericCode {
        NONE = 0x00,
        USAGE = 0x01,
        UNKNOWN = 0x02,
        CONTEXT = 0x03,
        ILLEGAL = 0x04,
        NOTYET = 0x05,
        PROTECT = 0x06,
        EMPTY = 0x11,
        FAULT = 0x21,
        CLIENT = 0x22,
        ADMIN = 0x23,
        CONFIG = 0x24,
        UPGRADE = 0x25,
        COMM = 0x26,
        TOOBIG = 0x27,
    }
}

code_table! {
    /// Server subsystem that produced a message
    Subsystem {
        OS = 0,
        SUPP = 1,
        LBR = 2,
        RPC = 3,
        DB = 4,
        DBSUPP = 5,
        DM = 6,
        SERVER = 7,
        CLIENT = 8,
        INFO = 9,
        HELP = 10,
        SPEC = 11,
        FTPD = 12,
        BROKER = 13,
        P4QT = 14,
        X3SERVER = 15,
        GRAPH = 16,
        SCRIPT = 17,
        SERVER2 = 18,
        DM2 = 19,
        CONFIG = 20,
    }
}

// =============================================================================
// Raw Code
// =============================================================================

/// A packed message code as sent by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RawCode(u32);

impl RawCode {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Parse a code from its decimal wire form
    pub fn parse(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u32>()
            .map(RawCode)
            .map_err(|e| P4Error::Protocol(format!("Invalid message code '{}': {}", s, e)))
    }

    pub fn severity(self) -> Severity {
        Severity::from_level(((self.0 >> SEVERITY_SHIFT) & SEVERITY_MASK) as u8)
    }

    /// Number of arguments the server substituted into the message
    pub fn arg_count(self) -> u8 {
        ((self.0 >> ARG_COUNT_SHIFT) & ARG_COUNT_MASK) as u8
    }

    pub fn generic(self) -> GenericCode {
        GenericCode::new(((self.0 >> GENERIC_SHIFT) & GENERIC_MASK) as u8)
    }

    pub fn subsystem(self) -> Subsystem {
        Subsystem::new(((self.0 >> SUBSYSTEM_SHIFT) & SUBSYSTEM_MASK) as u8)
    }

    /// Code unique within the subsystem (subsystem bits + sub-code)
    pub fn unique_code(self) -> u16 {
        (self.0 & UNIQUE_CODE_MASK) as u16
    }

    pub fn sub_code(self) -> u16 {
        (self.0 & SUB_CODE_MASK) as u16
    }

    /// Decompose into all fields at once
    pub fn decompose(self) -> CodeParts {
        CodeParts {
            severity: self.severity(),
            arg_count: self.arg_count(),
            generic: self.generic(),
            subsystem: self.subsystem(),
            unique_code: self.unique_code(),
            sub_code: self.sub_code(),
        }
    }
}

impl FromStr for RawCode {
    type Err = P4Error;

    fn from_str(s: &str) -> Result<Self> {
        RawCode::parse(s)
    }
}

impl From<u32> for RawCode {
    fn from(value: u32) -> Self {
        RawCode(value)
    }
}

impl fmt::Display for RawCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The decomposed fields of a [`RawCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeParts {
    pub severity: Severity,
    pub arg_count: u8,
    pub generic: GenericCode,
    pub subsystem: Subsystem,
    pub unique_code: u16,
    pub sub_code: u16,
}

impl CodeParts {
    /// Fields used when a code cannot be parsed
    pub fn unparsable() -> Self {
        Self {
            severity: Severity::Empty,
            arg_count: 0,
            generic: GenericCode::NONE,
            subsystem: Subsystem::CLIENT,
            unique_code: 0,
            sub_code: 0,
        }
    }
}

impl fmt::Display for CodeParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{} ({})",
            self.generic.value(),
            self.subsystem.value(),
            self.sub_code,
            self.unique_code
        )
    }
}
