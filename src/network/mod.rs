//! Network Module
//!
//! The boundary to the command transport, and the delegators built on it.
//!
//! ## Architecture
//! - Transport produces rows (or a connection error)
//! - Session marshals arguments and picks a result policy
//! - Rows are routed through the ResultProcessor

mod session;
mod transport;

pub use session::Session;
pub use transport::{CommandTransport, IssuedCommand, ReplayTransport};
