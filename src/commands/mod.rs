//! Command parsing and dispatch.
//!
//! Parsing ([`CommandRouter`]) is separate from execution ([`dispatch`]) so the
//! routing table can be tested without a database.

pub mod definitions;
pub mod handlers;
pub mod help;
pub mod output;
pub mod router;

pub use definitions::{CommandCategory, CommandDef, COMMANDS};
pub use handlers::{dispatch, CommandContext};
pub use output::{CommandOutput, ConfigGroup, ControlAction};
pub use router::{Command, CommandRouter};
