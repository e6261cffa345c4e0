//! kvpilot: a sidecar that polls key-value namespaces of a discovery
//! backend and reacts to changes by running a local command and/or posting
//! the change set to an HTTP endpoint.
//!
//! The pieces, leaves first:
//! - [`discovery`]: backend capabilities and the registry filled by [`discovery::bootstrap`]
//! - [`watch`]: the diff engine and the watch entity that owns one snapshot
//! - [`command`]: single-use on-change process execution with timeouts
//! - [`scheduler`]: one fixed-delay task per watch, cooperative stop
//! - [`App`]: wires configuration into all of the above

mod app;
pub mod command;
mod config;
pub mod discovery;
mod errors;
pub mod scheduler;
pub mod utils;
pub mod watch;

pub use app::*;
pub use command::CommandDescriptor;
pub use command::CommandHandle;
pub use command::RunContext;
pub use config::*;
pub use errors::*;
pub use scheduler::StopHandle;


//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
