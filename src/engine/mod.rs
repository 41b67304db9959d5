//! Runtime side of the reconciliation engine.
//!
//! This module drives the external collaborators:
//! - [`collaborator`] - traits for the routing engine, the OS tunnel and the host
//! - [`scheduler`] - the debounced, single-flight [`Reconciler`]
//! - [`gateway`] - surfacing failures to the host process
//! - [`commands`] - the host command surface
//! - [`dry_run`] - file-backed collaborators for the binary

mod collaborator;
mod commands;
mod dry_run;
mod gateway;
mod scheduler;

// Re-export public types and functions
pub use collaborator::{ErrorNotifier, PacketTunnel, RoutingEngine};
pub use commands::{CommandHandler, CommandResponse, HostCommand};
pub use dry_run::{DryRunTunnel, FileRoutingEngine};
pub use gateway::{read_last_error, SharedFileNotifier};
pub use scheduler::Reconciler;
