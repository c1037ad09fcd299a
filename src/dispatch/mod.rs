// src/dispatch/mod.rs

//! Operator command dispatch.
//!
//! - [`registry`]: the fixed command table ([`CommandRegistry`]).
//! - [`operators`]: who is allowed to do what ([`OperatorRegistry`]).
//! - [`dialog`]: per-operator confirmation dialog sessions.
//! - [`dispatcher`]: the permission gate and command handlers.

pub mod dialog;
pub mod dispatcher;
pub mod operators;
pub mod registry;

pub use dialog::DialogSessions;
pub use dispatcher::{Caller, Dispatcher, Outcome};
pub use operators::OperatorRegistry;
pub use registry::{BotCommand, CommandDescriptor, CommandKind, CommandRegistry};
