//! # Interface Layer
//!
//! User-facing command handlers, registered into the `CommandRegistry` at startup.

pub mod commands;
