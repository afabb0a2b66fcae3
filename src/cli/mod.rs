//! CLI entry points for identity management and admin messaging

pub mod commands;

pub use commands::*;
