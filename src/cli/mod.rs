//! Command-line interface
//!
//! Argument definitions live in [`args`]; [`commands`] holds the handlers.

pub mod args;
pub mod commands;
