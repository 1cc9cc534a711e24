//! `roulette` - Russian roulette chat command
//!
//! Each invocation is a shot at a shared round: a hit mutes the shooter for
//! the stakes accumulated so far and starts a new round, a miss raises the
//! stakes for the next player.

pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod game;
pub mod observability;
pub mod platform;
pub mod server;
