//! Command line interface

pub mod commands;
pub mod display;
pub mod eks;

pub use commands::{CliArgs, Commands};
