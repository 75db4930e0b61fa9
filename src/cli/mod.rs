// file: src/cli/mod.rs
// version: 1.0.0
// guid: cb42334d-74cc-4f49-98c6-3b7b51b1e75f

//! Command line interface

pub mod args;
pub mod commands;
pub mod menu;

pub use args::{Cli, Commands};
pub use commands::*;
pub use menu::Menu;
