//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand.

mod completions;
mod config;
mod list;
mod request;
mod utils;

pub use completions::handle_completions;
pub use config::handle_config;
pub use list::handle_list;
pub use request::handle_request;
