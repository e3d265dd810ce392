//! CLI domain: parse, route, output and presentation only.
//! Workspace operations live in [`crate::workspace`]; handlers stay thin.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands};
pub use route::RunContext;
