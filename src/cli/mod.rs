pub mod args;
pub mod commands;

pub use args::{Cli, Commands, SelectionArgs};
pub use commands::run;
