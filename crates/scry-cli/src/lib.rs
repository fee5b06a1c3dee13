//! Crate implementing the CLI commands.

mod cli;
mod decode;
mod hash;
mod specs;

pub use self::cli::{CliAction, CliOpts};
pub use self::decode::evaluate_decode;
pub use self::hash::evaluate_hash;
pub use self::specs::evaluate_specs;
