pub mod error;
pub mod executor;
pub mod parser;
mod readline;
mod signals;
#[allow(clippy::module_inception)]
mod shell;
pub mod state;

pub use shell::Shell;
