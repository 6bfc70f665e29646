pub mod builtins;
#[allow(clippy::module_inception)]
pub mod executor;
pub mod expander;
pub mod job_manager;
pub mod pipeline;
pub mod process;
pub mod symbols;

pub use executor::{Executor, Outcome};
pub use symbols::SymbolTable;
