pub mod ast;
pub mod lexer;
#[allow(clippy::module_inception)]
pub mod parser;

pub use ast::{CommandLine, CommandNode, NodeId, NodeKind, Origin};
pub use parser::Parser;
