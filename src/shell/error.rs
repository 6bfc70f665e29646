use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShellError {
    /// The input line could not be tokenized or parsed.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// The command tree is malformed (cycle, shared node, missing command).
    #[error("malformed command: {0}")]
    Structure(String),

    #[error("{path}: {source}")]
    Redirection {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("{command}: {reason}")]
    Spawn { command: String, reason: String },

    #[error("{name}: {reason}")]
    Builtin { name: &'static str, reason: String },

    #[error("system error: {0}")]
    Os(#[from] nix::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ShellError {
    pub fn structure(msg: impl Into<String>) -> Self {
        ShellError::Structure(msg.into())
    }

    pub fn builtin(name: &'static str, reason: impl Into<String>) -> Self {
        ShellError::Builtin {
            name,
            reason: reason.into(),
        }
    }
}
