use rustyline::error::ReadlineError;
use thiserror::Error;

use crate::table::TableError;

/// Reasons a line of input could not be turned into a command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrepareError {
    #[error("ID must be positive.")]
    NegativeId,

    #[error("String is too long.")]
    StringTooLong,

    #[error("Syntax error. Could not parse statement.")]
    SyntaxError,

    #[error("Unrecognized keyword at start of '{0}'.")]
    Unrecognized(String),

    #[error("Unrecognized command '{0}'")]
    UnrecognizedCommand(String),
}

/// Statement failures reported to the user without ending the session
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("Error: Duplicate key.")]
    DuplicateKey,

    #[error("Error: Table full.")]
    TableFull,

    #[error("Error: {0}")]
    Table(TableError),
}

/// Failures that end the interactive session
#[derive(Debug, Error)]
pub enum ReplError {
    #[error("Line editor error: {0}")]
    Readline(#[from] ReadlineError),

    #[error("Table error: {0}")]
    Table(#[from] TableError),
}

pub type ReplResult<T> = Result<T, ReplError>;
