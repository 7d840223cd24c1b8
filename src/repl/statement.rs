use chumsky::{prelude::*, regex::regex};

use crate::record::{RecordError, Row};

use super::error::PrepareError;

/// A statement against the `users` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    // insert <id> <username> <email>
    Insert(Row),

    // select
    Select,
}

/// A dot-prefixed command handled by the front end itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaCommand {
    Exit,
    BTree,
    Constants,
}

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Meta(MetaCommand),
    Statement(Statement),
}

impl Command {
    /// Classify and parse `input`. Lines starting with `.` are meta commands.
    pub fn parse(input: &str) -> Result<Self, PrepareError> {
        let input = input.trim();
        if input.starts_with('.') {
            MetaCommand::parse(input).map(Command::Meta)
        } else {
            prepare_statement(input).map(Command::Statement)
        }
    }
}

impl MetaCommand {
    pub fn parse(input: &str) -> Result<Self, PrepareError> {
        match input.trim() {
            ".exit" => Ok(MetaCommand::Exit),
            ".btree" => Ok(MetaCommand::BTree),
            ".constants" => Ok(MetaCommand::Constants),
            other => Err(PrepareError::UnrecognizedCommand(other.into())),
        }
    }
}

/// Turn a statement line into a validated [`Statement`]
pub fn prepare_statement(input: &str) -> Result<Statement, PrepareError> {
    let input = input.trim();
    match input.split_whitespace().next() {
        Some("insert") => prepare_insert(input),
        Some("select") => select_parser()
            .parse(input)
            .into_result()
            .map(|_| Statement::Select)
            .map_err(|_| PrepareError::SyntaxError),
        _ => Err(PrepareError::Unrecognized(input.into())),
    }
}

fn prepare_insert(input: &str) -> Result<Statement, PrepareError> {
    let (id, username, email) = insert_parser()
        .parse(input)
        .into_result()
        .map_err(|_| PrepareError::SyntaxError)?;

    let id = parse_id(id)?;
    let row = Row::new(id, username, email).map_err(|err| match err {
        RecordError::StringTooLong { .. } => PrepareError::StringTooLong,
        // Embedded NUL bytes and anything else the row rejects
        _ => PrepareError::SyntaxError,
    })?;
    Ok(Statement::Insert(row))
}

fn parse_id(text: &str) -> Result<u32, PrepareError> {
    if let Some(digits) = text.strip_prefix('-')
        && digits.bytes().any(|b| b != b'0')
    {
        return Err(PrepareError::NegativeId);
    }
    text.trim_start_matches('-')
        .parse()
        .map_err(|_| PrepareError::SyntaxError)
}

fn insert_parser<'a>()
-> impl Parser<'a, &'a str, (&'a str, &'a str, &'a str), extra::Err<Rich<'a, char>>> {
    let word = any()
        .filter(|c: &char| !c.is_whitespace())
        .repeated()
        .at_least(1)
        .to_slice();

    just("insert")
        .ignore_then(text::inline_whitespace().at_least(1))
        .ignore_then(regex(r"-?\d+"))
        .then_ignore(text::inline_whitespace().at_least(1))
        .then(word.clone())
        .then_ignore(text::inline_whitespace().at_least(1))
        .then(word)
        .then_ignore(text::whitespace())
        .then_ignore(end())
        .map(|((id, username), email)| (id, username, email))
}

fn select_parser<'a>() -> impl Parser<'a, &'a str, (), extra::Err<Rich<'a, char>>> {
    just("select")
        .ignore_then(text::whitespace())
        .then_ignore(end())
}
