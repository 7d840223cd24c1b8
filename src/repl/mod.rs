//! Interactive front end: line editing, statement dispatch and output

mod error;
mod statement;

pub use error::{ExecuteError, PrepareError, ReplError, ReplResult};
pub use statement::{Command, MetaCommand, Statement, prepare_statement};

use std::path::PathBuf;

use prettytable::{Table as PrettyTable, row};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::btree::BTreeError;
use crate::record::Row;
use crate::table::{Constants, Table, TableError};

const PROMPT: &str = "db > ";

/// Result of a successfully executed statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteOutcome {
    Inserted,
    Rows(Vec<Row>),
}

/// Run `statement` against `table`
pub fn execute_statement(
    table: &mut Table,
    statement: &Statement,
) -> Result<ExecuteOutcome, ExecuteError> {
    match statement {
        Statement::Insert(row) => {
            table.insert(row).map_err(classify_error)?;
            Ok(ExecuteOutcome::Inserted)
        }
        Statement::Select => {
            let rows = table.select_all().map_err(classify_error)?;
            Ok(ExecuteOutcome::Rows(rows))
        }
    }
}

fn classify_error(err: TableError) -> ExecuteError {
    match err {
        TableError::BTree(BTreeError::DuplicateKey(_)) => ExecuteError::DuplicateKey,
        TableError::BTree(BTreeError::InternalNodeFull(_))
        | TableError::BTree(BTreeError::PageBudgetExhausted { .. }) => ExecuteError::TableFull,
        other => ExecuteError::Table(other),
    }
}

/// Render rows as a text table with an `id | username | email` header
pub fn format_rows(rows: &[Row]) -> String {
    let mut output = PrettyTable::new();
    output.set_titles(row!["id", "username", "email"]);
    for r in rows {
        output.add_row(row![r.id, r.username, r.email]);
    }
    output.to_string()
}

/// Render the layout constants as a two-column text table
pub fn format_constants(constants: &Constants) -> String {
    let mut output = PrettyTable::new();
    output.set_titles(row!["constant", "value"]);
    for (name, value) in constants.entries() {
        output.add_row(row![name, value]);
    }
    output.to_string()
}

/// Read-eval-print loop over one open table
pub struct Repl {
    table: Table,
    editor: DefaultEditor,
    history: Option<PathBuf>,
}

impl Repl {
    pub fn new(table: Table, history: Option<PathBuf>) -> ReplResult<Self> {
        let mut editor = DefaultEditor::new()?;
        if let Some(path) = &history
            && let Err(err) = editor.load_history(path)
        {
            tracing::debug!("No history loaded from {}: {}", path.display(), err);
        }

        Ok(Self {
            table,
            editor,
            history,
        })
    }

    /// Run until `.exit` or end of input, then close the table
    pub fn run(mut self) -> ReplResult<()> {
        let result = self.read_loop();
        self.save_history();
        self.table.close()?;
        result
    }

    fn read_loop(&mut self) -> ReplResult<()> {
        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    if !self.handle_line(&line) {
                        return Ok(());
                    }
                }
                Err(ReadlineError::Interrupted) => println!("^C"),
                Err(ReadlineError::Eof) => return Ok(()),
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Handle one line of input; returns `false` when the session should end
    fn handle_line(&mut self, line: &str) -> bool {
        let input = line.trim();
        if input.is_empty() {
            return true;
        }
        self.editor.add_history_entry(input).ok();

        match Command::parse(input) {
            Ok(Command::Meta(command)) => self.run_meta_command(command),
            Ok(Command::Statement(statement)) => {
                match execute_statement(&mut self.table, &statement) {
                    Ok(ExecuteOutcome::Rows(rows)) => {
                        if !rows.is_empty() {
                            print!("{}", format_rows(&rows));
                        }
                        println!("Executed.");
                    }
                    Ok(ExecuteOutcome::Inserted) => println!("Executed."),
                    Err(err) => println!("{}", err),
                }
                true
            }
            Err(err) => {
                println!("{}", err);
                true
            }
        }
    }

    fn run_meta_command(&mut self, command: MetaCommand) -> bool {
        match command {
            MetaCommand::Exit => return false,
            MetaCommand::BTree => match self.table.render_tree() {
                Ok(tree) => {
                    println!("Tree:");
                    print!("{}", tree);
                }
                Err(err) => println!("Error: {}", err),
            },
            MetaCommand::Constants => {
                println!("Constants:");
                print!("{}", format_constants(&self.table.constants()));
            }
        }
        true
    }

    fn save_history(&mut self) {
        if let Some(path) = &self.history
            && let Err(err) = self.editor.save_history(path)
        {
            tracing::warn!("Failed to save history to {}: {}", path.display(), err);
        }
    }
}
