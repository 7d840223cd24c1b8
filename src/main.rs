use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use neptune_db::repl::Repl;
use neptune_db::table::Table;

/// A single-table database backed by a paged B+ tree
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Database file to open (created if missing)
    db: PathBuf,

    /// File used to load and save line-editor history
    #[arg(long)]
    history: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let table = match Table::open(&args.db) {
        Ok(table) => table,
        Err(err) => {
            eprintln!("Unable to open {}: {}", args.db.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let result = Repl::new(table, args.history).and_then(Repl::run);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
