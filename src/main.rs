use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use clap::Parser;
use simplesql::{
    config::Config,
    error::{Error, Result},
    sql::{
        engine::Session,
        parser::lexer::END_OF_STATEMENT,
        plan::Query,
    },
};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

/// Interactive SELECT queries over a flat-file database
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Database directory name under the data directory
    #[arg(value_name = "DATABASE")]
    database: String,

    /// Directory holding the database directories
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Print the database schema before reading queries
    #[arg(long)]
    print_schema: bool,

    /// Print every analyzed query before executing it
    #[arg(long)]
    print_ast: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Config::new(args.data_dir, &args.database)
            .print_schema(args.print_schema)
            .print_ast(args.print_ast)
            .log_level(&args.log_level)
    }
}

fn main() {
    let config = Config::from(Args::parse());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run(&config) {
        error!("{}", err);
        std::process::exit(1);
    }
}

fn run(config: &Config) -> Result<()> {
    let session = Session::new(config.open_database()?);
    debug!(dir = %config.database_dir().display(), "database opened");
    if config.print_schema {
        println!("{}", session.database());
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        let (input, exhausted) = read_statement(&mut lines)?;
        let (text, last) = match input.find(END_OF_STATEMENT) {
            Some(end) => (&input[..end], true),
            None => (input.as_str(), exhausted),
        };

        for query in session.queries(text) {
            match query.and_then(|query| run_query(&session, config, &query)) {
                Ok(()) => {}
                Err(err) if !err.is_fatal() => println!("**Error: {}", err),
                Err(err) => return Err(err),
            }
        }
        if last {
            return Ok(());
        }
    }
}

/// Reads lines until the text holds a `;` or the end-of-statement sentinel.
/// The flag is set when input ran out first.
fn read_statement(lines: &mut impl Iterator<Item = io::Result<String>>) -> Result<(String, bool)> {
    print!("query? ");
    io::stdout().flush().map_err(io_error)?;

    let mut buffer = String::new();
    for line in lines {
        let line = line.map_err(io_error)?;
        buffer.push_str(&line);
        buffer.push('\n');
        if line.contains(';') || line.contains(END_OF_STATEMENT) {
            return Ok((buffer, false));
        }
    }
    Ok((buffer, true))
}

fn run_query(session: &Session, config: &Config, query: &Query) -> Result<()> {
    if config.print_ast {
        println!("{}", query);
    }
    let result = session.execute_query(query)?;
    result.render(&mut io::stdout().lock())
}

fn io_error(err: io::Error) -> Error {
    Error::Internal(err.to_string())
}
