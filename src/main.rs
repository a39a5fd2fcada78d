use clap::Parser;
use ledgerbook::args::{Args, Command, ExpenseAction, IncomeAction, UtilitiesAction};
use ledgerbook::{commands, Config, FileDocument, FileStore, MonthKey, Result, SyncEngine};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let mut config = Config::load_or_create(args.common().home())?;
    let cache = Arc::new(FileStore::new(config.cache_dir())?);
    let mut engine = SyncEngine::new(cache);

    // Keep mirroring to the workbook attached by a previous invocation.
    if let Some(path) = config.document() {
        engine.resume(Arc::new(FileDocument::new(path)));
    }

    let month = args.common().month().unwrap_or_else(MonthKey::current);

    // Route to the appropriate command handler
    let _: () = match args.command() {
        Command::Expense { action } => match action {
            ExpenseAction::Add(add_args) => {
                commands::add_expense(&mut engine, month, add_args)?.print()
            }
            ExpenseAction::Delete(id_args) => {
                commands::delete_expense(&mut engine, month, id_args.id())?.print()
            }
            ExpenseAction::Update(update_args) => {
                commands::update_expense(&mut engine, month, update_args)?.print()
            }
            ExpenseAction::List => commands::list_expenses(&engine, month)?.print(),
        },

        Command::Income { action } => match action {
            IncomeAction::Add(add_args) => {
                commands::add_income(&mut engine, month, add_args)?.print()
            }
            IncomeAction::Delete(id_args) => {
                commands::delete_income(&mut engine, month, id_args.id())?.print()
            }
            IncomeAction::List => commands::list_incomes(&engine, month)?.print(),
        },

        Command::Utilities { action } => match action {
            UtilitiesAction::Set(set_args) => {
                commands::set_utilities(&mut engine, month, set_args)?.print()
            }
            UtilitiesAction::Show => commands::show_utilities(&engine, month)?.print(),
        },

        Command::Split => commands::show_split(&engine, month)?.print(),

        Command::Summary => commands::show_summary(&engine, month)?.print(),

        Command::Create(doc_args) => {
            commands::create(&mut config, &mut engine, doc_args.path())
                .await?
                .print()
        }

        Command::Open(doc_args) => {
            commands::open(&mut config, &mut engine, doc_args.path())
                .await?
                .print()
        }

        Command::Detach => commands::detach(&mut config, &mut engine)?.print(),

        Command::Export(doc_args) => commands::export(&engine, doc_args.path())?.print(),

        Command::Status => commands::status(&config, &engine)?.print(),

        Command::Clear(clear_args) => commands::clear(&mut engine, clear_args.yes())?.print(),

        Command::Backup(doc_args) => commands::backup(&engine, doc_args.path())?.print(),

        Command::Restore(doc_args) => commands::restore(&mut engine, doc_args.path())?.print(),
    };

    // The process is about to exit; write any pending snapshot instead of
    // waiting out the debounce window.
    engine.flush().await?;
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
