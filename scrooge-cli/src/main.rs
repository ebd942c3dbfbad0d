use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use scrooge_core::{Row, SheetsConfig};
use scrooge_ingest::StatementParser;
use scrooge_sheets::{
    GoogleSheetsBackend, IngestError, IngestOptions, IngestReport, InsertionEngine, MemoryBackend, RetryPolicy,
    RetryingTableClient, SheetsBackend,
};
use std::path::{Path, PathBuf};
use tracing::debug;

mod config;
mod logging;
mod state;

use config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "scrooge",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("SCROOGE_BUILD_SHA"), ")"),
    about = "Load Revolut and UniCredit statements into a Google spreadsheet"
)]
struct Cli {
    /// Config file (default: ~/.scrooge/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG still wins)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a statement and print its rows
    Parse {
        /// Bank that produced the file: revolut | unicredit
        #[arg(long)]
        bank: String,

        /// Statement file (.csv, .xlsx, .xlsm, .xls, .ods)
        file: PathBuf,

        /// Print rows as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Parse a statement and insert it into the income/expense worksheets
    Ingest {
        #[arg(long)]
        bank: String,

        file: PathBuf,

        /// Only insert rows newer than the one at each anchor row
        #[arg(long)]
        resume: bool,

        /// Insert oldest first (default: newest first)
        #[arg(long)]
        ordered: bool,

        /// Ingest into an in-memory spreadsheet and print the result
        #[arg(long)]
        dry_run: bool,
    },

    /// Manage ~/.scrooge/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,
    /// Print the effective config
    Show,
    /// Print the config file location
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg_path = config::config_path(cli.config.as_deref())?;

    if let Command::Config { command } = &cli.command {
        return match command {
            ConfigCommand::Init => config::init_config(&cfg_path),
            ConfigCommand::Path => {
                println!("{}", cfg_path.display());
                Ok(())
            }
            ConfigCommand::Show => {
                let cfg = config::load_config(&cfg_path)?;
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
                Ok(())
            }
        };
    }

    let cfg = config::load_config(&cfg_path)?;
    logging::init_logging(&cfg.logging.level, cfg.logging.format, cli.verbose)?;
    debug!(config = %cfg_path.display(), "loaded config");

    match cli.command {
        Command::Parse { bank, file, json } => parse(&bank, &file, json)?,
        Command::Ingest {
            bank,
            file,
            resume,
            ordered,
            dry_run,
        } => {
            let options = IngestOptions {
                resume_mode: resume,
                ordered,
            };
            ingest(&cfg, &bank, &file, options, dry_run).await?;
        }
        Command::Config { .. } => {}
    }

    Ok(())
}

fn read_statement(bank: &str, file: &Path) -> Result<(StatementParser, Vec<Row>)> {
    if !file.exists() {
        bail!("statement not found: {}", file.display());
    }
    let parser = StatementParser::new(file, bank)?;
    let rows = parser
        .clone()
        .parse()
        .with_context(|| format!("parsing {}", file.display()))?;
    Ok((parser, rows))
}

fn parse(bank: &str, file: &Path, json: bool) -> Result<()> {
    let (_, rows) = read_statement(bank, file)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    for row in &rows {
        println!("{}", row.join("\t"));
    }
    println!(
        "\nParsed {} transactions from {}",
        rows.len().saturating_sub(1),
        file.display()
    );
    Ok(())
}

async fn ingest(cfg: &Config, bank: &str, file: &Path, options: IngestOptions, dry_run: bool) -> Result<()> {
    let (parser, rows) = read_statement(bank, file)?;
    let sheets = &cfg.spreadsheet;
    let policy = RetryPolicy::from_config(sheets);

    let report = if dry_run {
        let backend = MemoryBackend::new()
            .with_worksheet(&sheets.worksheet_income_name, Vec::new())
            .with_worksheet(&sheets.worksheet_expenses_name, Vec::new());
        let mut engine = InsertionEngine::new(RetryingTableClient::new(backend, policy), sheets, parser.bank());
        let report = run_engine(&mut engine, &rows, options).await?;
        print_preview(engine.client().backend(), sheets);
        report
    } else {
        if sheets.spreadsheet_id.trim().is_empty() {
            bail!("spreadsheet.spreadsheet_id is not set (run `scrooge config path` to find the file)");
        }
        let token = config::resolve_token(sheets, std::env::var(config::TOKEN_ENV).ok())?;
        let backend = GoogleSheetsBackend::new(&sheets.spreadsheet_id, token)?;
        let mut engine = InsertionEngine::new(RetryingTableClient::new(backend, policy), sheets, parser.bank());
        run_engine(&mut engine, &rows, options).await?
    };

    print_report(&report);
    Ok(())
}

async fn run_engine<B: SheetsBackend>(
    engine: &mut InsertionEngine<B>,
    rows: &[Row],
    options: IngestOptions,
) -> Result<IngestReport> {
    match engine.ingest(rows, options).await {
        Ok(report) => Ok(report),
        Err(IngestError::Interrupted { report, source }) => {
            print_report(&report);
            Err(anyhow::Error::new(source).context(format!(
                "ingest stopped after inserting {} incomes and {} expenses",
                report.income_inserted, report.expense_inserted
            )))
        }
        Err(err) => Err(err.into()),
    }
}

fn print_report(report: &IngestReport) {
    let [income, expense] = report.counts();
    println!("Incomes {income} / Expenses {expense}");
    if report.skipped > 0 {
        println!("Skipped {} rows already in the spreadsheet", report.skipped);
    }
    if !report.rejected.is_empty() {
        println!("Rejected {} rows with unreadable dates:", report.rejected.len());
        for r in &report.rejected {
            println!("  [{:?}] '{}': {}", r.flow, r.key, r.reason);
        }
    }
}

fn print_preview(backend: &MemoryBackend, sheets: &SheetsConfig) {
    for name in [&sheets.worksheet_income_name, &sheets.worksheet_expenses_name] {
        let rows = backend.rows(name).unwrap_or_default();
        println!("## {name}");
        for (idx, row) in rows.iter().enumerate() {
            if !row.is_empty() {
                println!("{:>4}  {}", idx + 1, row.join("\t"));
            }
        }
        println!();
    }
}
