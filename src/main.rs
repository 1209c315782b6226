// Entry point and high-level CLI flow.
//
// - `etl` pulls both datasets from data.gov.in and replaces the tables.
// - `ask` answers one free-text question; `query` runs a plan given as flags.
// - `regions` and `inspect` describe what the store holds.
// - With no subcommand, a small numbered menu loops until the user exits.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use samarth::config::Config;
use samarth::dashboard::{render_answer, render_error, Dashboard};
use samarth::etl::{run_extract_load, DataGovClient, ResourceLoad};
use samarth::inspect::describe_store;
use samarth::output;
use samarth::store::Store;
use samarth::types::{Action, QueryPlan, DEFAULT_TIME_PERIOD_YEARS, DEFAULT_TOP_N};
use samarth::util::format_int;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "samarth")]
#[command(about = "Ask questions about district crop production and rainfall")]
struct Args {
    /// SQLite database path (overrides SAMARTH_DB_PATH)
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Args)]
struct ResultOptions {
    /// Print the result rows as a table
    #[arg(long)]
    table: bool,

    /// Write the result rows to a CSV file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Print the query plan as JSON
    #[arg(long)]
    plan_json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch both datasets and replace the stored tables
    Etl {
        /// Override the per-resource record limit
        #[arg(long)]
        limit: Option<usize>,

        /// Write the load report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Answer a free-text question
    Ask {
        question: String,

        #[command(flatten)]
        opts: ResultOptions,
    },
    /// Run a plan given directly, skipping question parsing
    Query {
        /// top_crops, rainfall_only, compare_states or production_only
        #[arg(long, default_value = "production_only")]
        action: String,

        /// Region name; repeat for comparisons
        #[arg(long = "region")]
        regions: Vec<String>,

        #[arg(long, default_value_t = DEFAULT_TIME_PERIOD_YEARS)]
        years: u32,

        #[arg(long, default_value_t = DEFAULT_TOP_N)]
        top: u32,

        #[command(flatten)]
        opts: ResultOptions,
    },
    /// List the districts the dashboard knows about
    Regions,
    /// Describe the tables in the store
    Inspect,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let mut cfg = Config::from_env().context("reading configuration")?;
    if let Some(db) = args.db {
        cfg.db_path = db;
    }

    let mut store = Store::open(&cfg.db_path)
        .with_context(|| format!("opening {}", cfg.db_path.display()))?;

    let result = match args.command {
        Some(Command::Etl { limit, report }) => handle_etl(&cfg, &mut store, limit, report),
        Some(Command::Ask { question, opts }) => {
            let dash = Dashboard::new(&store);
            let plan = dash.plan(&question);
            handle_plan(&dash, plan, &opts)
        }
        Some(Command::Query {
            action,
            regions,
            years,
            top,
            opts,
        }) => {
            let dash = Dashboard::new(&store);
            let plan = QueryPlan::new(Action::from_tag(&action), regions, years, top);
            handle_plan(&dash, plan, &opts)
        }
        Some(Command::Regions) => {
            let dash = Dashboard::new(&store);
            for region in dash.list_available_regions() {
                println!("{}", region);
            }
            Ok(())
        }
        Some(Command::Inspect) => describe_store(&store)
            .map(|text| println!("{}", text))
            .map_err(anyhow::Error::from),
        None => {
            run_menu(&Dashboard::new(&store));
            Ok(())
        }
    };

    store.close()?;
    info!("store closed");
    result
}

fn handle_etl(
    cfg: &Config,
    store: &mut Store,
    limit: Option<usize>,
    report_path: Option<PathBuf>,
) -> Result<()> {
    let client = DataGovClient::new(cfg)?;
    println!("Starting extract-load...");
    let report = run_extract_load(&client, store, limit.unwrap_or(cfg.page_limit));

    for (name, load) in [("Agriculture", &report.agriculture), ("Rainfall", &report.climate)] {
        match load {
            ResourceLoad::Loaded(r) => println!(
                "{}: {} rows loaded ({} fetched, {} dropped)",
                name,
                format_int(r.kept_rows),
                format_int(r.total_rows),
                format_int(r.dropped_rows)
            ),
            ResourceLoad::Skipped { reason } => println!("{}: skipped ({})", name, reason),
        }
    }
    if let Some(path) = report_path {
        output::write_json(&path, &report)?;
        println!("(Load report exported to {})", path.display());
    }
    Ok(())
}

fn handle_plan(dash: &Dashboard<'_>, plan: QueryPlan, opts: &ResultOptions) -> Result<()> {
    if opts.plan_json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    }
    let answer = match dash.answer_plan(plan) {
        Ok(a) => a,
        Err(e) => {
            println!("{}", render_error(&e));
            return Ok(());
        }
    };
    println!("{}", render_answer(&answer));
    if opts.table {
        println!("\n{}", output::render_result(&answer.outcome.table, usize::MAX));
    }
    if let Some(path) = &opts.export {
        output::write_result_csv(path, &answer.outcome.table)?;
        println!("\n(Full table exported to {})", path.display());
    }
    Ok(())
}

/// Read a single line of input after printing `prompt`.
fn read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Ask whether to go back to the menu. `None` on end of input.
fn prompt_back_to_menu() -> Option<bool> {
    loop {
        let resp = read_line("Back to menu (Y/N): ")?.to_uppercase();
        match resp.as_str() {
            "Y" => return Some(true),
            "N" => return Some(false),
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn run_menu(dash: &Dashboard<'_>) {
    println!("{}", dash.region_overview());
    loop {
        println!("Select an option:");
        println!("[1] Ask a question");
        println!("[2] List districts");
        println!("[3] Exit\n");
        let Some(choice) = read_line("Enter choice: ") else {
            break;
        };
        match choice.as_str() {
            "1" => {
                let Some(question) = read_line("Ask your question: ") else {
                    break;
                };
                println!("\n{}\n", dash.ask(&question));
                match prompt_back_to_menu() {
                    Some(true) => {}
                    _ => {
                        println!("Exiting the program.");
                        break;
                    }
                }
            }
            "2" => println!("{}", dash.region_overview()),
            "3" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 1, 2 or 3.\n"),
        }
    }
}
