use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use reel_analytics::config::{DEFAULT_LIMIT, MAX_LIMIT};
use reel_analytics::export::write_csv;
use reel_analytics::{FilterParams, QueryError, Service, ServiceConfig};

#[derive(Parser, Debug)]
#[command(version, about = "Query KPIs, charts and movie lists over a movie dataset")]
struct Cli {
    /// Dataset file (.csv, .json or .parquet).
    #[arg(long, env = "REEL_DATASET", default_value = "data/imdb.csv")]
    dataset: PathBuf,

    /// Page size when `--limit` is not given.
    #[arg(long, env = "REEL_DEFAULT_LIMIT", default_value_t = DEFAULT_LIMIT)]
    default_limit: usize,

    /// Largest accepted `--limit`.
    #[arg(long, env = "REEL_MAX_LIMIT", default_value_t = MAX_LIMIT)]
    max_limit: usize,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// KPIs plus genre and yearly distributions.
    Analytics {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Sorted, truncated movie list.
    Movies {
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        page: PageArgs,
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// A single movie by id.
    Movie { id: String },
    /// Write a movie list to a CSV file.
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        page: PageArgs,
        #[arg(long, short, default_value = "movies.csv")]
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
struct FilterArgs {
    #[arg(long)]
    year_min: Option<i64>,
    #[arg(long)]
    year_max: Option<i64>,
    /// Repeat to match any of several genres.
    #[arg(long = "genre")]
    genres: Vec<String>,
    /// Repeat to match any of several certificates.
    #[arg(long = "certificate")]
    certificates: Vec<String>,
    #[arg(long)]
    outliers_only: bool,
}

impl From<FilterArgs> for FilterParams {
    fn from(args: FilterArgs) -> Self {
        FilterParams {
            year_min: args.year_min,
            year_max: args.year_max,
            genres: args.genres.into_iter().collect(),
            certificates: args.certificates.into_iter().collect(),
            outliers_only: args.outliers_only,
        }
    }
}

#[derive(Args, Debug)]
struct PageArgs {
    /// outlier_score_desc, votes_desc, rating_desc, year_desc or title_asc.
    #[arg(long)]
    sort: Option<String>,
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Json,
    Csv,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            match e.downcast_ref::<QueryError>() {
                Some(q) if q.is_not_found() => ExitCode::from(3),
                Some(_) => ExitCode::from(2),
                None => ExitCode::FAILURE,
            }
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = ServiceConfig {
        dataset_path: cli.dataset,
        default_limit: cli.default_limit,
        max_limit: cli.max_limit,
    };
    let service = Service::open(config.clone())
        .with_context(|| format!("loading dataset {}", config.dataset_path.display()))?;

    match cli.command {
        Command::Analytics { filters } => {
            let summary = service.analytics(&filters.into());
            print_json(&summary, cli.pretty)
        }
        Command::Movies {
            filters,
            page,
            format,
        } => {
            let list = service.movies(&filters.into(), page.sort.as_deref(), page.limit)?;
            match format {
                Format::Json => print_json(&list, cli.pretty),
                Format::Csv => {
                    write_csv(&list.data, std::io::stdout().lock()).context("writing CSV")
                }
            }
        }
        Command::Movie { id } => {
            let record = service.movie(&id)?;
            print_json(&record, cli.pretty)
        }
        Command::Export {
            filters,
            page,
            output,
        } => {
            let list = service.movies(&filters.into(), page.sort.as_deref(), page.limit)?;
            let file = std::fs::File::create(&output)
                .with_context(|| format!("creating {}", output.display()))?;
            write_csv(&list.data, file).context("writing CSV")?;
            log::info!("Exported {} movies to {}", list.data.len(), output.display());
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    if pretty {
        serde_json::to_writer_pretty(&mut stdout, value)?;
    } else {
        serde_json::to_writer(&mut stdout, value)?;
    }
    writeln!(stdout)?;
    Ok(())
}
