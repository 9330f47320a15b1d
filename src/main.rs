use clap::{Parser, Subcommand};
use cropscope::cli::{self, AnalyzeOptions};
use cropscope::config::DEFAULT_HEADER_SKIP;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cropscope")]
#[command(about = "County crop production analytics over multi-year Excel workbooks.")]
#[command(long_about = "Cropscope - county crop production analytics
One workbook per commodity, one sheet per year.

COMMANDS:
  analyze   - Yearly totals, top producers, variability, yield/price, periods
  inspect   - List sheets, years, columns and row counts of a workbook

EXAMPLES:
  cropscope analyze -s carrot=carrots.xlsx -s tomato=tomatoes.xlsx
  cropscope analyze -c cropscope.yaml --report report.xlsx --csv-dir tables/
  cropscope inspect carrots.xlsx

Set RUST_LOG=cropscope=debug for per-sheet diagnostics.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Run the full analysis over every configured commodity.

SOURCES:
  Commodity workbooks come from a YAML config file, from --source NAME=PATH
  arguments, or both (--source replaces a config entry with the same name).

  commodities:
    - name: carrot
      path: carrots.xlsx
    - name: tomato
      path: tomatoes.xlsx
  header_skip: 2
  period_boundary: 2013
  aggregate_label: Province
  top_n: 5

OUTPUTS:
  Terminal summary (always)
  --report FILE.xlsx   tables and native Excel charts
  --csv-dir DIR        one CSV per derived table
  --json FILE.json     the whole analysis as JSON

Rows with a blank or non-numeric required field are dropped and counted.
Regions observed in a single year have no standard deviation or CV (NA).")]
    /// Analyze commodity workbooks
    Analyze {
        /// YAML config file
        #[arg(short, long, env = "CROPSCOPE_CONFIG")]
        config: Option<PathBuf>,

        /// Commodity workbook as NAME=PATH (repeatable)
        #[arg(short, long = "source")]
        sources: Vec<String>,

        /// Preamble rows above each sheet's header
        #[arg(long, env = "CROPSCOPE_SKIP_ROWS")]
        skip_rows: Option<usize>,

        /// Last year of the early period
        #[arg(long, env = "CROPSCOPE_BOUNDARY_YEAR")]
        boundary_year: Option<i32>,

        /// Region label of the aggregate row to exclude
        #[arg(long, env = "CROPSCOPE_AGGREGATE_LABEL")]
        aggregate_label: Option<String>,

        /// Number of top regions per ranking
        #[arg(long)]
        top: Option<usize>,

        /// Write an Excel report with charts
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Write every table as CSV into this directory
        #[arg(long)]
        csv_dir: Option<PathBuf>,

        /// Write the analysis as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Inspect the sheets of a workbook
    Inspect {
        /// Path to the workbook (.xlsx, .xls, .ods)
        file: PathBuf,

        /// Preamble rows above each sheet's header
        #[arg(long, env = "CROPSCOPE_SKIP_ROWS", default_value_t = DEFAULT_HEADER_SKIP)]
        skip_rows: usize,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "cropscope=info" } else { "cropscope=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            config,
            sources,
            skip_rows,
            boundary_year,
            aggregate_label,
            top,
            report,
            csv_dir,
            json,
            verbose,
        } => {
            init_tracing(verbose);
            cli::analyze(AnalyzeOptions {
                config,
                sources,
                skip_rows,
                boundary_year,
                aggregate_label,
                top,
                report,
                csv_dir,
                json,
                verbose,
            })?
        }

        Commands::Inspect { file, skip_rows } => {
            init_tracing(false);
            cli::inspect(file, skip_rows)?
        }
    }

    Ok(())
}
