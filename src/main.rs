use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use startup_analytics::cli::{self, FundingArgs, GlobalOptions, ListArgs};
use startup_analytics::error::AnalyticsResult;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "startup-analytics")]
#[command(about = "Fast analytics over a startup ecosystem spreadsheet")]
#[command(long_about = "Startup Analytics - cached loader for startup spreadsheets

The first run locates the header row (the first row with a 'Company' cell),
normalizes the sheet and saves a Parquet copy. Later runs read the copy until
the spreadsheet changes or the copy expires.

COMMANDS:
  list      - Filtered startup directory (optional .xlsx export)
  profile   - Single company card
  insights  - Sector, year, stage, founder and city breakdowns
  cache     - Inspect, rebuild or clear the Parquet cache

EXAMPLES:
  startup-analytics list --sector Fintech --city Mumbai
  startup-analytics list --min-funding 1000000 --export fintech.xlsx
  startup-analytics profile \"Acme Labs\"
  startup-analytics --source data/startups.xlsx cache rebuild")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// YAML config file
    #[arg(long, global = true, env = "STARTUP_ANALYTICS_CONFIG")]
    config: Option<PathBuf>,

    /// Source spreadsheet (.xlsx, .xls, .ods)
    #[arg(long, global = true, env = "STARTUP_ANALYTICS_SOURCE")]
    source: Option<PathBuf>,

    /// Parquet cache artifact
    #[arg(long, global = true, env = "STARTUP_ANALYTICS_CACHE")]
    cache: Option<PathBuf>,

    /// Maximum cache age in seconds (0 disables expiry)
    #[arg(long, global = true, env = "STARTUP_ANALYTICS_TTL")]
    ttl: Option<u64>,

    /// Worksheet name (default: first sheet)
    #[arg(long, global = true, env = "STARTUP_ANALYTICS_SHEET")]
    sheet: Option<String>,

    /// Scan the whole sheet for the header when the first rows miss it
    #[arg(long, global = true, env = "STARTUP_ANALYTICS_FULL_SCAN")]
    full_scan: bool,

    /// Show debug logs on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

impl From<&GlobalArgs> for GlobalOptions {
    fn from(args: &GlobalArgs) -> Self {
        GlobalOptions {
            config: args.config.clone(),
            source: args.source.clone(),
            cache: args.cache.clone(),
            ttl: args.ttl,
            sheet: args.sheet.clone(),
            full_scan: args.full_scan,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "List startups matching every selected filter.

Repeat a flag to allow several values (--sector Fintech --sector Edtech).
Filters on columns the sheet does not have are ignored with a warning.

FUNDING:
  --unfunded-only        only startups without a disclosed amount
  --min-funding/--max-funding  inclusive range in absolute currency units
  --exclude-unfunded     drop startups without a disclosed amount")]
    /// Filtered startup directory
    List {
        /// Sector to include
        #[arg(long = "sector")]
        sectors: Vec<String>,

        /// City to include
        #[arg(long = "city")]
        cities: Vec<String>,

        /// Tier to include
        #[arg(long = "tier")]
        tiers: Vec<String>,

        /// Hot-startup value to include
        #[arg(long = "hot")]
        hot: Vec<String>,

        /// Case-insensitive search in the keywords column
        #[arg(short, long)]
        keyword: Option<String>,

        /// Only startups without disclosed funding
        #[arg(long, conflicts_with_all = ["min_funding", "max_funding", "exclude_unfunded"])]
        unfunded_only: bool,

        /// Minimum funding (inclusive)
        #[arg(long)]
        min_funding: Option<f64>,

        /// Maximum funding (inclusive)
        #[arg(long)]
        max_funding: Option<f64>,

        /// Drop startups without disclosed funding
        #[arg(long)]
        exclude_unfunded: bool,

        /// Show at most this many rows
        #[arg(short, long)]
        limit: Option<usize>,

        /// Write the filtered rows to an .xlsx file
        #[arg(short, long)]
        export: Option<PathBuf>,

        /// Emit JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Single company card
    Profile {
        /// Company name (default: first in alphabetical order)
        company: Option<String>,

        /// Emit JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Ecosystem breakdowns
    Insights {
        /// Emit JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Inspect or manage the Parquet cache
    #[command(subcommand)]
    Cache(CacheCommand),
}

#[derive(Subcommand)]
enum CacheCommand {
    /// Show artifact state without touching it
    Status {
        /// Emit JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// Rebuild the artifact from the spreadsheet
    Rebuild,
    /// Delete the artifact
    Clear,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "startup_analytics=debug"
    } else {
        "startup_analytics=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> AnalyticsResult<()> {
    let config = GlobalOptions::from(&cli.global).resolve()?;

    match cli.command {
        Commands::List {
            sectors,
            cities,
            tiers,
            hot,
            keyword,
            unfunded_only,
            min_funding,
            max_funding,
            exclude_unfunded,
            limit,
            export,
            json,
        } => cli::list(
            config,
            ListArgs {
                sectors,
                cities,
                tiers,
                hot,
                keyword,
                funding: FundingArgs {
                    unfunded_only,
                    min: min_funding,
                    max: max_funding,
                    exclude_unfunded,
                },
                limit,
                export,
                json,
            },
        ),

        Commands::Profile { company, json } => cli::profile(config, company, json),

        Commands::Insights { json } => cli::insights(config, json),

        Commands::Cache(CacheCommand::Status { json }) => cli::cache_status(config, json),
        Commands::Cache(CacheCommand::Rebuild) => cli::cache_rebuild(config),
        Commands::Cache(CacheCommand::Clear) => cli::cache_clear(config),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "❌ Error:".bold().red(), e);
        std::process::exit(1);
    }
}
