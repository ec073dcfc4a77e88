mod catalog;
mod pricing;
mod schedule;

use anyhow::Context as _;
use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};
use dynamate_client::DynamateClient;
use dynamate_core::{parse_local_datetime, FilterSelection, PriceRule, RuleParameter};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "dynamate")]
#[command(about = "Preview, simulate, and schedule bulk price changes")]
struct Cli {
    /// Backend base URL; overrides DYNAMATE_API_BASE_URL
    #[arg(long, global = true)]
    api_base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List product tags available as filters
    Tags,
    /// List collections available as filters
    Collections,
    /// Fetch matching variants and show the prices a rule would produce
    Preview {
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        rule: RuleArgs,
        /// When the change would apply (YYYY-MM-DDTHH:MM, local time)
        #[arg(long, value_parser = parse_local_datetime)]
        apply_at: Option<NaiveDateTime>,
        /// When the change would revert (YYYY-MM-DDTHH:MM, local time)
        #[arg(long, value_parser = parse_local_datetime)]
        revert_at: Option<NaiveDateTime>,
    },
    /// Evaluate a rule against a single price pair without contacting the backend
    Evaluate {
        /// Current base price
        #[arg(long, allow_negative_numbers = true)]
        price: String,
        /// Current compare-at price
        #[arg(long, allow_negative_numbers = true)]
        compare_at: Option<String>,
        #[command(flatten)]
        rule: RuleArgs,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Ask the backend to simulate a rule without applying it
    Simulate {
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        rule: RuleArgs,
    },
    /// Schedule a price change, applied now or at a later time
    Schedule {
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        rule: RuleArgs,
        /// Optional label for the schedule
        #[arg(long)]
        title: Option<String>,
        /// When to apply (YYYY-MM-DDTHH:MM, local time); omit to apply now
        #[arg(long, value_parser = parse_local_datetime)]
        apply_at: Option<NaiveDateTime>,
        /// When to revert (YYYY-MM-DDTHH:MM, local time)
        #[arg(long, value_parser = parse_local_datetime)]
        revert_at: Option<NaiveDateTime>,
        /// Validate and print the request without submitting it
        #[arg(long)]
        dry_run: bool,
    },
    /// Revert prices for the selected products immediately
    Revert {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// List the available price rules
    Rules,
}

/// Product selection: exactly one of `--tag` or `--collection`.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct FilterArgs {
    /// Select variants by product tag
    #[arg(long)]
    tag: Option<String>,
    /// Select variants by collection ID
    #[arg(long, value_name = "ID")]
    collection: Option<String>,
}

impl FilterArgs {
    fn selection(&self) -> anyhow::Result<FilterSelection> {
        Ok(FilterSelection::from_parts(
            self.tag.as_deref(),
            self.collection.as_deref(),
        )?)
    }
}

#[derive(Debug, Args)]
struct RuleArgs {
    /// Price rule id (see `dynamate rules`)
    #[arg(long)]
    rule: Option<PriceRule>,
    /// Percent or amount for rules that take a value
    #[arg(long, allow_negative_numbers = true)]
    value: Option<RuleParameter>,
}

impl RuleArgs {
    /// Parameter for local evaluation; a missing value counts as zero.
    fn parameter_or_zero(&self) -> RuleParameter {
        self.value.unwrap_or(RuleParameter::ZERO)
    }
}

fn init_tracing(log_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn connect(api_base_url: Option<&str>) -> anyhow::Result<DynamateClient> {
    let config = dynamate_core::load_app_config_with_base_url(api_base_url)?;
    init_tracing(&config.log_level)?;
    tracing::debug!(env = %config.env, api_base_url = %config.api_base_url, "configuration loaded");
    DynamateClient::new(&config).context("failed to build backend client")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let api_base_url = cli.api_base_url.as_deref();

    match cli.command {
        Commands::Tags => catalog::run_tags(&connect(api_base_url)?).await,
        Commands::Collections => catalog::run_collections(&connect(api_base_url)?).await,
        Commands::Preview {
            filter,
            rule,
            apply_at,
            revert_at,
        } => {
            let filter = filter.selection()?;
            let client = connect(api_base_url)?;
            pricing::run_preview(&client, &filter, &rule, apply_at, revert_at).await
        }
        Commands::Evaluate {
            price,
            compare_at,
            rule,
            json,
        } => {
            init_tracing("warn")?;
            pricing::run_evaluate(&price, compare_at.as_deref(), &rule, json)
        }
        Commands::Simulate { filter, rule } => {
            let filter = filter.selection()?;
            let client = connect(api_base_url)?;
            pricing::run_simulate(&client, filter, &rule).await
        }
        Commands::Schedule {
            filter,
            rule,
            title,
            apply_at,
            revert_at,
            dry_run,
        } => {
            let payload = schedule::ScheduleArgs {
                filter: filter.selection()?,
                rule: rule.rule,
                value: rule.value,
                title,
                apply_at,
                revert_at,
            }
            .into_payload()?;
            if dry_run {
                init_tracing("warn")?;
                return schedule::run_dry_run(&payload);
            }
            schedule::run_schedule(&connect(api_base_url)?, &payload).await
        }
        Commands::Revert { filter } => {
            let filter = filter.selection()?;
            schedule::run_revert(&connect(api_base_url)?, filter).await
        }
        Commands::Rules => {
            catalog::print_rules();
            Ok(())
        }
    }
}
