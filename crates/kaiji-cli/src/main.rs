mod config;
mod display;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use kaiji_core::ListingDate;
use kaiji_harvest::{PORTAL_BASE_URL, PortalClient, RetryPolicy};
use kaiji_pipeline::{
    Enricher, Harvester, PdfTextExtractor, PipelineError, Throttle, TriageEngine, run_batch,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::{Layout, ModelConfig};

#[derive(Parser)]
#[command(name = "kaiji", version)]
#[command(about = "Harvest timely-disclosure listings and flag misconduct notices")]
struct Cli {
    /// Root for listings, the alert store and downloaded documents.
    #[arg(long, env = "KAIJI_DATA_DIR", default_value = ".", global = true)]
    data_dir: PathBuf,

    /// Debug-level logging (RUST_LOG still wins).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ListingDirArg {
    /// Listing directory (default: <data-dir>/output).
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct ModelArgs {
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "KAIJI_MODEL", default_value = kaiji_ai::DEFAULT_MODEL)]
    model: String,

    /// Messages API base URL override.
    #[arg(long, env = "KAIJI_API_BASE_URL")]
    api_base_url: Option<String>,
}

impl ModelArgs {
    fn into_config(self) -> ModelConfig {
        ModelConfig {
            api_key: self.api_key,
            model: self.model,
            base_url: self.api_base_url,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Harvest one date's listing.
    Harvest {
        /// YYYYMMDD, YYYY-MM-DD or YYYY/MM/DD.
        #[arg(long)]
        date: ListingDate,
        #[command(flatten)]
        dir: ListingDirArg,
    },
    /// Harvest every date in an inclusive range, skipping existing listings.
    Batch {
        #[arg(long)]
        start: ListingDate,
        #[arg(long)]
        end: ListingDate,
        #[command(flatten)]
        dir: ListingDirArg,
    },
    /// Classify harvested titles and download matching documents.
    Triage {
        #[arg(long, conflicts_with = "all", required_unless_present = "all")]
        date: Option<ListingDate>,
        /// Every harvested date not yet in the alert store.
        #[arg(long)]
        all: bool,
        #[command(flatten)]
        dir: ListingDirArg,
        #[command(flatten)]
        model: ModelArgs,
    },
    /// Summarize downloaded documents of triaged alerts.
    Enrich {
        /// Maximum records to process (0 = all).
        #[arg(long, default_value_t = 0)]
        limit: usize,
        #[command(flatten)]
        model: ModelArgs,
    },
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    // Directive targets are prefixes, so `kaiji` covers every kaiji_* crate.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("kaiji={level}")))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;
    info!("kaiji v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Harvest { date, dir } => {
            let layout = Layout::new(&cli.data_dir, dir.output.as_deref());
            let portal = PortalClient::new(PORTAL_BASE_URL, RetryPolicy::default())?;
            let listings = layout.listings();
            let harvester = Harvester::new(&portal, &listings, Throttle::default());
            let outcome = harvester
                .harvest(date)
                .await
                .with_context(|| format!("harvesting {date}"))?;
            println!("{}", display::harvest(&date.to_string(), outcome));
        }

        Command::Batch { start, end, dir } => {
            let dates = ListingDate::range(start, end)?;
            let layout = Layout::new(&cli.data_dir, dir.output.as_deref());
            let portal = PortalClient::new(PORTAL_BASE_URL, RetryPolicy::default())?;
            let listings = layout.listings();
            let harvester = Harvester::new(&portal, &listings, Throttle::default());
            info!(start = %start, end = %end, days = dates.len(), "batch harvest");
            let report = run_batch(&harvester, &dates).await;
            println!("{}", display::batch(&report));
        }

        Command::Triage {
            date,
            all: _,
            dir,
            model,
        } => {
            let classifier = model.into_config().classifier()?;
            let layout = Layout::new(&cli.data_dir, dir.output.as_deref());
            let listings = layout.listings();
            let alerts = layout.alerts();
            let documents = layout.documents();
            let portal = PortalClient::new(PORTAL_BASE_URL, RetryPolicy::default())?;
            let engine = TriageEngine {
                listings: &listings,
                alerts: &alerts,
                documents: &documents,
                downloader: &portal,
                classifier: &classifier,
                throttle: Throttle::default(),
                detected_on: chrono::Local::now().date_naive(),
            };

            // clap guarantees exactly one of --date and --all.
            if let Some(date) = date {
                match engine.triage_date(date).await {
                    Ok(outcome) => println!("{}", display::triage_date(&date.to_string(), outcome)),
                    // The date stays un-triaged and is picked up by a later run.
                    Err(PipelineError::Classifier(e)) => {
                        error!(date = %date, error = %e, "classification failed");
                    }
                    Err(e) => return Err(e).with_context(|| format!("triaging {date}")),
                }
            } else {
                let summary = engine.triage_all().await?;
                println!("{}", display::triage_all(&summary));
            }
        }

        Command::Enrich { limit, model } => {
            let summarizer = model.into_config().summarizer()?;
            let layout = Layout::new(&cli.data_dir, None);
            let alerts = layout.alerts();
            let documents = layout.documents();
            let enricher = Enricher {
                alerts: &alerts,
                documents: &documents,
                extractor: &PdfTextExtractor,
                summarizer: &summarizer,
            };
            let limit = (limit > 0).then_some(limit);
            let report = enricher.enrich(limit).await?;
            println!("{}", display::enrich(&report));
        }
    }

    Ok(())
}
