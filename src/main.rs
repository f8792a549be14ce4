use anyhow::{bail, Context};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use show_pricing::app::ports::{CatalogSnapshot, HttpClientPort, SnapshotStorePort};
use show_pricing::cache::SqliteSnapshotStore;
use show_pricing::catalog::{Catalog, CatalogLoader, TourScheduleCrawler, TraceLevel};
use show_pricing::classify::TierClassifier;
use show_pricing::config::Config;
use show_pricing::constants::CATALOG_SNAPSHOT_ID;
use show_pricing::error::ScraperError;
use show_pricing::export::write_task_exports;
use show_pricing::infra::{OpenAiCompletion, ReqwestHttp, WebDriverLauncher};
use show_pricing::logging;
use show_pricing::orchestrator::{BatchOutcome, Orchestrator};
use show_pricing::transform::{build_rows, format_pricing_by_date};
use show_pricing::types::{ExtractionTask, PricingRow, ShowListing, TaskSubmission};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "show_pricing")]
#[command(about = "Group ticket pricing extractor for show pricing grids")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML config file; defaults apply when it is missing
    #[arg(long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the show catalog and list shows that have pricing
    Catalog {
        /// Print the full load report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run a batch of extraction tasks from a JSON file
    Run {
        /// JSON array of {"show", "fromDate", "toDate"}
        #[arg(long)]
        tasks: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Map each task's prices onto the five group tiers
        #[arg(long)]
        classify: bool,
        /// Directory for task_{n}_data.json exports
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Extract one show page directly, without the catalog
    Scrape {
        #[arg(long)]
        url: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: Option<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Show touring schedules, from the cache unless a refresh is requested
    Tours {
        #[arg(long)]
        refresh: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Table,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();
    show_pricing::metrics::init_metrics();

    let cli = Cli::parse();
    let config = Config::load(&cli.config).context("Failed to load configuration")?;
    let http: Arc<dyn HttpClientPort> = Arc::new(ReqwestHttp::new());

    match cli.command {
        Commands::Catalog { json } => {
            let catalog = Catalog::new();
            let loader = CatalogLoader::new(http, &config.catalog.base_url, &config.catalog_listing_url());
            let report = catalog.refresh(&loader).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            for entry in report.trace.iter().filter(|e| e.level != TraceLevel::Info) {
                eprintln!("  - {}", entry.message);
            }
            if let Some(error) = &report.error {
                eprintln!("⚠️  {}", error);
            }
            let today = Local::now().date_naive();
            for show in catalog.current().iter() {
                let (from, to) = show.date_window(today);
                println!(
                    "{}\t{}\t{} - {}",
                    show.title,
                    show.detail_url,
                    from.format("%m/%d/%Y"),
                    to.format("%m/%d/%Y")
                );
            }
            println!(
                "\n📊 {} shows with pricing, {} skipped",
                report.shows.len(),
                report.skipped_count()
            );
        }
        Commands::Run {
            tasks,
            format,
            classify,
            out,
        } => {
            let content = std::fs::read_to_string(&tasks)
                .with_context(|| format!("Failed to read tasks file {}", tasks.display()))?;
            let submissions: Vec<TaskSubmission> =
                serde_json::from_str(&content).context("Tasks file is not a JSON array of tasks")?;

            let catalog = Catalog::new();
            let loader = CatalogLoader::new(http, &config.catalog.base_url, &config.catalog_listing_url());
            let report = catalog.refresh(&loader).await;
            if let Some(error) = &report.error {
                warn!("Catalog loaded with errors: {}", error);
            }

            let outcome = run_tasks(&config, catalog.resolve(&submissions)).await?;
            print_outcome(&outcome, format);

            if classify {
                classify_outcome(&config, &outcome).await?;
            }
            if let Some(dir) = out {
                write_task_exports(&dir, &outcome.results)?;
            }
        }
        Commands::Scrape {
            url,
            from,
            to,
            format,
        } => {
            let show = ShowListing {
                title: show_title_from_url(&url),
                detail_url: url,
                first_performance: String::new(),
                on_sale_through: String::new(),
            };
            let task = ExtractionTask::new(0, show, &from, to.as_deref().unwrap_or(""));
            let outcome = run_tasks(&config, vec![task]).await?;
            print_outcome(&outcome, format);
        }
        Commands::Tours { refresh } => {
            let store = SqliteSnapshotStore::open(&config.cache.path)?;
            let cached = if refresh {
                None
            } else {
                store.read(CATALOG_SNAPSHOT_ID).await.map_err(ScraperError::Cache)?
            };

            let snapshot = match cached {
                Some(snapshot) => {
                    info!("Using cached tour snapshot from {}", snapshot.last_scraped);
                    snapshot
                }
                None => {
                    let crawler = TourScheduleCrawler::new(
                        http,
                        &config.tours.base_url,
                        &config.tours.list_path,
                        Duration::from_millis(config.tours.request_delay_ms),
                    );
                    let stops = crawler.crawl().await?;
                    let snapshot = CatalogSnapshot {
                        rows: stops
                            .iter()
                            .map(serde_json::to_value)
                            .collect::<Result<_, _>>()?,
                        last_scraped: Utc::now(),
                    };
                    store
                        .upsert(CATALOG_SNAPSHOT_ID, &snapshot)
                        .await
                        .map_err(ScraperError::Cache)?;
                    snapshot
                }
            };

            println!("{}", serde_json::to_string_pretty(&snapshot.rows)?);
            eprintln!(
                "\n📊 {} tour rows, last scraped {}",
                snapshot.rows.len(),
                snapshot.last_scraped.with_timezone(&Local).format("%Y-%m-%d %H:%M")
            );
        }
    }

    Ok(())
}

async fn run_tasks(config: &Config, tasks: Vec<ExtractionTask>) -> anyhow::Result<BatchOutcome> {
    let launcher = Arc::new(WebDriverLauncher::new(&config.webdriver));
    let orchestrator = Orchestrator::from_config(launcher, config);
    let outcome = orchestrator
        .run_batch(tasks, |progress| {
            eprintln!("Completed {}/{} tasks...", progress.completed, progress.total);
        })
        .await?;
    Ok(outcome)
}

fn print_outcome(outcome: &BatchOutcome, format: OutputFormat) {
    if format == OutputFormat::Json {
        match serde_json::to_string_pretty(outcome) {
            Ok(json) => println!("{}", json),
            Err(e) => warn!("Could not serialize batch outcome: {}", e),
        }
        return;
    }

    for result in &outcome.results {
        println!("\n{}", result.title());
        if !result.success {
            println!("Error: {}", result.error.as_deref().unwrap_or("unknown error"));
            continue;
        }
        match format {
            OutputFormat::Text => {
                for block in format_pricing_by_date(&result.rows, Some(result.task.show_title())) {
                    println!("\n{}", block.render());
                }
            }
            OutputFormat::Table => println!("{}", render_table(&build_rows(&result.rows))),
            OutputFormat::Json => {}
        }
    }
    println!(
        "\n📊 {} succeeded, {} failed",
        outcome.succeeded_count(),
        outcome.failed_count()
    );
}

async fn classify_outcome(config: &Config, outcome: &BatchOutcome) -> anyhow::Result<()> {
    let Some(completion) = OpenAiCompletion::from_config(&config.classifier) else {
        bail!("OPENAI_API_KEY is not set; cannot classify tiers");
    };
    let classifier = TierClassifier::new(Arc::new(completion), config.classifier.markup);
    for result in outcome.results.iter().filter(|r| r.success) {
        println!("\n🏷️  Tiers for {}", result.task.show_title());
        let report = classifier.classify_lines(&result.rows).await;
        match &report.error {
            Some(error) => println!("Error: {}", error),
            None => println!("{}", serde_json::to_string_pretty(&report.rows)?),
        }
    }
    Ok(())
}

/// Tab-separated rows; section columns are the union across rows.
fn render_table(rows: &[PricingRow]) -> String {
    let mut columns: Vec<&str> = Vec::new();
    for row in rows {
        for (name, _) in &row.sections {
            if !columns.contains(&name.as_str()) {
                columns.push(name);
            }
        }
    }

    let mut out = format!("Event Date\tEvent Time\tTime\t{}", columns.join("\t"));
    for row in rows {
        let cells: Vec<&str> = columns.iter().map(|c| row.get(c).unwrap_or("")).collect();
        out.push_str(&format!(
            "\n{}\t{}\t{}\t{}",
            row.event_date,
            row.event_time,
            row.time,
            cells.join("\t")
        ));
    }
    out
}

// "https://www.broadwayinbound.com/the-lion-king" -> "The Lion King"
fn show_title_from_url(url: &str) -> String {
    let slug = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(url);
    slug.split('-')
        .filter(|w| !w.is_empty())
        .map(show_pricing::normalize::showtime::capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}
