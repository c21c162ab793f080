//! Iris - Website Accessibility Scanner CLI

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use iris::audit::checks::RULES;
use iris::browser::chromium::ChromiumLauncher;
use iris::config::{self, AppConfig};
use iris::models::{PageResult, ScanJob, ScanStatus, Website};
use iris::orchestrator::CrawlOrchestrator;
use iris::store::memory::MemoryStore;
use iris::store::postgres::PgStore;
use iris::store::ScanStore;

/// Iris - Website Accessibility Scanner
#[derive(Parser)]
#[command(name = "iris", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a website and audit every discovered page
    Scan {
        /// Base URL to start crawling from
        #[arg(short, long)]
        target: String,

        /// Maximum link-follow depth from the base URL
        #[arg(long, default_value_t = 2)]
        max_depth: u32,

        /// Maximum number of pages to discover and audit
        #[arg(long, default_value_t = 50)]
        max_pages: u32,

        /// Delay between page visits in milliseconds
        #[arg(long, default_value_t = 0)]
        delay: u64,

        /// Postgres URL; omit to keep results in memory for this run
        #[arg(long)]
        database_url: Option<String>,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Execute a pre-created pending scan job
    Run {
        /// Website configuration id
        #[arg(long)]
        website_id: Uuid,

        /// Scan job id (must exist in pending state)
        #[arg(long)]
        job_id: Uuid,

        /// Postgres URL (defaults to the DATABASE_URL environment variable)
        #[arg(long)]
        database_url: Option<String>,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// List the accessibility rules in the check battery
    Rules,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "iris=debug" } else { "iris=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

fn print_banner() {
    let banner = r#"
    ╔═══════════════════════════════════════╗
    ║  👁  IRIS v0.1.0                      ║
    ║  Website Accessibility Scanner       ║
    ╚═══════════════════════════════════════╝
    "#;
    println!("{}", banner.cyan());
}

fn load_app_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(config::load_config(path)?);
    }
    let default_path = Path::new("config/default.toml");
    if default_path.exists() {
        Ok(config::load_config(default_path)?)
    } else {
        Ok(AppConfig::default())
    }
}

async fn connect_store(database_url: &str) -> Result<Arc<dyn ScanStore>, Box<dyn std::error::Error>> {
    let store = PgStore::connect(database_url).await?;
    store.migrate().await?;
    Ok(Arc::new(store))
}

/// Polls the persisted job row until it reaches a terminal state,
/// rendering live progress the same way any external observer would.
async fn watch_job(
    store: &Arc<dyn ScanStore>,
    job_id: Uuid,
) -> Result<ScanJob, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );

    loop {
        let job = store.job(job_id).await?;
        pb.set_length(u64::from(job.total_pages));
        pb.set_position(u64::from(job.scanned_pages));
        pb.set_message(format!("{} issues", job.total_issues));
        if job.status.is_terminal() {
            pb.finish_with_message(format!("scan {}", job.status));
            return Ok(job);
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
}

fn print_summary(job: &ScanJob, pages: &[PageResult]) {
    println!("\n{}", "  Scan Summary".bold());
    println!("  {}", "─".repeat(35));

    let mut critical = 0u32;
    let mut serious = 0u32;
    let mut moderate = 0u32;
    let mut minor = 0u32;
    for page in pages {
        critical += page.counts.critical;
        serious += page.counts.serious;
        moderate += page.counts.moderate;
        minor += page.counts.minor;
    }

    let mut builder = Builder::default();
    builder.push_record(["Severity", "Count"]);
    builder.push_record(["Critical".to_string(), critical.to_string()]);
    builder.push_record(["Serious".to_string(), serious.to_string()]);
    builder.push_record(["Moderate".to_string(), moderate.to_string()]);
    builder.push_record(["Minor".to_string(), minor.to_string()]);
    builder.push_record(["Total".to_string(), job.total_issues.to_string()]);

    let mut table = builder.build();
    table.with(Style::rounded());
    println!("{table}");

    println!(
        "\n  {} {} {} {}",
        format!("{critical} Critical").red().bold(),
        format!("{serious} Serious").bright_red(),
        format!("{moderate} Moderate").yellow(),
        format!("{minor} Minor").blue(),
    );

    let failed_pages = pages.iter().filter(|p| p.status_code == 0).count();
    println!(
        "\n  {} {} pages audited ({} unreachable)",
        "Pages:".bold(),
        pages.len(),
        failed_pages
    );
}

/// Finishes a watched job: prints the summary and returns the exit code
async fn report_outcome(
    store: &Arc<dyn ScanStore>,
    job_id: Uuid,
) -> Result<i32, Box<dyn std::error::Error>> {
    let job = watch_job(store, job_id).await?;
    let pages = store.page_results(job_id).await?;
    print_summary(&job, &pages);

    if job.status == ScanStatus::Failed {
        let message = job.error_message.as_deref().unwrap_or("unknown error");
        println!("\n  {} {}", "FAILED:".red().bold(), message.red());
        return Ok(1);
    }
    Ok(0)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            target,
            max_depth,
            max_pages,
            delay,
            database_url,
            config: config_path,
            verbose,
        } => {
            init_tracing(verbose);
            print_banner();

            let app_config = load_app_config(config_path.as_deref())?;
            let store: Arc<dyn ScanStore> =
                match database_url.or_else(|| app_config.database_url.clone()) {
                    Some(url) => connect_store(&url).await?,
                    None => Arc::new(MemoryStore::new()),
                };

            let website = Website::new(target, max_depth, max_pages, delay);
            store.register_website(&website).await?;
            let job = store.create_job(website.id).await?;

            println!("  {} {}", "Target:".bold(), website.base_url.green());
            println!(
                "  {} depth {}, {} pages max\n",
                "Limits:".bold(),
                website.max_depth,
                website.max_pages
            );

            let launcher = Arc::new(ChromiumLauncher::new(app_config.browser.clone()));
            let orchestrator = Arc::new(CrawlOrchestrator::new(
                Arc::clone(&store),
                launcher,
                app_config.scan.clone(),
            ));

            // The scan runs detached; this process just observes the job row
            let handle = orchestrator.spawn(website.id, job.id);
            let exit_code = report_outcome(&store, job.id).await?;
            let _ = handle.await;

            if exit_code != 0 {
                std::process::exit(exit_code);
            }
        }

        Commands::Run {
            website_id,
            job_id,
            database_url,
            config: config_path,
            verbose,
        } => {
            init_tracing(verbose);
            print_banner();

            let app_config = load_app_config(config_path.as_deref())?;
            let url = database_url
                .or_else(|| app_config.database_url.clone())
                .or_else(|| std::env::var("DATABASE_URL").ok())
                .ok_or("run requires --database-url or DATABASE_URL")?;
            let store = connect_store(&url).await?;

            let launcher = Arc::new(ChromiumLauncher::new(app_config.browser.clone()));
            let orchestrator = Arc::new(CrawlOrchestrator::new(
                Arc::clone(&store),
                launcher,
                app_config.scan.clone(),
            ));

            let handle = orchestrator.spawn(website_id, job_id);
            let exit_code = report_outcome(&store, job_id).await?;
            let _ = handle.await;

            if exit_code != 0 {
                std::process::exit(exit_code);
            }
        }

        Commands::Rules => {
            print_banner();
            println!("  {}\n", "Accessibility Check Battery:".bold());

            let mut builder = Builder::default();
            builder.push_record(["Rule", "Severity", "Description"]);
            for rule in RULES {
                builder.push_record([rule.id, rule.severity.as_str(), rule.description]);
            }
            let mut table = builder.build();
            table.with(Style::rounded());
            println!("{table}");
        }
    }

    Ok(())
}
