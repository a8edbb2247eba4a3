//! Veritrace CLI
//!
//! Bounded OSINT evidence aggregation and scam-risk profiling for one target.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use veritrace_core::{
    derive, extract, AggregatedProfile, CrawlOverrides, InvestigationConfig,
};
use veritrace_net::TransportConfig;
use veritrace_runtime::{InvestigationRequest, Investigator};
use veritrace_sources::SourcesConfig;

#[derive(Parser)]
#[command(name = "veritrace")]
#[command(author, version, about = "Veritrace: bounded OSINT evidence aggregation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Investigate a handle, email or alias
    Investigate {
        /// Target identifier
        #[arg(short, long)]
        target: String,

        /// Emails already known to belong to the target
        #[arg(short, long = "email")]
        emails: Vec<String>,

        /// TOML config file with [crawl], [scoring] and [investigation] tables
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file for the profile (default: profile_<target>_<timestamp>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        budgets: BudgetArgs,

        /// Proxy URL for all requests (socks5h://, http://)
        #[arg(long, env = "VERITRACE_PROXY")]
        proxy: Option<String>,

        /// GitHub token (raises the API rate limit)
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        github_token: Option<String>,

        /// Skip the source adapters (GitHub, Reddit, pastes)
        #[arg(long)]
        no_sources: bool,

        /// Skip the search frontier crawl
        #[arg(long)]
        no_crawl: bool,
    },

    /// Extract leads from a file (or stdin) and print them as JSON
    Extract {
        /// Input file; reads stdin when absent
        file: Option<PathBuf>,
    },

    /// Print the search queries derived for a target
    Queries {
        #[arg(short, long)]
        target: String,

        #[arg(short, long = "email")]
        emails: Vec<String>,
    },
}

/// Crawl budget overrides
#[derive(Args, Debug, Default)]
struct BudgetArgs {
    /// Page budget for the crawl
    #[arg(long)]
    max_pages: Option<usize>,

    /// URLs taken from each search query
    #[arg(long)]
    max_results: Option<usize>,

    /// Wall-clock budget for the crawl in milliseconds
    #[arg(long)]
    time_budget_ms: Option<u64>,

    /// Timeout for each search or page fetch in milliseconds
    #[arg(long)]
    page_timeout_ms: Option<u64>,

    /// Pastes analyzed in depth
    #[arg(long)]
    max_pastes: Option<usize>,

    /// Follow links found on pages below this depth
    #[arg(long)]
    max_depth: Option<u32>,

    /// Concurrent page fetches (1-4)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Do not search for newly discovered emails
    #[arg(long)]
    no_follow_emails: bool,
}

impl BudgetArgs {
    fn overrides(&self) -> CrawlOverrides {
        CrawlOverrides {
            max_results_per_query: self.max_results,
            max_total_pages: self.max_pages,
            max_execution_time_ms: self.time_budget_ms,
            per_page_timeout_ms: self.page_timeout_ms,
            max_pastes_or_pages_to_deep_analyze: self.max_pastes,
            max_depth: self.max_depth,
            fetch_concurrency: self.concurrency,
            follow_discovered_emails: self.no_follow_emails.then_some(false),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let builder = FmtSubscriber::builder()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .compact();

    if std::env::var_os("RUST_LOG").is_some() {
        builder.with_env_filter(EnvFilter::from_default_env()).init();
    } else {
        builder.with_max_level(log_level).init();
    }

    match cli.command {
        Commands::Investigate {
            target,
            emails,
            config,
            output,
            budgets,
            proxy,
            github_token,
            no_sources,
            no_crawl,
        } => {
            let settings = InvestigateSettings {
                config,
                output,
                overrides: budgets.overrides(),
                proxy,
                github_token,
                no_sources,
                no_crawl,
            };
            run_investigation(&target, emails, settings).await?;
        }
        Commands::Extract { file } => {
            run_extract(file.as_deref())?;
        }
        Commands::Queries { target, emails } => {
            for query in derive(&target, &emails) {
                println!("{}", query);
            }
        }
    }

    Ok(())
}

struct InvestigateSettings {
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    overrides: CrawlOverrides,
    proxy: Option<String>,
    github_token: Option<String>,
    no_sources: bool,
    no_crawl: bool,
}

async fn run_investigation(target: &str, emails: Vec<String>, settings: InvestigateSettings) -> Result<()> {
    println!("🕵️ Veritrace - bounded evidence aggregation\n");

    let mut config = match &settings.config {
        Some(path) => InvestigationConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => InvestigationConfig::default(),
    };
    // Budget flags override the file for this run and for adapter tuning
    config.crawl = settings.overrides.apply(&config.crawl);
    config.crawl.validate().context("Invalid crawl budgets")?;

    let transport = TransportConfig {
        proxy: settings.proxy.filter(|p| !p.trim().is_empty()),
        ..TransportConfig::default()
    };

    let sources = if settings.no_sources {
        SourcesConfig {
            enable_github: false,
            enable_reddit: false,
            enable_paste: false,
            ..SourcesConfig::default()
        }
    } else {
        SourcesConfig {
            github_token: settings.github_token,
            ..SourcesConfig::default()
        }
    };

    let crawl = &config.crawl;
    println!("🎯 Target: {}", target);
    println!(
        "⏱️  Budgets: {} pages | {} results/query | {}ms total | {}ms per call",
        crawl.max_total_pages,
        crawl.max_results_per_query,
        crawl.max_execution_time_ms,
        crawl.per_page_timeout_ms
    );
    if let Some(proxy) = &transport.proxy {
        println!("🔌 Proxy: {}", proxy);
    }

    let mut investigator = Investigator::build(config, &transport, &sources)?;
    if settings.no_crawl {
        investigator = investigator.without_crawl();
    }

    let adapters = investigator.adapter_names();
    println!(
        "🤖 Producers: {}{}\n",
        if settings.no_crawl { "" } else { "frontier crawler, " },
        if adapters.is_empty() { "no adapters".to_string() } else { adapters.join(", ") }
    );

    println!("🚀 Investigating...");
    let request = InvestigationRequest::new(target)
        .with_emails(emails)
        .skip_cache();
    let profile = investigator.investigate(request).await;

    let output_path = settings
        .output
        .unwrap_or_else(|| default_output_path(&profile.target));
    let json = serde_json::to_string_pretty(&profile).context("Failed to serialize profile")?;
    fs::write(&output_path, json)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    info!("Profile written to {}", output_path.display());

    print_summary(&profile);
    println!("📄 Profile saved to: {}", output_path.display());

    Ok(())
}

fn run_extract(file: Option<&Path>) -> Result<()> {
    let text = match file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    let extraction = extract(&text);
    println!("{}", serde_json::to_string_pretty(&extraction)?);
    Ok(())
}

fn default_output_path(target: &str) -> PathBuf {
    let timestamp = chrono::Utc::now().format("%Y-%m-%d_%H-%M-%S");
    PathBuf::from(format!("profile_{}_{}.json", sanitize(target), timestamp))
}

/// File-name-safe form of a target
fn sanitize(target: &str) -> String {
    let cleaned: String = target
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_matches('_');
    if cleaned.is_empty() {
        "target".to_string()
    } else {
        cleaned.to_string()
    }
}

fn print_summary(profile: &AggregatedProfile) {
    println!("\n{}", "=".repeat(60));
    println!(
        "📊 {} | score {}/100 ({:?}) | {} ms",
        profile.target, profile.scam_score, profile.risk_level, profile.execution_time_ms
    );
    println!("{}", "=".repeat(60));

    println!(
        "Leads: {} emails, {} handles, {} urls, {} wallets",
        profile.all_emails.len(),
        profile.handles.len(),
        profile.all_urls.len(),
        profile.all_wallets.len()
    );
    for email in profile.all_emails.iter().take(5) {
        println!("   📧 {}", email);
    }
    for handle in profile.handles.iter().take(10) {
        println!("   👤 {}", handle);
    }

    println!(
        "Pages analyzed: {} | scam mentions: {}",
        profile.pages_analyzed,
        profile.scam_mentions.len()
    );
    for mention in profile.scam_mentions.iter().take(5) {
        println!(
            "   ⚠️  \"{}\" at {}: {}",
            mention.keyword,
            mention.source_url.as_deref().unwrap_or("-"),
            mention.context
        );
    }

    if !profile.red_flags.is_empty() {
        println!("Red flags:");
        for flag in &profile.red_flags {
            println!("   🚩 {}", flag);
        }
    }
    if !profile.trust_indicators.is_empty() {
        println!("Trust indicators:");
        for indicator in &profile.trust_indicators {
            println!("   ✅ {}", indicator);
        }
    }
    if let Some(crawl) = &profile.crawl {
        println!(
            "Crawl: {} | {} queries run, {} skipped | {} urls unvisited",
            crawl.termination, crawl.queries_processed, crawl.queries_skipped, crawl.urls_unvisited
        );
    }
    if !profile.errors.is_empty() {
        println!("Errors ({}):", profile.errors.len());
        for error in &profile.errors {
            println!("   ❌ {}", error);
        }
    }

    println!(
        "\nNote: the score is a transparent keyword heuristic, not a verdict. \
         Review the cited evidence before acting on it.\n"
    );
}
