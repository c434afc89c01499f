mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{fmt, EnvFilter};

use darshan_core::{
    RawCandidate, Resolver, ResolverConfig, SearchProvider, Snapshot, SnapshotWriter,
    YouTubeSearch,
};

const API_KEY_ENV: &str = "YOUTUBE_API_KEY";

fn version_string() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");

    if GIT_HASH.is_empty() {
        VERSION
    } else {
        // Leak is fine — called once, lives for the program's lifetime.
        Box::leak(format!("{VERSION} ({GIT_HASH})").into_boxed_str())
    }
}

/// Find live darshan streams and publish a JSON snapshot.
#[derive(Parser)]
#[command(name = "darshan-finder", version = version_string(), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve all configured sources and write the snapshot file.
    Run {
        /// Path to TOML config file.
        #[arg(short, long)]
        config: PathBuf,

        /// Snapshot destination. Overrides the config file.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// YouTube Data API key. Overrides the YOUTUBE_API_KEY env var.
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Probe a single search query and show what would be selected.
    Check {
        /// Search query, e.g. "Tirumala live darshan".
        query: String,

        /// Candidates to request.
        #[arg(long, default_value_t = 5)]
        max_results: u32,

        /// YouTube Data API key. Overrides the YOUTUBE_API_KEY env var.
        #[arg(long)]
        api_key: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            output,
            api_key,
        } => run(config, output, api_key).await,
        Commands::Check {
            query,
            max_results,
            api_key,
        } => {
            init_tracing("pretty");
            check(query, max_results, api_key).await;
        }
    }
}

fn resolve_api_key(flag: Option<String>) -> Option<String> {
    flag.or_else(|| std::env::var(API_KEY_ENV).ok())
        .filter(|k| !k.is_empty())
}

async fn run(config_path: PathBuf, output_override: Option<PathBuf>, api_key: Option<String>) {
    let app_config = match config::AppConfig::load(&config_path) {
        Ok(c) => {
            init_tracing(&c.output.log_format);
            tracing::info!(path = %config_path.display(), sources = c.source.len(), "Loaded config file");
            c
        }
        Err(e) => {
            init_tracing("pretty");
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let Some(api_key) = resolve_api_key(api_key) else {
        tracing::error!("No API key: pass --api-key or set {API_KEY_ENV}");
        std::process::exit(1);
    };

    let resolver_config = app_config.resolver.to_resolver_config();
    let provider = Arc::new(YouTubeSearch::from_config(&resolver_config, api_key));
    let resolver = Resolver::new(resolver_config, provider);

    let source_count = app_config.source.len();
    let spinner = ProgressBar::new_spinner()
        .with_style(ProgressStyle::with_template("{spinner} {wide_msg}").expect("valid template"));
    spinner.set_message(format!("Resolving {source_count} sources..."));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let records = resolver.resolve_all(&app_config.source).await;
    spinner.finish_and_clear();

    let snapshot = Snapshot::new(records);
    let output_path = output_override.unwrap_or(app_config.output.path);
    let writer = SnapshotWriter::new(&output_path);

    if let Err(e) = writer.write(&snapshot).await {
        tracing::error!(error = %e, "Snapshot write failed");
        std::process::exit(1);
    }

    println!(
        "{} {}/{} sources live",
        style("✓").green().bold(),
        snapshot.stream_count,
        source_count
    );
    for record in &snapshot.streams {
        let viewers = record
            .viewer_count
            .map(|v| format!("{v} viewers"))
            .unwrap_or_else(|| "viewers n/a".to_string());
        println!(
            "  {:<16} {} {}",
            record.temple_id,
            style(&record.channel).bold(),
            style(viewers).dim()
        );
    }
    println!(
        "{} Snapshot written to {}",
        style("✓").green().bold(),
        style(output_path.display()).bold()
    );
}

async fn check(query: String, max_results: u32, api_key: Option<String>) {
    let Some(api_key) = resolve_api_key(api_key) else {
        tracing::error!("No API key: pass --api-key or set {API_KEY_ENV}");
        std::process::exit(1);
    };

    let config = ResolverConfig::default().with_max_results(max_results);
    let provider = YouTubeSearch::from_config(&config, api_key);

    let candidates = match provider.search_live(&query, max_results).await {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Search failed");
            std::process::exit(1);
        }
    };

    if candidates.is_empty() {
        println!("{}", style("No live candidates found.").dim());
        return;
    }

    println!(
        "{} {}",
        style("query:").dim(),
        style(&query).bold()
    );
    let selected = candidates
        .iter()
        .position(|c| c.is_live && c.is_embeddable);
    for (i, c) in candidates.iter().enumerate() {
        println!("  {}", format_candidate(c, selected == Some(i)));
    }
}

fn format_candidate(c: &RawCandidate, selected: bool) -> String {
    let live_badge = if c.is_live {
        style("LIVE ").green().to_string()
    } else {
        style("ENDED").red().to_string()
    };
    let embed_badge = if c.is_embeddable {
        style("EMBED").green().to_string()
    } else {
        style("NO-EMBED").red().to_string()
    };
    let viewers = c
        .viewer_count
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string());
    let marker = if selected {
        style("→").bold().to_string()
    } else {
        " ".to_string()
    };
    format!(
        "{} {} {} {:>8}  {}  {} {}",
        marker,
        live_badge,
        embed_badge,
        viewers,
        c.video_id,
        style(&c.channel_name).bold(),
        style(&c.title).dim()
    )
}

fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_format {
        "json" => {
            fmt().with_env_filter(filter).json().init();
        }
        _ => {
            fmt().with_env_filter(filter).init();
        }
    }
}
