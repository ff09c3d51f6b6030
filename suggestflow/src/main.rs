//! suggestflow CLI - expand a keyword through autocomplete suggestions.

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use suggestflow::cancellation::CancellationToken;
use suggestflow::config::{CrawlConfig, ProviderConfig};
use suggestflow::crawler::Crawler;
use suggestflow::errors::CrawlError;
use suggestflow::frontier::Task;
use suggestflow::observability::{CrawlObserver, CrawlSummary, LoggingCrawlObserver};
use suggestflow::provider::HttpSuggestionProvider;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Breadth-first expansion of a keyword through autocomplete suggestions.
///
/// Every suggestion that still contains the keyword is saved once and fed
/// back as a new query, until the depth limit is reached. Ctrl+C stops the
/// run early and keeps everything saved so far.
#[derive(Parser, Debug)]
#[command(name = "suggestflow")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Seed keyword. Prompted for on stdin when omitted.
    #[arg(value_name = "KEYWORD")]
    keyword: Option<String>,

    /// Number of concurrent workers.
    #[arg(short, long, default_value = "2")]
    workers: usize,

    /// Expansion hops from the seed; queries at this depth are not fetched.
    #[arg(short = 'd', long, default_value = "5")]
    max_depth: usize,

    /// Directory for result files.
    #[arg(short, long, default_value = "results")]
    output_dir: PathBuf,

    /// Interface language sent to the suggestion service.
    #[arg(long, default_value = "en")]
    language: String,

    /// Seconds each worker pauses after a fetch.
    #[arg(long, default_value = "1.0")]
    delay: f64,

    /// Seconds a worker waits on an empty queue before re-checking.
    #[arg(long, default_value = "60.0")]
    queue_timeout: f64,

    /// Per-request timeout in seconds.
    #[arg(long, default_value = "5.0")]
    request_timeout: f64,

    /// Hide the progress bar and per-query lines.
    #[arg(long)]
    no_progress: bool,

    /// Print the final summary as JSON.
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Prints one line per fetched query and counts results on a spinner.
struct ConsoleObserver {
    bar: Option<ProgressBar>,
}

impl ConsoleObserver {
    fn new(show_bar: bool) -> Self {
        let bar = show_bar.then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {pos} suggestions {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });
        Self { bar }
    }

    fn println(&self, line: &str) {
        match &self.bar {
            Some(pb) => pb.println(line),
            None => println!("{line}"),
        }
    }
}

impl CrawlObserver for ConsoleObserver {
    fn on_task_start(&self, task: &Task) {
        self.println(&format!("processing (depth={}): {}", task.depth(), task.query()));
    }

    fn on_result(&self, _result: &str, _depth: usize) {
        if let Some(pb) = &self.bar {
            pb.inc(1);
        }
    }

    fn on_lookup_error(&self, task: &Task, error: &CrawlError) {
        self.println(&format!("lookup failed for '{}': {error}", task.query()));
    }

    fn on_finish(&self, _summary: &CrawlSummary) {
        if let Some(pb) = &self.bar {
            pb.finish_and_clear();
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn prompt_keyword() -> Result<String> {
    print!("Enter main keyword: ");
    io::stdout().flush().context("failed to flush stdout")?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read keyword from stdin")?;
    Ok(line.trim().to_string())
}

/// Cancels `token` on the first Ctrl+C.
///
/// The listener gets its own thread and runtime so the blocking HTTP client
/// never runs inside an async context.
fn spawn_interrupt_listener(token: Arc<CancellationToken>) -> Result<()> {
    std::thread::Builder::new()
        .name("suggestflow-signal".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!("Interrupt handling unavailable: {e}");
                    return;
                }
            };
            match runtime.block_on(tokio::signal::ctrl_c()) {
                Ok(()) => {
                    eprintln!("\nStopping crawler...");
                    token.cancel("interrupted by user");
                }
                Err(e) => warn!("Failed to listen for Ctrl+C: {e}"),
            }
        })
        .context("failed to spawn interrupt listener")?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let keyword = match cli.keyword {
        Some(keyword) => keyword,
        None => prompt_keyword()?,
    };
    if keyword.trim().is_empty() {
        bail!("a keyword is required");
    }

    let config = CrawlConfig::new(keyword)
        .with_num_workers(cli.workers)
        .with_max_depth(cli.max_depth)
        .with_output_dir(cli.output_dir)
        .with_worker_delay(cli.delay)
        .with_queue_timeout(cli.queue_timeout);
    let provider_config = ProviderConfig::new()
        .with_language(cli.language)
        .with_timeout(cli.request_timeout);
    debug!(?config, ?provider_config, "Resolved configuration");

    let provider =
        HttpSuggestionProvider::new(provider_config).context("invalid provider configuration")?;
    let observer: Arc<dyn CrawlObserver> = if cli.json {
        Arc::new(LoggingCrawlObserver)
    } else {
        Arc::new(ConsoleObserver::new(!cli.no_progress))
    };

    let token = Arc::new(CancellationToken::new());
    let crawler = Crawler::builder(config)
        .provider(Arc::new(provider))
        .observer(observer)
        .cancellation_token(Arc::clone(&token))
        .build()
        .context("failed to start crawl")?;

    if !cli.json {
        println!(
            "Starting crawl for '{}' (max depth {}, {} workers)",
            crawler.config().main_keyword,
            crawler.config().max_depth,
            crawler.config().num_workers
        );
        if let Some(path) = crawler.output_path() {
            println!("Saving results to: {}", path.display());
        }
        println!("Press Ctrl+C to stop");
    }

    spawn_interrupt_listener(token)?;
    let summary = crawler.run().context("crawl failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&summary).context("failed to encode summary")?;
        println!("{json}");
    } else {
        println!("\n{summary}");
        if summary.leaked_workers > 0 {
            eprintln!(
                "warning: {} worker(s) did not stop in time",
                summary.leaked_workers
            );
        }
    }

    Ok(())
}
