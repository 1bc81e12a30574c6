//! jpage CLI - Stream the elements of paged JSON documents
//!
//! This binary provides command-line interfaces for:
//! - files: every regular file of a folder is one page
//! - http: numbered pages fetched from a URL template
//!
//! Elements are written to stdout as NDJSON; logs go to stderr.

mod config;

use clap::{Args, Parser, Subcommand};
use config::{FileConfig, FlagValues, Settings};
use indicatif::{ProgressBar, ProgressStyle};
use jpage_io::{
    file_provider, http_provider, scan_folder, Context, LimitPaginator, Rows, RowsBuilder,
};
use serde_json::Value;
use std::error::Error;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jpage")]
#[command(about = "Stream the elements of JSON arrays spread across pages")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read every regular file in a folder, in name order
    ///
    /// Examples:
    ///   jpage files ./pages
    ///   jpage files ./pages --key items --depth 1
    Files {
        /// Folder holding one JSON document per file
        folder: PathBuf,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Fetch numbered pages over HTTP until a page comes back short
    ///
    /// Examples:
    ///   jpage http 'https://api.example.com/items?page={page}&limit={limit}' --limit 100 --key items
    Http {
        /// URL with `{page}` and optional `{limit}` placeholders
        url_template: String,
        /// Elements per full page
        #[arg(long)]
        limit: usize,
        /// Number of the first page
        #[arg(long, default_value = "1")]
        first_page: usize,
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args, Debug, Clone)]
struct CommonArgs {
    /// Member name announcing the array (default: the document is the array)
    #[arg(long)]
    key: Option<String>,
    /// Nesting depth of the key; 1 means a top-level member (default: 1)
    #[arg(long)]
    depth: Option<usize>,
    /// Keep paginating past pages whose array is empty
    #[arg(long)]
    skip_empty_pages: bool,
    /// Give up after this many seconds
    #[arg(long)]
    timeout: Option<u64>,
    /// TOML file with key, depth, skip_empty_pages and limits
    #[arg(long)]
    config: Option<PathBuf>,
    /// Show progress spinner while streaming
    #[arg(long)]
    progress: bool,
    /// Debug logging on stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

impl CommonArgs {
    fn settings(&self) -> Result<Settings, Box<dyn Error>> {
        let file = match &self.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Settings::resolve(
            file,
            FlagValues {
                key: self.key.clone(),
                depth: self.depth,
                skip_empty_pages: self.skip_empty_pages,
            },
        )
    }

    fn context(&self) -> Context {
        match self.timeout {
            Some(secs) => Context::with_timeout(Duration::from_secs(secs)),
            None => Context::new(),
        }
    }

    fn builder(&self) -> Result<RowsBuilder, Box<dyn Error>> {
        let settings = self.settings()?;
        Ok(RowsBuilder::new(self.context())
            .target(settings.target)
            .limits(settings.limits)
            .skip_empty_pages(settings.skip_empty_pages))
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Files { folder, common } => {
            init_logging(common.verbose);
            handle_files(folder, &common)?;
        }
        Commands::Http {
            url_template,
            limit,
            first_page,
            common,
        } => {
            init_logging(common.verbose);
            handle_http(url_template, limit, first_page, &common)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn handle_files(folder: PathBuf, common: &CommonArgs) -> Result<(), Box<dyn Error>> {
    if !folder.is_dir() {
        return Err(format!("{} is not a folder", folder.display()).into());
    }

    let rows = common
        .builder()?
        .paginator(scan_folder(&folder))
        .provider(file_provider())
        .build()?;
    stream(rows, common.progress)
}

fn handle_http(
    url_template: String,
    limit: usize,
    first_page: usize,
    common: &CommonArgs,
) -> Result<(), Box<dyn Error>> {
    if !url_template.contains("{page}") {
        return Err("URL template must contain {page}".into());
    }
    if limit == 0 {
        return Err("--limit must be at least 1".into());
    }

    let paginator = LimitPaginator::new(limit, first_page, move |page, limit| {
        expand_template(&url_template, page, limit)
    });
    let rows = common
        .builder()?
        .paginator(paginator)
        .provider(http_provider()?)
        .build()?;
    stream(rows, common.progress)
}

fn expand_template(template: &str, page: usize, limit: usize) -> String {
    template
        .replace("{page}", &page.to_string())
        .replace("{limit}", &limit.to_string())
}

/// Copy every element to stdout, one compact JSON value per line
fn stream(mut rows: Rows, show_progress: bool) -> Result<(), Box<dyn Error>> {
    let start = Instant::now();
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let progress_bar = show_progress.then(|| create_spinner("Streaming elements"));

    let mut written = 0u64;
    while rows.advance() {
        let element: Value = rows.scan()?;
        serde_json::to_writer(&mut out, &element)?;
        out.write_all(b"\n")?;
        written += 1;
        if let Some(pb) = &progress_bar {
            pb.inc(1);
        }
    }
    out.flush()?;

    if let Some(err) = rows.take_err() {
        if let Some(pb) = &progress_bar {
            pb.abandon_with_message(format!("Stopped after {} elements", written));
        }
        return Err(err.into());
    }
    rows.close()?;

    let elapsed = start.elapsed();
    let pages = rows.metrics().pages_opened;
    if let Some(pb) = &progress_bar {
        pb.finish_with_message(format!(
            "Streamed {} elements from {} pages in {:.2?}",
            written, pages, elapsed
        ));
    }
    info!(
        target: "jpage::cli",
        pages,
        elements = written,
        empty_pages = rows.metrics().empty_pages,
        elapsed_ms = elapsed.as_millis() as u64,
        "stream finished"
    );
    Ok(())
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {pos} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
