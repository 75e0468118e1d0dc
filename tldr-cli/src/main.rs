//! tldr - simplified, community-driven man pages
//!
//! Command line entry point over `tldr_core`

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use tldr_core::{Client, LookupOptions, Platform, RenderMode, TldrConfig, TldrError};

/// Log levels
#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "tldr",
    about = "Simplified and community-driven man pages",
    version
)]
struct Cli {
    /// Command to show the page for (e.g. `tar`, `git checkout`)
    commands: Vec<String>,

    /// List all pages for the current platform
    #[clap(short = 'l', long, conflicts_with_all = ["list_all", "random", "random_example", "render", "update", "clear_cache"])]
    list: bool,

    /// List all pages
    #[clap(short = 'a', long)]
    list_all: bool,

    /// List pages in a single column
    #[clap(short = '1', long)]
    single_column: bool,

    /// Show a random page
    #[clap(short = 'r', long)]
    random: bool,

    /// Show a random example from a random page
    #[clap(short = 'e', long)]
    random_example: bool,

    /// Render a local page file
    #[clap(short = 'f', long, value_name = "FILE")]
    render: Option<PathBuf>,

    /// Print the raw markdown page
    #[clap(short = 'm', long)]
    markdown: bool,

    /// Override the platform (linux, osx, windows, sunos, android, ...)
    #[clap(short = 'o', long = "os", value_name = "PLATFORM")]
    platform: Option<Platform>,

    /// Override the page language (e.g. `de`, `pt_BR`)
    #[clap(short = 'L', long, value_name = "LANG")]
    language: Option<String>,

    /// Update the local cache
    #[clap(short = 'u', long)]
    update: bool,

    /// Clear the local cache
    #[clap(short = 'c', long)]
    clear_cache: bool,

    /// Configuration file (defaults to the platform config directory)
    #[clap(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Set log level
    #[clap(long, default_value = "warn", global = true)]
    log_level: LogLevel,
}

impl Cli {
    /// Whether anything besides maintenance flags was requested
    fn has_page_action(&self) -> bool {
        !self.commands.is_empty()
            || self.render.is_some()
            || self.list
            || self.list_all
            || self.random
            || self.random_example
    }
}

/// Initialize tracing with the CLI log level; `RUST_LOG` directives are added on top
fn initialize_tracing(log_level: LogLevel) {
    let mut filter = EnvFilter::new(log_level.to_filter_directive());
    if let Ok(directives) = std::env::var("RUST_LOG") {
        for directive in directives.split(',').filter(|d| !d.is_empty()) {
            if let Ok(parsed) = directive.parse() {
                filter = filter.add_directive(parsed);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr) // stdout carries the page
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    initialize_tracing(cli.log_level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err
                .downcast_ref::<TldrError>()
                .map(TldrError::exit_code)
                .unwrap_or(1);
            eprintln!("{err:#}");
            ExitCode::from(code as u8)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => TldrConfig::load_from_path(path)?,
        None => TldrConfig::load()?,
    };
    tracing::debug!("Using cache at {}", config.cache_dir.display());
    let client = Client::new(config)?;

    let mode = RenderMode::from_flags(cli.markdown, cli.random_example)?;
    let options = LookupOptions {
        platform: cli.platform,
        language: cli.language.clone(),
        mode,
    };

    if cli.clear_cache {
        client.clear_cache().await?;
        println!("Done");
        return Ok(());
    }

    if cli.update {
        client.update_cache().await?;
        println!("Local cache updated");
        if !cli.has_page_action() {
            return Ok(());
        }
    }

    if let Some(file) = &cli.render {
        print!("{}", client.render_file(file, mode).await?);
        return Ok(());
    }

    if cli.list {
        let pages = client.list_for_platform(cli.platform).await?;
        print_pages(&pages, cli.single_column);
        return Ok(());
    }

    if cli.list_all {
        let pages = client.list_all().await?;
        print_pages(&pages, cli.single_column);
        return Ok(());
    }

    if cli.random || (cli.random_example && cli.commands.is_empty()) {
        print!("{}", client.random_page(&options).await?);
        return Ok(());
    }

    if cli.commands.is_empty() {
        anyhow::bail!("No page given. Run `tldr --help` for usage.");
    }

    print!("{}", client.lookup(&cli.commands, &options).await?);
    Ok(())
}

fn print_pages(pages: &[String], single_column: bool) {
    if single_column {
        println!("{}", pages.join("\n"));
    } else {
        println!("{}", pages.join(", "));
    }
}
