use anyhow::{bail, Context, Result};
use arxiv_fetch::config::{default_config_path, find_config_file, load_config, Config, LogFormat};
use arxiv_fetch::{
    Client, FeedQuery, FeedResult, FeedType, SearchQuery, SearchResult, SortCriterion, SortOrder,
};
use clap::{Parser, Subcommand, ValueEnum};
use futures_util::TryStreamExt;
use serde::Serialize;
use std::fmt::Display;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// arxiv-fetch - Search arXiv and read its daily announcement feeds
#[derive(Parser, Debug)]
#[command(name = "arxiv-fetch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "hongkongkiwi")]
#[command(about = "Search arXiv and read its daily announcement feeds", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seconds to wait between requests (overrides the configuration)
    #[arg(long, global = true)]
    delay: Option<f64>,

    /// Results per API page (overrides the configuration)
    #[arg(long, global = true)]
    page_size: Option<usize>,

    /// Retries for a failed page (overrides the configuration)
    #[arg(long, global = true)]
    retries: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Plain text on a terminal, JSON lines otherwise
    Auto,
    /// Human-readable text
    Plain,
    /// One JSON object per line
    Json,
}

/// Sort field for search results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SortField {
    Relevance,
    Updated,
    Submitted,
}

/// Sort order
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Order {
    Asc,
    Desc,
}

/// Feed format
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FeedFormat {
    Rss,
    Atom,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search arXiv
    #[command(alias = "s")]
    Search {
        /// Query in arXiv syntax, e.g. "ti:transformer AND cat:cs.LG"
        #[arg(default_value = "")]
        query: String,

        /// Restrict to these paper ids (repeatable or comma-separated)
        #[arg(long = "id", value_delimiter = ',')]
        ids: Vec<String>,

        /// Maximum number of results
        #[arg(long, short, default_value_t = 10)]
        max_results: usize,

        /// Fetch every available result
        #[arg(long, conflicts_with = "max_results")]
        all: bool,

        /// Skip this many results
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Sort by field
        #[arg(long, value_enum, default_value_t = SortField::Relevance)]
        sort_by: SortField,

        /// Sort order
        #[arg(long, value_enum, default_value_t = Order::Desc)]
        order: Order,
    },

    /// Read a daily announcement feed
    #[command(alias = "f")]
    Feed {
        /// Archive or category, e.g. "cs", "cs.LG", "cs+math.AG"
        name: String,

        /// Feed format
        #[arg(long, value_enum, default_value_t = FeedFormat::Rss)]
        format: FeedFormat,

        /// Keep only these paper ids (repeatable or comma-separated)
        #[arg(long = "id", value_delimiter = ',')]
        ids: Vec<String>,

        /// Maximum number of results (at most 2000)
        #[arg(long, short)]
        max_results: Option<usize>,

        /// Skip this many entries
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Write a configuration file with default values
    Init {
        /// Where to write (default: the per-user configuration file)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(find_config_file);
    let mut config = load_config(config_path.as_deref()).with_context(|| match &config_path {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Failed to load configuration".to_string(),
    })?;

    init_tracing(&cli, &config);
    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    if let Some(delay) = cli.delay {
        config.client = config.client.delay_seconds(delay);
    }
    if let Some(page_size) = cli.page_size {
        config.client = config.client.page_size(page_size);
    }
    if let Some(retries) = cli.retries {
        config.client = config.client.num_retries(retries);
    }

    let format = resolve_format(cli.output);

    match cli.command {
        Commands::Search {
            query,
            ids,
            max_results,
            all,
            offset,
            sort_by,
            order,
        } => {
            let limit = (!all).then_some(max_results);
            let search = build_search(query, ids, limit, offset, sort_by, order);
            if search.query.is_empty() && search.id_list.is_empty() {
                bail!("Provide a query or at least one --id");
            }

            let client = Client::with_config(config.client);
            let count = client
                .scoped(|client| async move {
                    let mut results = client.results(&search, offset);
                    let mut count = 0usize;
                    while let Some(result) = results.try_next().await? {
                        emit(&result, format, print_search_result);
                        count += 1;
                    }
                    Ok(count)
                })
                .await?;

            if !cli.quiet {
                eprintln!("{} result(s)", count);
            }
        }

        Commands::Feed {
            name,
            format: feed_format,
            ids,
            max_results,
            offset,
        } => {
            let mut query = FeedQuery::new(name)
                .feed_type(match feed_format {
                    FeedFormat::Rss => FeedType::Rss,
                    FeedFormat::Atom => FeedType::Atom,
                })
                .id_list(ids);
            if let Some(max) = max_results {
                query = query.max_results(max.saturating_add(offset));
            }

            let client = Client::with_config(config.client);
            let count = client
                .scoped(|client| async move {
                    let mut results = client.feed_results(&query, offset);
                    let mut count = 0usize;
                    while let Some(result) = results.try_next().await? {
                        emit(&result, format, print_feed_result);
                        count += 1;
                    }
                    Ok(count)
                })
                .await?;

            if !cli.quiet {
                eprintln!("{} entr{}", count, if count == 1 { "y" } else { "ies" });
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Init { path, force } => {
                let path = match path.or_else(default_config_path) {
                    Some(path) => path,
                    None => bail!("Could not determine a configuration directory; pass a path"),
                };
                if path.exists() && !force {
                    bail!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    );
                }
                Config::default()
                    .save(&path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("Wrote default configuration to {}", path.display());
            }
            ConfigAction::Show => {
                print!("{}", toml::to_string_pretty(&config)?);
            }
        },
    }

    Ok(())
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("arxiv_fetch={}", level)));
    let registry = tracing_subscriber::registry().with(filter);

    match config.logging.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn resolve_format(format: OutputFormat) -> OutputFormat {
    if format == OutputFormat::Auto {
        if std::io::stdout().is_terminal() {
            OutputFormat::Plain
        } else {
            OutputFormat::Json
        }
    } else {
        format
    }
}

fn emit<T: Serialize>(item: &T, format: OutputFormat, plain: fn(&T)) {
    match format {
        OutputFormat::Json => match serde_json::to_string(item) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::error!("Failed to serialize result: {}", e),
        },
        _ => plain(item),
    }
}

fn print_search_result(result: &SearchResult) {
    println!("{}", result);
    print_authors(&result.authors);
    if let Some(published) = result.published {
        println!("  Published: {}", published.format("%Y-%m-%d"));
    }
    if let Some(category) = &result.primary_category {
        println!("  Category: {}", category);
    }
    println!("  URL: {}", result.entry_id);
    if let Some(pdf_url) = result.pdf_url() {
        println!("  PDF: {}", pdf_url);
    }
    if let Some(doi) = &result.doi {
        println!("  DOI: {}", doi);
    }
    println!();
}

fn print_feed_result(result: &FeedResult) {
    println!("{}", result);
    print_authors(&result.authors);
    if !result.categories.is_empty() {
        println!("  Categories: {}", result.categories.join(", "));
    }
    println!("  URL: {}", result.entry_id);
    println!();
}

fn print_authors<A: Display>(authors: &[A]) {
    if !authors.is_empty() {
        let names: Vec<String> = authors.iter().map(ToString::to_string).collect();
        println!("  Authors: {}", names.join(", "));
    }
}

/// Search covering `offset` skipped results plus up to `max_results` printed ones.
fn build_search(
    query: String,
    ids: Vec<String>,
    max_results: Option<usize>,
    offset: usize,
    sort_by: SortField,
    order: Order,
) -> SearchQuery {
    let search = SearchQuery::new(query)
        .id_list(ids)
        .sort_by(match sort_by {
            SortField::Relevance => SortCriterion::Relevance,
            SortField::Updated => SortCriterion::LastUpdatedDate,
            SortField::Submitted => SortCriterion::SubmittedDate,
        })
        .sort_order(match order {
            Order::Asc => SortOrder::Ascending,
            Order::Desc => SortOrder::Descending,
        });
    match max_results {
        Some(max) => search.max_results(max.saturating_add(offset)),
        None => search,
    }
}
