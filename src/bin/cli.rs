//! poetry-search CLI
//!
//! Command-line interface for searching a poetry corpus.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use poetry_search::error::{PoetryError, Result};
use poetry_search::search::SearchConfig;
use poetry_search::storage::FileStore;
use poetry_search::{Corpus, PoetrySearchService, SearchOptions, SearchResult};

#[derive(Parser)]
#[command(name = "poetry-search")]
#[command(about = "Classical Chinese poetry search")]
#[command(version)]
struct Cli {
    /// Corpus JSON file ({"poetry": [...]})
    #[arg(long, env = "POETRY_SEARCH_CORPUS")]
    corpus: String,

    /// Directory holding the persisted history and result cache
    #[arg(
        long,
        env = "POETRY_SEARCH_STATE_DIR",
        default_value = "~/.local/share/poetry-search"
    )]
    state_dir: String,

    /// Search configuration JSON file; unset fields keep their defaults
    #[arg(long, env = "POETRY_SEARCH_CONFIG")]
    config: Option<String>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search poems
    Search {
        /// Search query
        query: String,
        /// Maximum results
        #[arg(short, long)]
        limit: Option<usize>,
        /// Only poems from this dynasty
        #[arg(short, long)]
        dynasty: Option<String>,
        /// Only poems in this category
        #[arg(short, long)]
        category: Option<String>,
        /// Only poems by this author
        #[arg(short, long)]
        author: Option<String>,
        /// Only poems with any of these tags (comma-separated)
        #[arg(short = 'T', long)]
        tags: Option<String>,
        /// Minimum score (0-1)
        #[arg(short, long)]
        min_score: Option<f32>,
        /// Disable approximate matching
        #[arg(long)]
        no_fuzzy: bool,
    },
    /// Suggest titles and authors
    Suggest {
        /// Partial query
        query: String,
    },
    /// Show recent queries
    History {
        /// Forget all recent queries
        #[arg(long)]
        clear: bool,
    },
    /// Show the most frequent tags, authors or categories
    Popular {
        #[arg(value_enum)]
        kind: PopularKind,
        /// Maximum entries
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show corpus and cache statistics
    Stats,
    /// Drop all cached results
    ClearCache,
    /// Interactive mode
    Interactive,
}

#[derive(Clone, Copy, ValueEnum)]
enum PopularKind {
    Tags,
    Authors,
    Categories,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // Expand ~ in paths
    let corpus_path = shellexpand::tilde(&cli.corpus).to_string();
    let state_dir = shellexpand::tilde(&cli.state_dir).to_string();

    let config = match &cli.config {
        Some(path) => load_config(&shellexpand::tilde(path))?,
        None => SearchConfig::default(),
    };

    let corpus = Arc::new(Corpus::load(&corpus_path)?);
    let store = Arc::new(FileStore::open(&state_dir)?);
    let service = PoetrySearchService::new(corpus, store, config);

    match cli.command {
        Commands::Search {
            query,
            limit,
            dynasty,
            category,
            author,
            tags,
            min_score,
            no_fuzzy,
        } => {
            let options = SearchOptions {
                fuzzy: Some(!no_fuzzy),
                limit,
                min_score,
                dynasty,
                category,
                author,
                tags: tags.map(|t| parse_tags(&t)),
                ..Default::default()
            };

            let results = service.search(&query, &options);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print_results(&results);
            }
        }

        Commands::Suggest { query } => {
            let suggestions = service.suggestions(&query);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&suggestions)?);
            } else {
                for suggestion in suggestions {
                    println!("{}", suggestion);
                }
            }
        }

        Commands::History { clear } => {
            if clear {
                service.clear_history();
                println!("History cleared");
            } else if cli.json {
                println!("{}", serde_json::to_string_pretty(&service.history())?);
            } else {
                for (i, query) in service.history().iter().enumerate() {
                    println!("{:>2}. {}", i + 1, query);
                }
            }
        }

        Commands::Popular { kind, limit } => {
            let rows: Vec<(String, usize)> = match kind {
                PopularKind::Tags => service
                    .popular_tags(limit)
                    .into_iter()
                    .map(|t| (t.tag, t.count))
                    .collect(),
                PopularKind::Authors => service
                    .popular_authors(limit)
                    .into_iter()
                    .map(|a| (a.author, a.count))
                    .collect(),
                PopularKind::Categories => service
                    .popular_categories(limit)
                    .into_iter()
                    .map(|c| (c.category, c.count))
                    .collect(),
            };

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for (name, count) in rows {
                    println!("{:>5}  {}", count, name);
                }
            }
        }

        Commands::Stats => {
            let stats = service.search_stats();
            let cache = service.cache_stats();
            if cli.json {
                let combined = serde_json::json!({ "search": stats, "cache": cache });
                println!("{}", serde_json::to_string_pretty(&combined)?);
            } else {
                println!("Poems: {}", stats.total_poetry);
                println!("Authors: {}", stats.total_authors);
                println!("Tags: {}", stats.total_tags);
                println!(
                    "Cache: {} entries, {} hits, {} misses ({:.0}% hit rate)",
                    cache.entries,
                    cache.hits,
                    cache.misses,
                    cache.hit_rate * 100.0
                );
            }
        }

        Commands::ClearCache => {
            service.clear_cache();
            println!("Cache cleared");
        }

        Commands::Interactive => {
            println!("poetry-search interactive mode");
            println!("Type 'help' for commands, 'quit' to exit\n");

            let stdin = io::stdin();
            let mut stdout = io::stdout();

            loop {
                print!("poetry> ");
                stdout.flush()?;

                let mut line = String::new();
                if stdin.read_line(&mut line)? == 0 {
                    break;
                }
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                match line {
                    "quit" | "exit" => break,
                    "help" => {
                        println!("Commands:");
                        println!("  <query>           - Search poems");
                        println!("  suggest <query>   - Suggest titles and authors");
                        println!("  history           - Show recent queries");
                        println!("  stats             - Show statistics");
                        println!("  quit              - Exit");
                    }
                    "history" => {
                        for query in service.history() {
                            println!("  {}", query);
                        }
                    }
                    "stats" => {
                        let stats = service.search_stats();
                        println!("Poems: {}", stats.total_poetry);
                        println!("Cached searches: {}", stats.cache_size);
                    }
                    _ if line.starts_with("suggest ") => {
                        for suggestion in service.suggestions(&line[8..]) {
                            println!("  {}", suggestion);
                        }
                    }
                    _ => {
                        let results = service.search(line, &SearchOptions::default());
                        print_results(&results);
                    }
                }
            }

            println!("Goodbye!");
        }
    }

    Ok(())
}

fn load_config(path: &str) -> Result<SearchConfig> {
    let path = Path::new(path);
    let json = std::fs::read_to_string(path)?;
    serde_json::from_str(&json)
        .map_err(|e| PoetryError::Config(format!("{}: {}", path.display(), e)))
}

fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn print_results(results: &[SearchResult]) {
    if results.is_empty() {
        println!("No poems found");
        return;
    }

    for result in results {
        println!(
            "{} ({:.3}, {}) {} [{}] {}",
            result.poem.id,
            result.score,
            result.match_type,
            result.poem.title,
            result.poem.dynasty,
            result.poem.author
        );
        if let Some(highlight) = &result.highlight {
            println!("  {}", truncate(highlight, 40));
        }
        let fields: Vec<String> = result.matched_fields.iter().map(|f| f.label()).collect();
        println!("  Matched: {}", fields.join(", "));
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", head)
    }
}
