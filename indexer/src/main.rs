use anyhow::Result;
use clap::{Parser, Subcommand};
use lettersearch_core::{JsonLetterStore, LetterSearch, SearchConfig};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query the letter archive text index", long_about = None)]
struct Cli {
    /// JSON config with letters_directory, index_directory, text_document_name, default_language
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override the letters directory from the config
    #[arg(long, global = true)]
    letters: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index every numbered letter folder under the (language) root
    Build {
        #[arg(long)]
        language: Option<String>,
    },
    /// Search an existing index and print the resolved letters as JSON
    Search {
        query: String,
        #[arg(long)]
        language: Option<String>,
        /// Match terms within the configured edit distance
        #[arg(long, default_value_t = false)]
        fuzzy: bool,
        /// JSON array of letters ({"number": .., "date": "YYYY-MM-DD", ..})
        #[arg(long)]
        metadata: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.letters)?;

    match cli.command {
        Commands::Build { language } => {
            let search = LetterSearch::new(config, JsonLetterStore::default());
            let outcome = search.index_files(language.as_deref())?;
            for skipped in &outcome.skipped {
                eprintln!("skipped {}: {}", skipped.path.display(), skipped.cause);
            }
            println!("{}", outcome.indexed);
            Ok(())
        }
        Commands::Search { query, language, fuzzy, metadata } => {
            let letters = match metadata {
                Some(path) => JsonLetterStore::from_file(&path)?,
                None => JsonLetterStore::default(),
            };
            let search = LetterSearch::new(config, letters);
            let rows = if fuzzy {
                search.fuzzy_search(&query, language.as_deref())?
            } else {
                search.search(&query, language.as_deref())?
            };
            println!("{}", serde_json::to_string_pretty(&rows)?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&std::path::Path>, letters: Option<PathBuf>) -> Result<SearchConfig> {
    let mut config = match (path, &letters) {
        (Some(p), _) => SearchConfig::from_file(p)?,
        (None, Some(dir)) => SearchConfig::new(dir.clone()),
        (None, None) => anyhow::bail!("either --config or --letters is required"),
    };
    if let Some(dir) = letters {
        config.letters_directory = dir;
    }
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}
