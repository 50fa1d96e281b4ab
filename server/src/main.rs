use anyhow::Result;
use clap::Parser;
use lettersearch_core::{JsonLetterStore, SearchConfig};
use server::{build_app, AppOptions};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// JSON search config (letters_directory, index_directory, ...)
    #[arg(long, default_value = "./search.json")]
    config: PathBuf,
    /// JSON array of letter records used to resolve hits
    #[arg(long, default_value = "./letters.json")]
    letters: PathBuf,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = SearchConfig::from_file(&args.config)?;
    let letters = JsonLetterStore::from_file(&args.letters)?;
    let app = build_app(config, letters, AppOptions::from_env());

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
